use crate::collection::Projection;
use crate::common::{SortOrder, SortableFields};

/// Options that shape the result of a `find` besides the filter.
///
/// ```rust,ignore
/// let options = order_by("price", SortOrder::Descending).skip(5).limit(5);
/// let page = books.find_with_options(all(), &options)?.to_vec()?;
/// ```
#[derive(Clone, Debug, Default)]
pub struct FindOptions {
    pub(crate) sort_by: Option<SortableFields>,
    pub(crate) skip: Option<u64>,
    pub(crate) limit: Option<u64>,
    pub(crate) projection: Option<Projection>,
}

/// Options sorting on a single field.
pub fn order_by(field_name: &str, sort_order: SortOrder) -> FindOptions {
    FindOptions::new().sort_by(field_name, sort_order)
}

/// Options skipping the first `skip` results.
pub fn skip_by(skip: u64) -> FindOptions {
    FindOptions::new().skip(skip)
}

/// Options keeping at most `limit` results.
pub fn limit_to(limit: u64) -> FindOptions {
    FindOptions::new().limit(limit)
}

/// Options applying a projection.
pub fn project(projection: Projection) -> FindOptions {
    FindOptions::new().projection(projection)
}

impl FindOptions {
    pub fn new() -> FindOptions {
        FindOptions::default()
    }

    pub fn skip(mut self, skip: u64) -> FindOptions {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: u64) -> FindOptions {
        self.limit = Some(limit);
        self
    }

    /// Appends a sort key; earlier keys take precedence.
    pub fn sort_by(mut self, field_name: &str, sort_order: SortOrder) -> FindOptions {
        let fields = self.sort_by.take().unwrap_or_default();
        self.sort_by = Some(fields.add_sorted_field(field_name, sort_order));
        self
    }

    /// Replaces the sort keys.
    pub fn sort_fields(mut self, fields: SortableFields) -> FindOptions {
        self.sort_by = if fields.is_empty() { None } else { Some(fields) };
        self
    }

    pub fn projection(mut self, projection: Projection) -> FindOptions {
        self.projection = Some(projection);
        self
    }

    pub fn sort_order(&self) -> Option<&SortableFields> {
        self.sort_by.as_ref()
    }

    pub fn skip_count(&self) -> Option<u64> {
        self.skip
    }

    pub fn limit_count(&self) -> Option<u64> {
        self.limit
    }

    pub fn projection_spec(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }
}
