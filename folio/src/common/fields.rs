use crate::collection::Document;
use crate::common::{SortOrder, Value, FIELD_SEPARATOR, INDEX_NAME_SEPARATOR};
use crate::errors::{ErrorKind, FolioError, FolioResult};
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// An ordered sequence of `(field, direction)` pairs.
///
/// Used both as a sort key sequence for queries and `$sort` stages and as
/// the field sequence of an index definition.
///
/// ```ignore
/// let fields = SortableFields::new()
///     .add_sorted_field("author", SortOrder::Ascending)
///     .add_sorted_field("published_year", SortOrder::Descending);
/// assert_eq!(fields.encoded_name(), "author_1_published_year_-1");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SortableFields {
    sorting_order: Vec<(String, SortOrder)>,
}

impl SortableFields {
    pub fn new() -> SortableFields {
        SortableFields {
            sorting_order: Vec::new(),
        }
    }

    /// All fields ascending.
    pub fn with_names(field_names: Vec<&str>) -> SortableFields {
        field_names
            .into_iter()
            .fold(SortableFields::new(), |fields, name| fields.add_field(name))
    }

    /// Parses a specification document such as `{author: 1, published_year: -1}`.
    /// Field order is the document's field order.
    pub fn from_document(spec: &Document) -> FolioResult<SortableFields> {
        let mut fields = SortableFields::new();
        for (name, value) in spec.iter() {
            let order = match value.as_flag() {
                Some(1) => SortOrder::Ascending,
                Some(-1) => SortOrder::Descending,
                _ => {
                    log::error!("Invalid sort direction {} for field {}", value, name);
                    return Err(FolioError::new(
                        &format!("Sort direction for field '{}' must be 1 or -1", name),
                        ErrorKind::ValidationError,
                    ));
                }
            };
            fields = fields.add_sorted_field(name, order);
        }
        fields.validate()?;
        Ok(fields)
    }

    #[inline]
    pub fn add_field(self, field_name: &str) -> SortableFields {
        self.add_sorted_field(field_name, SortOrder::Ascending)
    }

    #[inline]
    pub fn add_sorted_field(mut self, field_name: &str, sort_order: SortOrder) -> SortableFields {
        self.sorting_order.push((field_name.to_string(), sort_order));
        self
    }

    pub fn sorting_order(&self) -> &[(String, SortOrder)] {
        &self.sorting_order
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.sorting_order.iter().map(|(name, _)| name.as_str()).collect()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sorting_order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sorting_order.is_empty()
    }

    pub fn contains(&self, field_name: &str) -> bool {
        self.sorting_order.iter().any(|(name, _)| name == field_name)
    }

    /// Same fields with every direction flipped.
    pub fn reversed(&self) -> SortableFields {
        SortableFields {
            sorting_order: self
                .sorting_order
                .iter()
                .map(|(name, order)| (name.clone(), order.reverse()))
                .collect(),
        }
    }

    /// Deterministic name such as `author_1_published_year_1`.
    pub fn encoded_name(&self) -> String {
        self.sorting_order
            .iter()
            .map(|(name, order)| format!("{}{}{}", name, INDEX_NAME_SEPARATOR, order))
            .join(INDEX_NAME_SEPARATOR)
    }

    /// Renders the fields back into a specification document.
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        for (name, order) in &self.sorting_order {
            // names were validated non-empty; a plain insert keeps dotted names flat
            document.insert_raw(name, Value::I64(order.as_i64()));
        }
        document
    }

    /// Rejects an empty sequence, empty names and repeated fields.
    pub fn validate(&self) -> FolioResult<()> {
        if self.sorting_order.is_empty() {
            log::error!("Field names cannot be empty");
            return Err(FolioError::new(
                "Field names cannot be empty",
                ErrorKind::ValidationError,
            ));
        }

        if let Some((name, _)) = self.sorting_order.iter().find(|(name, _)| name.is_empty()) {
            log::error!("Empty field name in {:?}", self.field_names());
            return Err(FolioError::new(
                &format!("Field name '{}' cannot be empty", name),
                ErrorKind::InvalidFieldName,
            ));
        }

        if !self.sorting_order.iter().map(|(name, _)| name).all_unique() {
            log::error!("Repeated field in {:?}", self.field_names());
            return Err(FolioError::new(
                "A field cannot appear more than once",
                ErrorKind::ValidationError,
            ));
        }
        Ok(())
    }
}

impl Display for SortableFields {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_document())
    }
}

impl From<Vec<&str>> for SortableFields {
    fn from(field_names: Vec<&str>) -> Self {
        SortableFields::with_names(field_names)
    }
}

impl From<&str> for SortableFields {
    fn from(field_name: &str) -> Self {
        SortableFields::new().add_field(field_name)
    }
}

impl From<(&str, SortOrder)> for SortableFields {
    fn from((field_name, order): (&str, SortOrder)) -> Self {
        SortableFields::new().add_sorted_field(field_name, order)
    }
}

impl From<Vec<(&str, SortOrder)>> for SortableFields {
    fn from(pairs: Vec<(&str, SortOrder)>) -> Self {
        pairs
            .into_iter()
            .fold(SortableFields::new(), |fields, (name, order)| {
                fields.add_sorted_field(name, order)
            })
    }
}

/// `true` when the dotted paths are equal or one lies inside the other.
pub(crate) fn paths_overlap(a: &str, b: &str) -> bool {
    let within = |path: &str, ancestor: &str| {
        path.starts_with(ancestor) && path[ancestor.len()..].starts_with(FIELD_SEPARATOR)
    };
    a == b || within(a, b) || within(b, a)
}
