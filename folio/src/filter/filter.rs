use super::{ComparisonOp, FieldFilter, InFilter};
use crate::collection::{Document, DocumentId};
use crate::common::{Value, DOC_ID};
use crate::errors::{ErrorKind, FolioError, FolioResult};
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// A parsed query predicate.
///
/// Filters are built with the fluent API ([field], [and], [or], [all]) or
/// parsed from a filter document with [Filter::from_document]. Either way
/// the result is a typed tree that is evaluated without reinterpreting any
/// operator names.
///
/// ```rust,ignore
/// use folio::filter::{and, field};
///
/// let filter = and(vec![
///     field("author").eq("George Orwell"),
///     field("published_year").gt(1940),
/// ]);
/// let cursor = books.find(filter)?;
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Filter {
    /// Matches every document
    All,
    Compare(FieldFilter),
    In(InFilter),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    /// Evaluates the filter against a document.
    pub fn apply(&self, entry: &Document) -> FolioResult<bool> {
        match self {
            Filter::All => Ok(true),
            Filter::Compare(filter) => filter.apply(entry),
            Filter::In(filter) => filter.apply(entry),
            Filter::And(filters) => {
                for filter in filters {
                    if !filter.apply(entry)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Filter::Or(filters) => {
                for filter in filters {
                    if filter.apply(entry)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Filter::Not(filter) => Ok(!filter.apply(entry)?),
        }
    }

    /// Combines this filter with another using logical AND.
    pub fn and(self, filter: Filter) -> Filter {
        and(vec![self, filter])
    }

    /// Combines this filter with another using logical OR.
    pub fn or(self, filter: Filter) -> Filter {
        or(vec![self, filter])
    }

    /// Negates this filter.
    pub fn not(self) -> Filter {
        not(self)
    }

    #[inline]
    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }

    /// Top-level conjuncts: the members of a (nested) `And`, or the filter
    /// itself. `All` contributes nothing.
    pub fn conjuncts(&self) -> Vec<&Filter> {
        match self {
            Filter::All => Vec::new(),
            Filter::And(filters) => filters.iter().flat_map(|f| f.conjuncts()).collect(),
            other => vec![other],
        }
    }

    /// Rebuilds a filter from conjuncts, the inverse of [Filter::conjuncts].
    pub(crate) fn from_conjuncts(mut filters: Vec<Filter>) -> Filter {
        match filters.len() {
            0 => Filter::All,
            1 => filters.remove(0),
            _ => Filter::And(filters),
        }
    }

    /// Every field name the filter reads.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_field_names(&mut names);
        names.into_iter().unique().collect()
    }

    fn collect_field_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Filter::All => {}
            Filter::Compare(filter) => names.push(filter.field_name()),
            Filter::In(filter) => names.push(filter.field_name()),
            Filter::And(filters) | Filter::Or(filters) => {
                filters.iter().for_each(|f| f.collect_field_names(names))
            }
            Filter::Not(filter) => filter.collect_field_names(names),
        }
    }

    /// Checks the structural rules that the builders cannot enforce: field
    /// names are non-empty and logical groups are non-empty.
    pub fn validate(&self) -> FolioResult<()> {
        match self {
            Filter::All => Ok(()),
            Filter::Compare(filter) => validate_field_name(filter.field_name()),
            Filter::In(filter) => validate_field_name(filter.field_name()),
            Filter::And(filters) | Filter::Or(filters) => {
                if filters.is_empty() {
                    log::error!("Logical filter {} has no operands", self);
                    return Err(FolioError::new(
                        "A logical filter needs at least one operand",
                        ErrorKind::ValidationError,
                    ));
                }
                filters.iter().try_for_each(|f| f.validate())
            }
            Filter::Not(filter) => filter.validate(),
        }
    }
}

fn validate_field_name(field_name: &str) -> FolioResult<()> {
    if field_name.is_empty() {
        log::error!("Filter field name cannot be empty");
        return Err(FolioError::new(
            "Filter field name cannot be empty",
            ErrorKind::ValidationError,
        ));
    }
    Ok(())
}

impl Default for Filter {
    fn default() -> Self {
        Filter::All
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Filter::All => write!(f, "All"),
            Filter::Compare(filter) => write!(f, "{}", filter),
            Filter::In(filter) => write!(f, "{}", filter),
            Filter::And(filters) => write!(f, "({})", filters.iter().join(" && ")),
            Filter::Or(filters) => write!(f, "({})", filters.iter().join(" || ")),
            Filter::Not(filter) => write!(f, "!{}", filter),
        }
    }
}

/// Matches every document.
pub fn all() -> Filter {
    Filter::All
}

/// Matches the document with the given id.
pub fn by_id(id: DocumentId) -> Filter {
    Filter::Compare(FieldFilter::new(DOC_ID.to_string(), ComparisonOp::Eq, Value::Id(id)))
}

/// Logical AND of the given filters. Nested ANDs are flattened.
pub fn and(filters: Vec<Filter>) -> Filter {
    let mut flattened = Vec::with_capacity(filters.len());
    for filter in filters {
        match filter {
            Filter::And(inner) => flattened.extend(inner),
            Filter::All => {}
            other => flattened.push(other),
        }
    }
    Filter::from_conjuncts(flattened)
}

/// Logical OR of the given filters.
pub fn or(filters: Vec<Filter>) -> Filter {
    Filter::Or(filters)
}

/// Negation of the given filter.
pub fn not(filter: Filter) -> Filter {
    Filter::Not(Box::new(filter))
}
