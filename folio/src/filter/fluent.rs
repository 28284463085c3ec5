use super::{ComparisonOp, FieldFilter, Filter, InFilter};
use crate::common::Value;

/// Creates a fluent filter builder for the specified field name.
///
/// ```rust,ignore
/// let filter = field("published_year").gt(1940);
/// ```
pub fn field(field_name: &str) -> FluentFilter {
    FluentFilter {
        field_name: field_name.to_string(),
    }
}

/// Builds predicates on one field.
pub struct FluentFilter {
    field_name: String,
}

impl FluentFilter {
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(ComparisonOp::Eq, value.into())
    }

    #[inline]
    pub fn ne<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(ComparisonOp::Ne, value.into())
    }

    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(ComparisonOp::Gt, value.into())
    }

    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(ComparisonOp::Gte, value.into())
    }

    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(ComparisonOp::Lt, value.into())
    }

    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> Filter {
        self.compare(ComparisonOp::Lte, value.into())
    }

    /// Matches when the field equals one of `values`.
    pub fn in_array<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        Filter::In(InFilter::new(
            self.field_name,
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// Matches when the field equals none of `values`.
    pub fn not_in_array<T: Into<Value>>(self, values: Vec<T>) -> Filter {
        self.in_array(values).not()
    }

    /// Matches when `lower <= field <= upper`.
    pub fn between<T: Into<Value>>(self, lower: T, upper: T) -> Filter {
        let name = self.field_name;
        Filter::And(vec![
            Filter::Compare(FieldFilter::new(name.clone(), ComparisonOp::Gte, lower.into())),
            Filter::Compare(FieldFilter::new(name, ComparisonOp::Lte, upper.into())),
        ])
    }

    fn compare(self, op: ComparisonOp, value: Value) -> Filter {
        Filter::Compare(FieldFilter::new(self.field_name, op, value))
    }
}
