use crate::collection::Document;
use crate::common::Value;
use crate::errors::FolioResult;
use itertools::Itertools;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Comparison operators usable on a single field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl ComparisonOp {
    /// Operator name in filter documents.
    pub fn operator(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "$eq",
            ComparisonOp::Ne => "$ne",
            ComparisonOp::Gt => "$gt",
            ComparisonOp::Gte => "$gte",
            ComparisonOp::Lt => "$lt",
            ComparisonOp::Lte => "$lte",
        }
    }

    pub fn from_operator(operator: &str) -> Option<ComparisonOp> {
        match operator {
            "$eq" => Some(ComparisonOp::Eq),
            "$ne" => Some(ComparisonOp::Ne),
            "$gt" => Some(ComparisonOp::Gt),
            "$gte" => Some(ComparisonOp::Gte),
            "$lt" => Some(ComparisonOp::Lt),
            "$lte" => Some(ComparisonOp::Lte),
            _ => None,
        }
    }

    /// `true` for `$gt`, `$gte`, `$lt` and `$lte`.
    #[inline]
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            ComparisonOp::Gt | ComparisonOp::Gte | ComparisonOp::Lt | ComparisonOp::Lte
        )
    }

    /// Tests `actual <op> expected`.
    ///
    /// Range operators only match values in the same type bracket as the
    /// operand, so `{year: {$gt: 1940}}` never matches a string year.
    pub fn matches(&self, actual: &Value, expected: &Value) -> bool {
        match self {
            ComparisonOp::Eq => actual == expected,
            ComparisonOp::Ne => actual != expected,
            _ if !actual.is_comparable_with(expected) => false,
            ComparisonOp::Gt => actual.cmp(expected) == Ordering::Greater,
            ComparisonOp::Gte => actual.cmp(expected) != Ordering::Less,
            ComparisonOp::Lt => actual.cmp(expected) == Ordering::Less,
            ComparisonOp::Lte => actual.cmp(expected) != Ordering::Greater,
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::Ne => "!=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Gte => ">=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Lte => "<=",
        }
    }
}

/// A comparison between one field and a constant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldFilter {
    field_name: String,
    op: ComparisonOp,
    value: Value,
}

impl FieldFilter {
    pub fn new(field_name: String, op: ComparisonOp, value: Value) -> Self {
        FieldFilter {
            field_name,
            op,
            value,
        }
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn op(&self) -> ComparisonOp {
        self.op
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn apply(&self, entry: &Document) -> FolioResult<bool> {
        let actual = entry.get(&self.field_name)?;
        Ok(self.op.matches(&actual, &self.value))
    }
}

impl Display for FieldFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} {} {})", self.field_name, self.op.symbol(), self.value)
    }
}

/// Matches when the field equals any of the listed values.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InFilter {
    field_name: String,
    values: Vec<Value>,
}

impl InFilter {
    pub fn new(field_name: String, values: Vec<Value>) -> Self {
        InFilter { field_name, values }
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn apply(&self, entry: &Document) -> FolioResult<bool> {
        let actual = entry.get(&self.field_name)?;
        Ok(self.values.iter().any(|v| *v == actual))
    }
}

impl Display for InFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({} in [{}])",
            self.field_name,
            self.values.iter().map(|v| v.to_string()).join(", ")
        )
    }
}
