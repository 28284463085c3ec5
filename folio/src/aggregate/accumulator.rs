use crate::aggregate::Expression;
use crate::collection::Document;
use crate::common::Value;
use crate::errors::{ErrorKind, FolioError, FolioResult};
use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccumulatorOp {
    Sum,
    Avg,
    Push,
    Min,
    Max,
    First,
    Last,
}

impl AccumulatorOp {
    pub fn operator(&self) -> &'static str {
        match self {
            AccumulatorOp::Sum => "$sum",
            AccumulatorOp::Avg => "$avg",
            AccumulatorOp::Push => "$push",
            AccumulatorOp::Min => "$min",
            AccumulatorOp::Max => "$max",
            AccumulatorOp::First => "$first",
            AccumulatorOp::Last => "$last",
        }
    }

    pub fn from_operator(operator: &str) -> Option<AccumulatorOp> {
        match operator {
            "$sum" => Some(AccumulatorOp::Sum),
            "$avg" => Some(AccumulatorOp::Avg),
            "$push" => Some(AccumulatorOp::Push),
            "$min" => Some(AccumulatorOp::Min),
            "$max" => Some(AccumulatorOp::Max),
            "$first" => Some(AccumulatorOp::First),
            "$last" => Some(AccumulatorOp::Last),
            _ => None,
        }
    }
}

/// A `$group` output field: an operator over an expression evaluated per
/// input document.
#[derive(Clone, Debug, PartialEq)]
pub struct Accumulator {
    op: AccumulatorOp,
    expression: Expression,
}

pub fn sum(expression: Expression) -> Accumulator {
    Accumulator::new(AccumulatorOp::Sum, expression)
}

pub fn avg(expression: Expression) -> Accumulator {
    Accumulator::new(AccumulatorOp::Avg, expression)
}

pub fn push(expression: Expression) -> Accumulator {
    Accumulator::new(AccumulatorOp::Push, expression)
}

pub fn min(expression: Expression) -> Accumulator {
    Accumulator::new(AccumulatorOp::Min, expression)
}

pub fn max(expression: Expression) -> Accumulator {
    Accumulator::new(AccumulatorOp::Max, expression)
}

pub fn first(expression: Expression) -> Accumulator {
    Accumulator::new(AccumulatorOp::First, expression)
}

pub fn last(expression: Expression) -> Accumulator {
    Accumulator::new(AccumulatorOp::Last, expression)
}

impl Accumulator {
    pub fn new(op: AccumulatorOp, expression: Expression) -> Self {
        Accumulator { op, expression }
    }

    /// Parses `{$op: expression}`.
    pub fn from_value(value: &Value) -> FolioResult<Accumulator> {
        let spec = match value.as_document() {
            Some(spec) if spec.size() == 1 => spec,
            _ => {
                log::error!("Invalid accumulator {}", value);
                return Err(FolioError::new(
                    &format!("Accumulator must be a single-operator document, found {}", value),
                    ErrorKind::ValidationError,
                ));
            }
        };

        let (operator, operand) = match spec.iter().next() {
            Some(entry) => entry,
            None => {
                return Err(FolioError::new(
                    "Accumulator document is empty",
                    ErrorKind::ValidationError,
                ))
            }
        };
        match AccumulatorOp::from_operator(operator) {
            Some(op) => Ok(Accumulator::new(op, Expression::parse(operand)?)),
            None => {
                log::error!("Unsupported accumulator {}", operator);
                Err(FolioError::new(
                    &format!("Unsupported accumulator '{}'", operator),
                    ErrorKind::ValidationError,
                ))
            }
        }
    }

    pub fn op(&self) -> AccumulatorOp {
        self.op
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    pub(crate) fn start(&self) -> AccumulatorState {
        match self.op {
            AccumulatorOp::Sum => AccumulatorState::Sum {
                int_total: 0,
                float_total: 0.0,
                is_float: false,
            },
            AccumulatorOp::Avg => AccumulatorState::Avg { total: 0.0, count: 0 },
            AccumulatorOp::Push => AccumulatorState::Push(Vec::new()),
            AccumulatorOp::Min => AccumulatorState::Min(None),
            AccumulatorOp::Max => AccumulatorState::Max(None),
            AccumulatorOp::First => AccumulatorState::First(None),
            AccumulatorOp::Last => AccumulatorState::Last(Value::Null),
        }
    }

    /// Folds one input document into `state`.
    pub(crate) fn accumulate(&self, state: &mut AccumulatorState, document: &Document) -> FolioResult<()> {
        let value = self.expression.resolve(document)?;
        match state {
            AccumulatorState::Sum {
                int_total,
                float_total,
                is_float,
            } => match value {
                Some(Value::I64(n)) if !*is_float => match int_total.checked_add(n) {
                    Some(total) => *int_total = total,
                    None => {
                        *is_float = true;
                        *float_total = *int_total as f64 + n as f64;
                    }
                },
                Some(v) if v.is_number() => {
                    let n = v.as_f64().unwrap_or_default();
                    if !*is_float {
                        *is_float = true;
                        *float_total = *int_total as f64;
                    }
                    *float_total += n;
                }
                _ => {}
            },
            AccumulatorState::Avg { total, count } => {
                if let Some(n) = value.as_ref().and_then(|v| v.as_f64()) {
                    *total += n;
                    *count += 1;
                }
            }
            AccumulatorState::Push(values) => {
                if let Some(v) = value {
                    values.push(v);
                }
            }
            AccumulatorState::Min(current) => {
                if let Some(v) = value.filter(|v| !v.is_null()) {
                    if current.as_ref().map_or(true, |c| v < *c) {
                        *current = Some(v);
                    }
                }
            }
            AccumulatorState::Max(current) => {
                if let Some(v) = value.filter(|v| !v.is_null()) {
                    if current.as_ref().map_or(true, |c| v > *c) {
                        *current = Some(v);
                    }
                }
            }
            AccumulatorState::First(current) => {
                if current.is_none() {
                    *current = Some(value.unwrap_or(Value::Null));
                }
            }
            AccumulatorState::Last(current) => *current = value.unwrap_or(Value::Null),
        }
        Ok(())
    }
}

impl Display for Accumulator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}: {}}}", self.op.operator(), self.expression)
    }
}

/// Running value of one accumulator within one group.
#[derive(Clone, Debug)]
pub(crate) enum AccumulatorState {
    Sum {
        int_total: i64,
        float_total: f64,
        is_float: bool,
    },
    Avg {
        total: f64,
        count: u64,
    },
    Push(Vec<Value>),
    Min(Option<Value>),
    Max(Option<Value>),
    First(Option<Value>),
    Last(Value),
}

impl AccumulatorState {
    pub(crate) fn finish(self, output_field: &str) -> Value {
        match self {
            AccumulatorState::Sum {
                int_total,
                float_total,
                is_float,
            } => {
                if is_float {
                    Value::F64(float_total)
                } else {
                    Value::I64(int_total)
                }
            }
            AccumulatorState::Avg { total, count } => {
                if count == 0 {
                    log::warn!("$avg for {} saw no numeric values", output_field);
                    Value::Null
                } else {
                    Value::F64(total / count as f64)
                }
            }
            AccumulatorState::Push(values) => Value::Array(values),
            AccumulatorState::Min(value) | AccumulatorState::Max(value) => {
                value.unwrap_or(Value::Null)
            }
            AccumulatorState::First(value) => value.unwrap_or(Value::Null),
            AccumulatorState::Last(value) => value,
        }
    }
}
