use super::{and, ComparisonOp, FieldFilter, Filter, InFilter};
use crate::collection::Document;
use crate::common::{Value, OPERATOR_PREFIX};
use crate::errors::{ErrorKind, FolioError, FolioResult};

impl Filter {
    /// Parses a filter document.
    ///
    /// Supported forms:
    ///
    /// - `{field: value}` equality (embedded documents compare whole)
    /// - `{field: {$eq|$ne|$gt|$gte|$lt|$lte: value, ...}}`
    /// - `{field: {$in: [values]}}`, `{field: {$not: {operators}}}`
    /// - `{$and: [filters]}`, `{$or: [filters]}`
    ///
    /// Sibling clauses are combined with AND; `{}` matches everything.
    /// Any other operator is rejected with a validation error.
    pub fn from_document(document: &Document) -> FolioResult<Filter> {
        let mut clauses = Vec::with_capacity(document.size());
        for (key, value) in document.iter() {
            if key.starts_with(OPERATOR_PREFIX) {
                clauses.push(parse_logical(key, value)?);
            } else {
                clauses.push(parse_field(key, value)?);
            }
        }
        let filter = and(clauses);
        filter.validate()?;
        Ok(filter)
    }
}

fn parse_logical(operator: &str, value: &Value) -> FolioResult<Filter> {
    let operands = match value {
        Value::Array(items) if !items.is_empty() => items,
        _ => {
            log::error!("{} expects a non-empty array, got {}", operator, value);
            return Err(FolioError::new(
                &format!("{} expects a non-empty array of filters", operator),
                ErrorKind::ValidationError,
            ));
        }
    };

    let mut filters = Vec::with_capacity(operands.len());
    for operand in operands {
        match operand {
            Value::Document(doc) => filters.push(Filter::from_document(doc)?),
            other => {
                log::error!("{} operand {} is not a document", operator, other);
                return Err(FolioError::new(
                    &format!("{} operands must be filter documents", operator),
                    ErrorKind::ValidationError,
                ));
            }
        }
    }

    match operator {
        "$and" => Ok(and(filters)),
        "$or" => Ok(Filter::Or(filters)),
        _ => Err(unknown_operator(operator)),
    }
}

fn parse_field(field_name: &str, value: &Value) -> FolioResult<Filter> {
    match value {
        Value::Document(spec) if is_operator_document(spec) => parse_operators(field_name, spec),
        other => Ok(Filter::Compare(FieldFilter::new(
            field_name.to_string(),
            ComparisonOp::Eq,
            other.clone(),
        ))),
    }
}

fn is_operator_document(spec: &Document) -> bool {
    spec.keys().next().is_some_and(|k| k.starts_with(OPERATOR_PREFIX))
}

fn parse_operators(field_name: &str, spec: &Document) -> FolioResult<Filter> {
    let mut filters = Vec::with_capacity(spec.size());
    for (operator, operand) in spec.iter() {
        if !operator.starts_with(OPERATOR_PREFIX) {
            log::error!("Field {} mixes operators and plain fields", field_name);
            return Err(FolioError::new(
                &format!("Filter on '{}' mixes operators with the plain field '{}'", field_name, operator),
                ErrorKind::ValidationError,
            ));
        }

        let filter = match operator.as_str() {
            "$in" => match operand {
                Value::Array(values) => {
                    Filter::In(InFilter::new(field_name.to_string(), values.clone()))
                }
                other => {
                    log::error!("$in on {} expects an array, got {}", field_name, other);
                    return Err(FolioError::new(
                        "$in expects an array of values",
                        ErrorKind::ValidationError,
                    ));
                }
            },
            "$not" => match operand {
                Value::Document(inner) if is_operator_document(inner) => {
                    parse_operators(field_name, inner)?.not()
                }
                other => {
                    log::error!("$not on {} expects an operator document, got {}", field_name, other);
                    return Err(FolioError::new(
                        "$not expects an operator document",
                        ErrorKind::ValidationError,
                    ));
                }
            },
            op => match ComparisonOp::from_operator(op) {
                Some(op) => Filter::Compare(FieldFilter::new(
                    field_name.to_string(),
                    op,
                    operand.clone(),
                )),
                None => return Err(unknown_operator(op)),
            },
        };
        filters.push(filter);
    }
    Ok(and(filters))
}

fn unknown_operator(operator: &str) -> FolioError {
    log::error!("Unsupported filter operator {}", operator);
    FolioError::new(
        &format!("Unsupported filter operator '{}'", operator),
        ErrorKind::ValidationError,
    )
}
