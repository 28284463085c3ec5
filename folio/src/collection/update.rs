use crate::collection::Document;
use crate::common::{paths_overlap, Value, DOC_ID, FIELD_SEPARATOR};
use crate::errors::{ErrorKind, FolioError, FolioResult};
use std::fmt::{Display, Formatter};

const SET: &str = "$set";
const UNSET: &str = "$unset";
const INC: &str = "$inc";

#[derive(Clone, Debug, PartialEq)]
pub enum UpdateOperation {
    Set(String, Value),
    Unset(String),
    Inc(String, Value),
}

impl UpdateOperation {
    pub fn field_name(&self) -> &str {
        match self {
            UpdateOperation::Set(field, _)
            | UpdateOperation::Unset(field)
            | UpdateOperation::Inc(field, _) => field,
        }
    }
}

/// A typed set of field modifications applied by `update_one`/`update_many`.
///
/// ```rust,ignore
/// let update = Update::new().set("price", 12.5).inc("stock", -1);
/// let same = Update::from_document(&doc! { "$set": { price: 12.5 }, "$inc": { stock: -1 } })?;
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Update {
    operations: Vec<UpdateOperation>,
}

impl Update {
    pub fn new() -> Update {
        Update::default()
    }

    pub fn set<T: Into<Value>>(mut self, field_name: &str, value: T) -> Update {
        self.operations
            .push(UpdateOperation::Set(field_name.to_string(), value.into()));
        self
    }

    pub fn unset(mut self, field_name: &str) -> Update {
        self.operations
            .push(UpdateOperation::Unset(field_name.to_string()));
        self
    }

    pub fn inc<T: Into<Value>>(mut self, field_name: &str, amount: T) -> Update {
        self.operations
            .push(UpdateOperation::Inc(field_name.to_string(), amount.into()));
        self
    }

    /// Parses `{$set: {...}, $unset: {...}, $inc: {...}}`.
    pub fn from_document(spec: &Document) -> FolioResult<Update> {
        let mut update = Update::new();
        for (operator, operand) in spec.iter() {
            let fields = match operand.as_document() {
                Some(fields) => fields,
                None => {
                    log::error!("Update operator {} expects a document, found {}", operator, operand);
                    return Err(FolioError::new(
                        &format!("Operand of '{}' must be a document", operator),
                        ErrorKind::ValidationError,
                    ));
                }
            };

            for (field, value) in fields.iter() {
                let operation = match operator.as_str() {
                    SET => UpdateOperation::Set(field.clone(), value.clone()),
                    UNSET => UpdateOperation::Unset(field.clone()),
                    INC => UpdateOperation::Inc(field.clone(), value.clone()),
                    other => {
                        log::error!("Unsupported update operator {}", other);
                        return Err(FolioError::new(
                            &format!("Unsupported update operator '{}'", other),
                            ErrorKind::ValidationError,
                        ));
                    }
                };
                update.operations.push(operation);
            }
        }
        update.validate()?;
        Ok(update)
    }

    pub fn operations(&self) -> &[UpdateOperation] {
        &self.operations
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn validate(&self) -> FolioResult<()> {
        if self.operations.is_empty() {
            log::error!("Update has no operators");
            return Err(FolioError::new(
                "Update must contain at least one of $set, $unset or $inc",
                ErrorKind::ValidationError,
            ));
        }

        let mut seen: Vec<&str> = Vec::with_capacity(self.operations.len());
        for operation in &self.operations {
            let field = operation.field_name();
            if field.is_empty() || field.split(FIELD_SEPARATOR).any(|p| p.is_empty()) {
                log::error!("Update targets an empty field name: {:?}", field);
                return Err(FolioError::new(
                    "Update field names cannot be empty",
                    ErrorKind::ValidationError,
                ));
            }
            if field == DOC_ID || field.starts_with(&format!("{}{}", DOC_ID, FIELD_SEPARATOR)) {
                log::error!("Update attempts to modify {}", DOC_ID);
                return Err(FolioError::new(
                    "The _id field is immutable",
                    ErrorKind::ValidationError,
                ));
            }
            if seen.iter().any(|other| paths_overlap(other, field)) {
                log::error!("Update modifies {} more than once", field);
                return Err(FolioError::new(
                    &format!("Conflicting modifications of '{}'", field),
                    ErrorKind::ValidationError,
                ));
            }
            if let UpdateOperation::Inc(_, amount) = operation {
                if !amount.is_number() {
                    log::error!("$inc amount for {} is not a number: {}", field, amount);
                    return Err(FolioError::new(
                        &format!("$inc amount for '{}' must be a number", field),
                        ErrorKind::ValidationError,
                    ));
                }
            }
            seen.push(field);
        }
        Ok(())
    }

    /// Returns the modified copy of `document`; the input is untouched.
    pub fn apply(&self, document: &Document) -> FolioResult<Document> {
        let mut updated = document.clone();
        for operation in &self.operations {
            match operation {
                UpdateOperation::Set(field, value) => updated.put(field, value.clone())?,
                UpdateOperation::Unset(field) => {
                    updated.remove(field)?;
                }
                UpdateOperation::Inc(field, amount) => {
                    let current = updated.lookup(field)?;
                    let next = match current {
                        None => amount.clone(),
                        Some(value) => increment(field, &value, amount)?,
                    };
                    updated.put(field, next)?;
                }
            }
        }
        Ok(updated)
    }
}

impl Display for Update {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .operations
            .iter()
            .map(|op| match op {
                UpdateOperation::Set(field, value) => format!("{} {}: {}", SET, field, value),
                UpdateOperation::Unset(field) => format!("{} {}", UNSET, field),
                UpdateOperation::Inc(field, value) => format!("{} {}: {}", INC, field, value),
            })
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

fn increment(field: &str, current: &Value, amount: &Value) -> FolioResult<Value> {
    match (current, amount) {
        (Value::I64(a), Value::I64(b)) => match a.checked_add(*b) {
            Some(sum) => Ok(Value::I64(sum)),
            None => {
                log::error!("$inc overflows field {}: {} + {}", field, a, b);
                Err(FolioError::new(
                    &format!("Integer overflow incrementing '{}'", field),
                    ErrorKind::EvaluationError,
                ))
            }
        },
        (a, b) if a.is_number() && b.is_number() => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Ok(Value::F64(x + y)),
            _ => Err(FolioError::new(
                "Numeric conversion failed",
                ErrorKind::InternalError,
            )),
        },
        (other, _) => {
            log::error!(
                "$inc applied to non-numeric field {} of type {}",
                field,
                other.type_name()
            );
            Err(FolioError::new(
                &format!(
                    "Cannot apply $inc to '{}' of type {}",
                    field,
                    other.type_name()
                ),
                ErrorKind::EvaluationError,
            ))
        }
    }
}
