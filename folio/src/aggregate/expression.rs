use crate::collection::Document;
use crate::common::{Value, FIELD_SEPARATOR, OPERATOR_PREFIX};
use crate::errors::{ErrorKind, FolioError, FolioResult};
use std::fmt::{Display, Formatter};

/// Computed value used by `$addFields`, `$group` keys and accumulators.
///
/// Operator documents are parsed once into this tree, so evaluation never
/// looks at operator names again.
#[derive(Clone, Debug, PartialEq)]
pub enum Expression {
    /// `"$path"`: value at a dotted path.
    Field(String),
    Literal(Value),
    Add(Vec<Expression>),
    Subtract(Box<Expression>, Box<Expression>),
    Multiply(Vec<Expression>),
    Divide(Box<Expression>, Box<Expression>),
    Mod(Box<Expression>, Box<Expression>),
    Object(Vec<(String, Expression)>),
    Array(Vec<Expression>),
}

pub fn field_ref(path: &str) -> Expression {
    Expression::Field(path.to_string())
}

pub fn literal<T: Into<Value>>(value: T) -> Expression {
    Expression::Literal(value.into())
}

pub fn add(operands: Vec<Expression>) -> Expression {
    Expression::Add(operands)
}

pub fn subtract(minuend: Expression, subtrahend: Expression) -> Expression {
    Expression::Subtract(Box::new(minuend), Box::new(subtrahend))
}

pub fn multiply(operands: Vec<Expression>) -> Expression {
    Expression::Multiply(operands)
}

pub fn divide(dividend: Expression, divisor: Expression) -> Expression {
    Expression::Divide(Box::new(dividend), Box::new(divisor))
}

pub fn modulo(dividend: Expression, divisor: Expression) -> Expression {
    Expression::Mod(Box::new(dividend), Box::new(divisor))
}

pub fn object(fields: Vec<(&str, Expression)>) -> Expression {
    Expression::Object(
        fields
            .into_iter()
            .map(|(name, expr)| (name.to_string(), expr))
            .collect(),
    )
}

#[derive(Clone, Copy)]
enum Arithmetic {
    Add,
    Subtract,
    Multiply,
}

impl Expression {
    /// Parses the operator syntax: `"$field"`, `{$subtract: [a, b]}`,
    /// `{$mod: [a, b]}`, `{$add: [...]}`, `{$multiply: [...]}`,
    /// `{$divide: [a, b]}`, `{$literal: v}`, embedded documents and arrays.
    /// Anything else is a literal.
    pub fn parse(value: &Value) -> FolioResult<Expression> {
        match value {
            Value::String(s) if s.starts_with(OPERATOR_PREFIX) => {
                let path = &s[OPERATOR_PREFIX.len_utf8()..];
                if path.is_empty() || path.starts_with(OPERATOR_PREFIX) {
                    log::error!("Invalid field reference {:?}", s);
                    return Err(FolioError::new(
                        &format!("Invalid field reference '{}'", s),
                        ErrorKind::ValidationError,
                    ));
                }
                Ok(Expression::Field(path.to_string()))
            }
            Value::Document(doc) => Self::parse_document(doc),
            Value::Array(items) => Ok(Expression::Array(
                items.iter().map(Expression::parse).collect::<FolioResult<_>>()?,
            )),
            other => Ok(Expression::Literal(other.clone())),
        }
    }

    fn parse_document(doc: &Document) -> FolioResult<Expression> {
        let operator = doc.keys().find(|k| k.starts_with(OPERATOR_PREFIX));
        let operator = match operator {
            None => {
                let fields = doc
                    .iter()
                    .map(|(name, value)| Ok((name.clone(), Expression::parse(value)?)))
                    .collect::<FolioResult<Vec<_>>>()?;
                return Ok(Expression::Object(fields));
            }
            Some(operator) => operator,
        };

        if doc.size() != 1 {
            log::error!("Expression document {} mixes an operator with other fields", doc);
            return Err(FolioError::new(
                "An expression operator must be the only field of its document",
                ErrorKind::ValidationError,
            ));
        }

        let operand = doc.get(operator)?;
        match operator.as_str() {
            "$literal" => Ok(Expression::Literal(operand)),
            "$add" => Ok(Expression::Add(Self::parse_operands(operator, &operand)?)),
            "$multiply" => Ok(Expression::Multiply(Self::parse_operands(operator, &operand)?)),
            "$subtract" => {
                let (a, b) = Self::parse_pair(operator, &operand)?;
                Ok(subtract(a, b))
            }
            "$divide" => {
                let (a, b) = Self::parse_pair(operator, &operand)?;
                Ok(divide(a, b))
            }
            "$mod" => {
                let (a, b) = Self::parse_pair(operator, &operand)?;
                Ok(modulo(a, b))
            }
            other => {
                log::error!("Unsupported expression operator {}", other);
                Err(FolioError::new(
                    &format!("Unsupported expression operator '{}'", other),
                    ErrorKind::ValidationError,
                ))
            }
        }
    }

    fn parse_operands(operator: &str, operand: &Value) -> FolioResult<Vec<Expression>> {
        let operands = match operand.as_array() {
            Some(items) => items.iter().map(Expression::parse).collect::<FolioResult<Vec<_>>>()?,
            None => vec![Expression::parse(operand)?],
        };
        if operands.is_empty() {
            log::error!("{} has no operands", operator);
            return Err(FolioError::new(
                &format!("'{}' needs at least one operand", operator),
                ErrorKind::ValidationError,
            ));
        }
        Ok(operands)
    }

    fn parse_pair(operator: &str, operand: &Value) -> FolioResult<(Expression, Expression)> {
        match operand.as_array() {
            Some(items) if items.len() == 2 => {
                Ok((Expression::parse(&items[0])?, Expression::parse(&items[1])?))
            }
            _ => {
                log::error!("{} expects two operands, found {}", operator, operand);
                Err(FolioError::new(
                    &format!("'{}' takes an array of exactly two operands", operator),
                    ErrorKind::ValidationError,
                ))
            }
        }
    }

    /// `true` when the expression is built from literals only, so evaluating
    /// it cannot fail on any document.
    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Literal(_) => true,
            Expression::Array(items) => items.iter().all(Expression::is_constant),
            Expression::Object(fields) => fields
                .iter()
                .all(|(name, e)| !name.contains(FIELD_SEPARATOR) && e.is_constant()),
            _ => false,
        }
    }

    /// Field paths the expression reads.
    pub fn field_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.collect_refs(&mut refs);
        refs
    }

    fn collect_refs<'a>(&'a self, refs: &mut Vec<&'a str>) {
        match self {
            Expression::Field(path) => refs.push(path),
            Expression::Literal(_) => {}
            Expression::Add(items) | Expression::Multiply(items) | Expression::Array(items) => {
                items.iter().for_each(|e| e.collect_refs(refs))
            }
            Expression::Subtract(a, b) | Expression::Divide(a, b) | Expression::Mod(a, b) => {
                a.collect_refs(refs);
                b.collect_refs(refs);
            }
            Expression::Object(fields) => fields.iter().for_each(|(_, e)| e.collect_refs(refs)),
        }
    }

    /// Evaluates against `document`; a referenced field that is absent is
    /// an evaluation error.
    pub fn evaluate(&self, document: &Document) -> FolioResult<Value> {
        match self.resolve(document)? {
            Some(value) => Ok(value),
            None => Err(missing_field(self)),
        }
    }

    /// Like [Expression::evaluate], but a bare field reference to an absent
    /// field yields `None`.
    pub fn resolve(&self, document: &Document) -> FolioResult<Option<Value>> {
        match self {
            Expression::Field(path) => document.lookup(path),
            Expression::Literal(value) => Ok(Some(value.clone())),
            Expression::Add(items) => fold(items, document, Arithmetic::Add).map(Some),
            Expression::Multiply(items) => fold(items, document, Arithmetic::Multiply).map(Some),
            Expression::Subtract(a, b) => {
                let a = numeric_operand(a, document, "$subtract")?;
                let b = numeric_operand(b, document, "$subtract")?;
                combine(&a, &b, Arithmetic::Subtract).map(Some)
            }
            Expression::Divide(a, b) => {
                let a = numeric_operand(a, document, "$divide")?;
                let b = numeric_operand(b, document, "$divide")?;
                divide_values(&a, &b).map(Some)
            }
            Expression::Mod(a, b) => {
                let a = numeric_operand(a, document, "$mod")?;
                let b = numeric_operand(b, document, "$mod")?;
                mod_values(&a, &b).map(Some)
            }
            Expression::Object(fields) => {
                let mut result = Document::new();
                for (name, expr) in fields {
                    result.put(name, expr.evaluate(document)?)?;
                }
                Ok(Some(Value::Document(result)))
            }
            Expression::Array(items) => Ok(Some(Value::Array(
                items
                    .iter()
                    .map(|e| e.evaluate(document))
                    .collect::<FolioResult<_>>()?,
            ))),
        }
    }
}

fn missing_field(expression: &Expression) -> FolioError {
    log::error!("Expression {} references a missing field", expression);
    FolioError::new(
        &format!("Missing field in expression {}", expression),
        ErrorKind::EvaluationError,
    )
}

fn numeric_operand(expression: &Expression, document: &Document, operator: &str) -> FolioResult<Value> {
    let value = expression.evaluate(document)?;
    if value.is_number() {
        Ok(value)
    } else {
        log::error!(
            "{} operand {} evaluated to {} of type {}",
            operator,
            expression,
            value,
            value.type_name()
        );
        Err(FolioError::new(
            &format!(
                "'{}' needs numeric operands, found {}",
                operator,
                value.type_name()
            ),
            ErrorKind::EvaluationError,
        ))
    }
}

fn fold(items: &[Expression], document: &Document, op: Arithmetic) -> FolioResult<Value> {
    let name = match op {
        Arithmetic::Add => "$add",
        Arithmetic::Multiply => "$multiply",
        Arithmetic::Subtract => "$subtract",
    };
    let mut iter = items.iter();
    let mut acc = match iter.next() {
        Some(first) => numeric_operand(first, document, name)?,
        None => return Ok(Value::I64(0)),
    };
    for item in iter {
        let next = numeric_operand(item, document, name)?;
        acc = combine(&acc, &next, op)?;
    }
    Ok(acc)
}

fn combine(a: &Value, b: &Value, op: Arithmetic) -> FolioResult<Value> {
    if let (Value::I64(x), Value::I64(y)) = (a, b) {
        let result = match op {
            Arithmetic::Add => x.checked_add(*y),
            Arithmetic::Subtract => x.checked_sub(*y),
            Arithmetic::Multiply => x.checked_mul(*y),
        };
        return result.map(Value::I64).ok_or_else(|| {
            log::error!("Integer overflow evaluating {} and {}", x, y);
            FolioError::new("Integer overflow", ErrorKind::EvaluationError)
        });
    }

    let (x, y) = floats(a, b)?;
    Ok(Value::F64(match op {
        Arithmetic::Add => x + y,
        Arithmetic::Subtract => x - y,
        Arithmetic::Multiply => x * y,
    }))
}

fn divide_values(a: &Value, b: &Value) -> FolioResult<Value> {
    let (x, y) = floats(a, b)?;
    if y == 0.0 {
        log::error!("Division of {} by zero", a);
        return Err(FolioError::new("Division by zero", ErrorKind::EvaluationError));
    }
    Ok(Value::F64(x / y))
}

fn mod_values(a: &Value, b: &Value) -> FolioResult<Value> {
    if let (Value::I64(x), Value::I64(y)) = (a, b) {
        if *y == 0 {
            log::error!("Modulo of {} by zero", x);
            return Err(FolioError::new("Modulo by zero", ErrorKind::EvaluationError));
        }
        return x.checked_rem(*y).map(Value::I64).ok_or_else(|| {
            log::error!("Integer overflow evaluating {} % {}", x, y);
            FolioError::new("Integer overflow", ErrorKind::EvaluationError)
        });
    }
    let (x, y) = floats(a, b)?;
    if y == 0.0 {
        log::error!("Modulo of {} by zero", a);
        return Err(FolioError::new("Modulo by zero", ErrorKind::EvaluationError));
    }
    Ok(Value::F64(x % y))
}

fn floats(a: &Value, b: &Value) -> FolioResult<(f64, f64)> {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(FolioError::new(
            "Arithmetic on non-numeric values",
            ErrorKind::EvaluationError,
        )),
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let list = |items: &[Expression]| {
            items
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self {
            Expression::Field(path) => write!(f, "\"${}\"", path),
            Expression::Literal(value) => write!(f, "{}", value),
            Expression::Add(items) => write!(f, "{{$add: [{}]}}", list(items)),
            Expression::Multiply(items) => write!(f, "{{$multiply: [{}]}}", list(items)),
            Expression::Subtract(a, b) => write!(f, "{{$subtract: [{}, {}]}}", a, b),
            Expression::Divide(a, b) => write!(f, "{{$divide: [{}, {}]}}", a, b),
            Expression::Mod(a, b) => write!(f, "{{$mod: [{}, {}]}}", a, b),
            Expression::Object(fields) => {
                let parts: Vec<String> = fields.iter().map(|(k, e)| format!("{}: {}", k, e)).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Expression::Array(items) => write!(f, "[{}]", list(items)),
        }
    }
}
