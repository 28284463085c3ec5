use crate::collection::{Document, DocumentId};
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};

/// Compare two floats with NaN treated as greater than every number.
#[inline]
fn num_cmp_float(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

// 2^63, the first float above i64::MAX
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

/// Exact comparison of an integer with a float, without rounding the integer.
fn int_cmp_float(a: i64, b: f64) -> Ordering {
    if b.is_nan() || b >= I64_BOUND {
        return Ordering::Less;
    }
    if b < -I64_BOUND {
        return Ordering::Greater;
    }
    let whole = b.trunc();
    match a.cmp(&(whole as i64)) {
        Ordering::Equal => num_cmp_float(whole, b),
        other => other,
    }
}

/// Represents a [Document] value: a scalar like [Value::I64] or
/// [Value::String], or a nested [Value::Document] / [Value::Array].
///
/// Values of different types are ordered by a fixed type rank:
///
/// `Null < numbers < String < Document < Array < Id < Bool`
///
/// Integers and floats share one rank and compare numerically, so
/// `Value::I64(10) == Value::F64(10.0)`. `Null` is the minimum of the
/// order, which is what makes missing fields sort first.
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Document(Document),
    Array(Vec<Value>),
    Id(DocumentId),
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_debug_string())
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        let rank = self.type_rank().cmp(&other.type_rank());
        if rank != Ordering::Equal {
            return rank;
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::I64(a), Value::I64(b)) => a.cmp(b),
            (Value::I64(a), Value::F64(b)) => int_cmp_float(*a, *b),
            (Value::F64(a), Value::I64(b)) => int_cmp_float(*b, *a).reverse(),
            (Value::F64(a), Value::F64(b)) => num_cmp_float(*a, *b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Document(a), Value::Document(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a.cmp(b),
            (Value::Id(a), Value::Id(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            // unreachable once ranks are equal
            _ => Ordering::Equal,
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_rank().hash(state);
        match self {
            Value::Null => {}
            Value::Bool(v) => v.hash(state),
            Value::I64(v) => v.hash(state),
            Value::F64(v) => {
                // integral floats hash like the equal integer
                if v.is_nan() {
                    u64::MAX.hash(state)
                } else if v.fract() == 0.0 && *v >= -I64_BOUND && *v < I64_BOUND {
                    (*v as i64).hash(state)
                } else {
                    v.to_bits().hash(state)
                }
            }
            Value::String(v) => v.hash(state),
            Value::Document(v) => v.hash(state),
            Value::Array(v) => v.hash(state),
            Value::Id(v) => v.hash(state),
        }
    }
}

impl Value {
    /// Creates a new [Value] from anything that converts into one.
    pub fn from<T: Into<Value>>(value: T) -> Value {
        value.into()
    }

    /// Creates a [Value::Array] from a vector of convertible values.
    pub fn from_vec<T: Into<Value>>(values: Vec<T>) -> Value {
        Value::Array(values.into_iter().map(|v| v.into()).collect())
    }

    /// Position of this value's type in the cross-type order.
    pub fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::I64(_) | Value::F64(_) => 1,
            Value::String(_) => 2,
            Value::Document(_) => 3,
            Value::Array(_) => 4,
            Value::Id(_) => 5,
            Value::Bool(_) => 6,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I64(_) => "int",
            Value::F64(_) => "double",
            Value::String(_) => "string",
            Value::Document(_) => "document",
            Value::Array(_) => "array",
            Value::Id(_) => "id",
        }
    }

    /// Returns `true` when both values belong to the same type bracket, the
    /// precondition for range comparisons (`$gt`, `$lt`, ...).
    #[inline]
    pub fn is_comparable_with(&self, other: &Value) -> bool {
        self.type_rank() == other.type_rank()
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::I64(_) | Value::F64(_))
    }

    #[inline]
    pub fn is_document(&self) -> bool {
        matches!(self, Value::Document(_))
    }

    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn as_bool(&self) -> Option<&bool> {
        match self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<&i64> {
        match self {
            Value::I64(v) => Some(v),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I64(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&String> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Document(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_id(&self) -> Option<&DocumentId> {
        match self {
            Value::Id(v) => Some(v),
            _ => None,
        }
    }

    /// Interprets the value as a projection or sort flag: `1`/`true` is on,
    /// `0`/`false` is off.
    pub(crate) fn as_flag(&self) -> Option<i64> {
        match self {
            Value::Bool(true) => Some(1),
            Value::Bool(false) => Some(0),
            Value::I64(v) => Some(*v),
            Value::F64(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    /// Compact JSON-like rendering used by `Display`.
    pub(crate) fn to_json(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(v) => v.to_string(),
            Value::I64(v) => v.to_string(),
            Value::F64(v) => {
                if v.is_finite() && v.fract() == 0.0 {
                    format!("{:.1}", v)
                } else {
                    v.to_string()
                }
            }
            Value::String(v) => format!("\"{}\"", v.escape_default()),
            Value::Document(v) => v.to_json(),
            Value::Array(v) => {
                let items: Vec<String> = v.iter().map(|item| item.to_json()).collect();
                format!("[{}]", items.join(", "))
            }
            Value::Id(v) => format!("\"{}\"", v),
        }
    }

    pub(crate) fn to_debug_string(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(v) => format!("bool({})", v),
            Value::I64(v) => format!("i64({})", v),
            Value::F64(v) => format!("f64({})", v),
            Value::String(v) => format!("string(\"{}\")", v),
            Value::Document(v) => format!("object({})", v.to_debug_string()),
            Value::Array(v) => {
                let items: Vec<String> = v.iter().map(|item| item.to_debug_string()).collect();
                format!("array([{}])", items.join(", "))
            }
            Value::Id(v) => format!("id({})", v),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::I64(value as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, u8, i16, u16, i32, u32, i64, isize);

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or(Value::F64(value as f64), Value::I64)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Value::F64(value as f64), Value::I64)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::F64(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Document(value)
    }
}

impl From<DocumentId> for Value {
    fn from(value: DocumentId) -> Self {
        Value::Id(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(|v| v.into()).collect())
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

/// Creates a [Value] from any expression convertible into one.
///
/// ```rust
/// use folio::common::Value;
/// use folio::val;
///
/// assert_eq!(val!(42), Value::I64(42));
/// assert_eq!(val!("hello"), Value::String("hello".to_string()));
/// assert_eq!(val!(2.5), Value::F64(2.5));
/// ```
#[macro_export]
macro_rules! val {
    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn integers_and_floats_compare_numerically() {
        assert_eq!(Value::I64(10), Value::F64(10.0));
        assert!(Value::I64(9) < Value::F64(9.5));
        assert!(Value::F64(10.5) > Value::I64(10));
    }

    #[test]
    fn large_integers_compare_exactly_with_floats() {
        let big = 1_i64 << 53;
        let above = Value::I64(big + 1);
        assert_ne!(above, Value::F64(big as f64));
        assert!(above > Value::F64(big as f64));
        assert!(Value::F64(big as f64) < above);
        assert_eq!(Value::I64(big), Value::F64(big as f64));
        assert_ne!(hash_of(&above), hash_of(&Value::F64(big as f64)));

        assert!(Value::I64(i64::MAX) < Value::F64(I64_BOUND));
        assert!(Value::I64(i64::MIN) == Value::F64(-I64_BOUND));
        assert!(Value::I64(-3) > Value::F64(-3.5));
        assert!(Value::I64(-3) < Value::F64(-2.5));
        assert!(Value::I64(0) > Value::F64(f64::NEG_INFINITY));
        assert!(Value::I64(0) < Value::F64(f64::NAN));
    }

    #[test]
    fn equal_numbers_hash_equal() {
        assert_eq!(hash_of(&Value::I64(1950)), hash_of(&Value::F64(1950.0)));
        assert_ne!(hash_of(&Value::I64(1950)), hash_of(&Value::F64(1950.5)));
    }

    #[test]
    fn null_is_the_minimum() {
        let values = vec![
            Value::I64(i64::MIN),
            Value::String(String::new()),
            Value::Bool(false),
            Value::Array(vec![]),
            Value::Document(Document::new()),
        ];
        for value in values {
            assert!(Value::Null < value, "null must sort before {}", value);
        }
    }

    #[test]
    fn cross_type_order_follows_type_rank() {
        let mut values = vec![
            Value::Bool(true),
            Value::from(vec![1]),
            Value::from("text"),
            Value::Null,
            Value::from(doc! { "a": 1 }),
            Value::I64(3),
        ];
        values.sort();
        let names: Vec<&str> = values.iter().map(|v| v.type_name()).collect();
        assert_eq!(names, vec!["null", "int", "string", "document", "array", "bool"]);
    }

    #[test]
    fn nan_sorts_above_numbers() {
        assert!(Value::F64(f64::NAN) > Value::F64(f64::INFINITY));
        assert_eq!(Value::F64(f64::NAN), Value::F64(f64::NAN));
    }

    #[test]
    fn comparable_only_within_type_bracket() {
        assert!(Value::I64(1).is_comparable_with(&Value::F64(2.0)));
        assert!(!Value::I64(1).is_comparable_with(&Value::from("1")));
        assert!(!Value::Null.is_comparable_with(&Value::I64(0)));
    }

    #[test]
    fn integer_conversions_widen_to_i64() {
        assert_eq!(Value::from(5u8), Value::I64(5));
        assert_eq!(Value::from(-5i32), Value::I64(-5));
        assert_eq!(Value::from(7usize), Value::I64(7));
        assert!(matches!(Value::from(u64::MAX), Value::F64(_)));
    }

    #[test]
    fn option_and_vec_conversions() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::from("x"));
        assert_eq!(
            Value::from(vec!["a", "b"]),
            Value::Array(vec![Value::from("a"), Value::from("b")])
        );
    }

    #[test]
    fn display_renders_compact_json() {
        assert_eq!(Value::from(vec![1, 2]).to_string(), "[1, 2]");
        assert_eq!(Value::F64(15.0).to_string(), "15.0");
        assert_eq!(Value::from("a\"b").to_string(), "\"a\\\"b\"");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn flags_accept_numbers_and_booleans() {
        assert_eq!(Value::I64(1).as_flag(), Some(1));
        assert_eq!(Value::Bool(false).as_flag(), Some(0));
        assert_eq!(Value::F64(-1.0).as_flag(), Some(-1));
        assert_eq!(Value::from("1").as_flag(), None);
    }
}
