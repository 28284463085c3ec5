use crate::collection::DocumentId;
use crate::common::{Value, DOC_ID, FIELD_SEPARATOR};
use crate::errors::{ErrorKind, FolioError, FolioResult};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};

/// A schemaless record: an ordered mapping from field name to [Value].
///
/// Field order is insertion order and is significant for equality,
/// so index and sort documents such as
/// `{author: 1, published_year: 1}` carry an ordered field sequence.
///
/// Embedded fields are addressed with dotted paths (`location.city`,
/// `tags.0`). Reading a missing path yields [Value::Null].
///
/// ```ignore
/// let mut doc = Document::new();
/// doc.put("title", "1984")?;
/// doc.put("publisher.city", "London")?;
/// assert_eq!(doc.get("publisher.city")?, Value::from("London"));
/// ```
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of top-level fields.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with `key`, replacing any previous value in place.
    /// A dotted key creates or walks embedded documents.
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> FolioResult<()> {
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(FolioError::new(
                "Document does not support empty key",
                ErrorKind::InvalidFieldName,
            ));
        }

        let value = value.into();
        if key.contains(FIELD_SEPARATOR) {
            let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
            self.deep_put(&splits, value)
        } else {
            self.data.insert(key.to_string(), value);
            Ok(())
        }
    }

    /// Inserts a top-level field without interpreting separators.
    pub(crate) fn insert_raw(&mut self, key: &str, value: Value) {
        self.data.insert(key.to_string(), value);
    }

    /// Returns the value at `key`, or [Value::Null] when the path is absent.
    ///
    /// ```ignore
    /// let doc = doc!{ items: [1, 2, 3], owner: { name: "Ann" } };
    /// assert_eq!(doc.get("items.1")?, Value::I64(2));
    /// assert_eq!(doc.get("owner.name")?, Value::from("Ann"));
    /// assert_eq!(doc.get("missing")?, Value::Null);
    /// ```
    pub fn get(&self, key: &str) -> FolioResult<Value> {
        Ok(self.lookup(key)?.unwrap_or(Value::Null))
    }

    /// Like [Document::get] but distinguishes an absent path (`None`) from a
    /// stored `null` (`Some(Value::Null)`).
    pub fn lookup(&self, key: &str) -> FolioResult<Option<Value>> {
        if let Some(value) = self.data.get(key) {
            return Ok(Some(value.clone()));
        }

        if !key.contains(FIELD_SEPARATOR) {
            return Ok(None);
        }

        let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
        if splits[0].is_empty() {
            log::error!("Document does not support empty key");
            return Err(FolioError::new(
                "Document does not support empty key",
                ErrorKind::InvalidFieldName,
            ));
        }
        recursive_get(self.data.get(splits[0]), &splits[1..])
    }

    /// Returns `true` if the path resolves to a stored value, `null` included.
    pub fn contains_field(&self, key: &str) -> bool {
        matches!(self.lookup(key), Ok(Some(_)))
    }

    /// The document's id, when `_id` holds a [DocumentId].
    pub fn id(&self) -> Option<DocumentId> {
        match self.data.get(DOC_ID) {
            Some(Value::Id(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn has_id(&self) -> bool {
        self.data.contains_key(DOC_ID)
    }

    /// Removes the value at `key` and returns it. Removing an absent path is
    /// not an error.
    pub fn remove(&mut self, key: &str) -> FolioResult<Option<Value>> {
        if let Some(value) = self.data.shift_remove(key) {
            return Ok(Some(value));
        }

        if !key.contains(FIELD_SEPARATOR) {
            return Ok(None);
        }
        let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
        self.deep_remove(&splits)
    }

    /// Iterates top-level `(field, value)` pairs in field order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.data.iter()
    }

    /// Top-level field names in order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// Dotted paths of every leaf field, embedded documents expanded.
    pub fn fields(&self) -> Vec<String> {
        self.collect_fields("")
    }

    /// Copies every field of `other` into this document; embedded documents
    /// merge recursively, everything else is overwritten.
    pub fn merge(&mut self, other: &Document) {
        for (key, value) in other.iter() {
            match (self.data.get_mut(key), value) {
                (Some(Value::Document(mine)), Value::Document(theirs)) => mine.merge(theirs),
                _ => {
                    self.data.insert(key.clone(), value.clone());
                }
            }
        }
    }

    pub(crate) fn to_json(&self) -> String {
        if self.data.is_empty() {
            return "{}".to_string();
        }
        let fields: Vec<String> = self
            .data
            .iter()
            .map(|(key, value)| format!("\"{}\": {}", key, value.to_json()))
            .collect();
        format!("{{{}}}", fields.join(", "))
    }

    pub(crate) fn to_debug_string(&self) -> String {
        let fields: Vec<String> = self
            .data
            .iter()
            .map(|(key, value)| format!("\"{}\": {}", key, value.to_debug_string()))
            .collect();
        format!("{{{}}}", fields.join(", "))
    }

    fn collect_fields(&self, prefix: &str) -> Vec<String> {
        let mut fields = Vec::with_capacity(self.data.len());
        for (key, value) in &self.data {
            let field = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}{}{}", prefix, FIELD_SEPARATOR, key)
            };

            match value {
                Value::Document(doc) if !doc.is_empty() => {
                    fields.append(&mut doc.collect_fields(&field))
                }
                _ => fields.push(field),
            }
        }
        fields
    }

    fn deep_put(&mut self, splits: &[&str], value: Value) -> FolioResult<()> {
        let key = splits[0];
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(FolioError::new(
                "Document does not support empty key",
                ErrorKind::InvalidFieldName,
            ));
        }

        if splits.len() == 1 {
            self.data.insert(key.to_string(), value);
            return Ok(());
        }

        let remaining = &splits[1..];
        match self.data.get_mut(key) {
            Some(Value::Document(nested)) => nested.deep_put(remaining, value),
            Some(Value::Array(items)) => {
                let index = parse_array_index(remaining[0])?;
                match items.get_mut(index) {
                    Some(item) if remaining.len() == 1 => {
                        *item = value;
                        Ok(())
                    }
                    Some(Value::Document(nested)) => nested.deep_put(&remaining[1..], value),
                    _ => {
                        log::error!("Cannot set {} inside array field {}", remaining.join("."), key);
                        Err(FolioError::new(
                            &format!("Cannot set '{}' inside array field '{}'", remaining.join("."), key),
                            ErrorKind::InvalidFieldName,
                        ))
                    }
                }
            }
            _ => {
                // absent or scalar: replaced by a fresh embedded document
                let mut nested = Document::new();
                nested.deep_put(remaining, value)?;
                self.data.insert(key.to_string(), Value::Document(nested));
                Ok(())
            }
        }
    }

    fn deep_remove(&mut self, splits: &[&str]) -> FolioResult<Option<Value>> {
        let key = splits[0];
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(FolioError::new(
                "Document does not support empty key",
                ErrorKind::InvalidFieldName,
            ));
        }

        if splits.len() == 1 {
            return Ok(self.data.shift_remove(key));
        }

        match self.data.get_mut(key) {
            Some(Value::Document(nested)) => nested.deep_remove(&splits[1..]),
            Some(Value::Array(items)) => {
                let index = parse_array_index(splits[1])?;
                if index >= items.len() {
                    return Ok(None);
                }
                if splits.len() == 2 {
                    Ok(Some(items.remove(index)))
                } else if let Value::Document(nested) = &mut items[index] {
                    nested.deep_remove(&splits[2..])
                } else {
                    Ok(None)
                }
            }
            _ => Ok(None),
        }
    }
}

fn parse_array_index(key: &str) -> FolioResult<usize> {
    key.parse::<usize>().map_err(|_| {
        log::error!("Invalid array index {} to access array inside a document", key);
        FolioError::new(
            &format!("Invalid array index {} to access array inside a document", key),
            ErrorKind::ValidationError,
        )
    })
}

fn recursive_get(value: Option<&Value>, splits: &[&str]) -> FolioResult<Option<Value>> {
    let value = match value {
        None => return Ok(None),
        Some(v) => v,
    };

    if splits.is_empty() {
        return Ok(Some(value.clone()));
    }

    let key = splits[0];
    if key.is_empty() {
        log::error!("Document does not support empty key");
        return Err(FolioError::new(
            "Document does not support empty key",
            ErrorKind::InvalidFieldName,
        ));
    }

    match value {
        Value::Document(obj) => recursive_get(obj.data.get(key), &splits[1..]),
        Value::Array(arr) => {
            if key.starts_with('-') {
                // a negative index is never valid
                parse_array_index(key)?;
            }
            match key.parse::<usize>() {
                // out of bound index reads as absent
                Ok(index) => recursive_get(arr.get(index), &splits[1..]),
                Err(_) => decompose(arr, splits),
            }
        }
        _ => Ok(None),
    }
}

/// Collects the path from every element of an array of documents.
fn decompose(arr: &[Value], splits: &[&str]) -> FolioResult<Option<Value>> {
    let mut items: Vec<Value> = Vec::with_capacity(arr.len());
    for item in arr {
        match recursive_get(Some(item), splits)? {
            Some(Value::Array(values)) => items.extend(values),
            Some(value) => items.push(value),
            None => {}
        }
    }

    if items.is_empty() {
        Ok(None)
    } else {
        Ok(Some(Value::Array(items)))
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.data.len() == other.data.len() && self.data.iter().eq(other.data.iter())
    }
}

impl Eq for Document {}

impl PartialOrd for Document {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Document {
    fn cmp(&self, other: &Self) -> Ordering {
        self.data.iter().cmp(other.data.iter())
    }
}

impl Hash for Document {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.data.len().hash(state);
        for (key, value) in &self.data {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_debug_string())
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// Keys are identifiers or string literals (needed for `$`-prefixed
/// operator names); values are literals, parenthesized expressions,
/// variables, nested `{}` documents or `[]` arrays. Negative literals
/// may be written directly.
///
/// ```rust
/// use folio::doc;
///
/// let sort = doc! { price: -1 };
/// let stage = doc! {
///     "$group": {
///         "_id": "$genre",
///         averagePrice: { "$avg": "$price" },
///         count: { "$sum": 1 },
///     }
/// };
/// let book = doc! {
///     title: "Dune",
///     tags: ["sf", "classic"],
///     published_year: (1960 + 5),
/// };
/// # assert_eq!(sort.size(), 1);
/// # assert_eq!(stage.size(), 1);
/// # assert_eq!(book.size(), 3);
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::collection::Document::new()
    };

    ($($tokens:tt)+) => {
        {
            let mut doc = $crate::collection::Document::new();
            $crate::doc_entries!(doc; $($tokens)+);
            doc
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! doc_entries {
    ($doc:ident;) => {};

    ($doc:ident; $key:tt : { $($inner:tt)* } $(, $($rest:tt)*)?) => {
        $doc.put(
            &$crate::collection::normalize(stringify!($key)),
            $crate::common::Value::Document($crate::doc!{ $($inner)* }),
        )
        .expect(&format!("Failed to put {} in document", stringify!($key)));
        $( $crate::doc_entries!($doc; $($rest)*); )?
    };

    ($doc:ident; $key:tt : [ $($inner:tt)* ] $(, $($rest:tt)*)?) => {
        $doc.put(
            &$crate::collection::normalize(stringify!($key)),
            $crate::common::Value::Array($crate::doc_array![$($inner)*]),
        )
        .expect(&format!("Failed to put {} in document", stringify!($key)));
        $( $crate::doc_entries!($doc; $($rest)*); )?
    };

    ($doc:ident; $key:tt : - $value:tt $(, $($rest:tt)*)?) => {
        $doc.put(
            &$crate::collection::normalize(stringify!($key)),
            $crate::common::Value::from(-$value),
        )
        .expect(&format!("Failed to put {} in document", stringify!($key)));
        $( $crate::doc_entries!($doc; $($rest)*); )?
    };

    ($doc:ident; $key:tt : $value:tt $(, $($rest:tt)*)?) => {
        $doc.put(
            &$crate::collection::normalize(stringify!($key)),
            $crate::common::Value::from($value),
        )
        .expect(&format!("Failed to put {} in document", stringify!($key)));
        $( $crate::doc_entries!($doc; $($rest)*); )?
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! doc_array {
    () => {
        Vec::<$crate::common::Value>::new()
    };

    ($($tokens:tt)+) => {
        {
            let mut items = Vec::<$crate::common::Value>::new();
            $crate::doc_array_items!(items; $($tokens)+);
            items
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! doc_array_items {
    ($items:ident;) => {};

    ($items:ident; { $($inner:tt)* } $(, $($rest:tt)*)?) => {
        $items.push($crate::common::Value::Document($crate::doc!{ $($inner)* }));
        $( $crate::doc_array_items!($items; $($rest)*); )?
    };

    ($items:ident; [ $($inner:tt)* ] $(, $($rest:tt)*)?) => {
        $items.push($crate::common::Value::Array($crate::doc_array![$($inner)*]));
        $( $crate::doc_array_items!($items; $($rest)*); )?
    };

    ($items:ident; - $value:tt $(, $($rest:tt)*)?) => {
        $items.push($crate::common::Value::from(-$value));
        $( $crate::doc_array_items!($items; $($rest)*); )?
    };

    ($items:ident; $value:tt $(, $($rest:tt)*)?) => {
        $items.push($crate::common::Value::from($value));
        $( $crate::doc_array_items!($items; $($rest)*); )?
    };
}
