use crate::collection::Document;
use crate::common::{Value, DOC_ID, FIELD_SEPARATOR};
use crate::errors::{ErrorKind, FolioError, FolioResult};
use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProjectionMode {
    /// Keep only the listed fields (and `_id` unless excluded)
    Include,
    /// Keep everything except the listed fields
    Exclude,
}

/// Field selection applied to query results.
///
/// The two modes are exclusive: a projection either lists fields to keep
/// or fields to drop. `_id` is the only field that may be excluded from an
/// inclusion projection; it is kept unless excluded explicitly.
///
/// ```rust,ignore
/// let projection = Projection::from_document(&doc! { title: 1, author: 1, price: 1, "_id": 0 })?;
/// let cursor = books.find(all())?.project(projection);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Projection {
    mode: ProjectionMode,
    fields: Vec<String>,
    include_id: bool,
}

impl Projection {
    /// Keeps only `fields` (plus `_id`).
    pub fn include(fields: Vec<&str>) -> Projection {
        Projection {
            mode: ProjectionMode::Include,
            fields: fields.into_iter().map(String::from).collect(),
            include_id: true,
        }
    }

    /// Drops `fields`.
    pub fn exclude(fields: Vec<&str>) -> Projection {
        Projection {
            mode: ProjectionMode::Exclude,
            fields: fields.into_iter().map(String::from).collect(),
            include_id: true,
        }
    }

    /// Also drops `_id`.
    pub fn exclude_id(mut self) -> Projection {
        self.include_id = false;
        self
    }

    /// Parses `{field: 1|0|true|false, ...}`; embedded documents are read as
    /// dotted paths. Mixing inclusion and exclusion of non-id fields is a
    /// validation error.
    pub fn from_document(spec: &Document) -> FolioResult<Projection> {
        let mut flags = Vec::new();
        flatten_spec(spec, "", &mut flags)?;

        let mut include_id = true;
        let mut id_included = false;
        let mut included = Vec::new();
        let mut excluded = Vec::new();
        for (field, on) in flags {
            if field == DOC_ID {
                include_id = on;
                id_included = on;
            } else if on {
                included.push(field);
            } else {
                excluded.push(field);
            }
        }

        if !included.is_empty() && !excluded.is_empty() {
            log::error!(
                "Projection mixes inclusion of {:?} with exclusion of {:?}",
                included,
                excluded
            );
            return Err(FolioError::new(
                "Projection cannot mix inclusion and exclusion of fields other than _id",
                ErrorKind::ValidationError,
            ));
        }

        // `{_id: 1}` alone keeps nothing but the id
        let (mode, fields) = if included.is_empty() && !(id_included && excluded.is_empty()) {
            (ProjectionMode::Exclude, excluded)
        } else {
            (ProjectionMode::Include, included)
        };
        Ok(Projection {
            mode,
            fields,
            include_id,
        })
    }

    pub fn mode(&self) -> ProjectionMode {
        self.mode
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn includes_id(&self) -> bool {
        self.include_id
    }

    pub fn validate(&self) -> FolioResult<()> {
        if self
            .fields
            .iter()
            .any(|f| f.is_empty() || f.split(FIELD_SEPARATOR).any(|p| p.is_empty()))
        {
            log::error!("Projection has an empty field name: {:?}", self.fields);
            return Err(FolioError::new(
                "Projection field names cannot be empty",
                ErrorKind::ValidationError,
            ));
        }
        if self.fields.iter().any(|f| f == DOC_ID) {
            log::error!("Projection lists _id as a regular field");
            return Err(FolioError::new(
                "Use exclude_id() to drop _id from a projection",
                ErrorKind::ValidationError,
            ));
        }
        Ok(())
    }

    /// `true` if `field` survives the projection unchanged.
    pub fn keeps_field(&self, field: &str) -> bool {
        if field == DOC_ID {
            return self.include_id;
        }
        match self.mode {
            ProjectionMode::Include => self.fields.iter().any(|f| is_same_or_within(field, f)),
            ProjectionMode::Exclude => !self
                .fields
                .iter()
                .any(|f| is_same_or_within(field, f) || is_same_or_within(f, field)),
        }
    }

    pub fn apply(&self, document: &Document) -> FolioResult<Document> {
        match self.mode {
            ProjectionMode::Include => {
                let mut picked = Document::new();
                for field in &self.fields {
                    if let Some(value) = document.lookup(field)? {
                        picked.put(field, value)?;
                    }
                }

                // top-level fields keep the source document's order
                let mut projected = Document::new();
                for key in document.keys() {
                    if key == DOC_ID {
                        if self.include_id {
                            projected.insert_raw(key, document.get(key)?);
                        }
                    } else if let Some(value) = picked.lookup(key)? {
                        projected.insert_raw(key, value);
                    }
                }
                Ok(projected)
            }
            ProjectionMode::Exclude => {
                let mut projected = document.clone();
                for field in &self.fields {
                    projected.remove(field)?;
                }
                if !self.include_id {
                    projected.remove(DOC_ID)?;
                }
                Ok(projected)
            }
        }
    }
}

impl Display for Projection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let flag = match self.mode {
            ProjectionMode::Include => 1,
            ProjectionMode::Exclude => 0,
        };
        let mut parts: Vec<String> = self
            .fields
            .iter()
            .map(|field| format!("\"{}\": {}", field, flag))
            .collect();
        if !self.include_id {
            parts.push(format!("\"{}\": 0", DOC_ID));
        } else if self.mode == ProjectionMode::Include && self.fields.is_empty() {
            parts.push(format!("\"{}\": 1", DOC_ID));
        }
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// `true` when `path` is `ancestor` or lies inside it.
fn is_same_or_within(path: &str, ancestor: &str) -> bool {
    path == ancestor
        || (path.starts_with(ancestor) && path[ancestor.len()..].starts_with(FIELD_SEPARATOR))
}

fn flatten_spec(spec: &Document, prefix: &str, flags: &mut Vec<(String, bool)>) -> FolioResult<()> {
    for (key, value) in spec.iter() {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}{}{}", prefix, FIELD_SEPARATOR, key)
        };

        match value {
            Value::Document(nested) if !nested.is_empty() => flatten_spec(nested, &path, flags)?,
            other => match other.as_flag() {
                Some(0) => flags.push((path, false)),
                Some(1) => flags.push((path, true)),
                _ => {
                    log::error!("Invalid projection value {} for field {}", other, path);
                    return Err(FolioError::new(
                        &format!("Projection value for '{}' must be 0, 1, true or false", path),
                        ErrorKind::ValidationError,
                    ));
                }
            },
        }
    }
    Ok(())
}
