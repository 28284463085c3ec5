use crate::common::{NON_UNIQUE_INDEX, UNIQUE_INDEX};

/// Options for creating an index.
///
/// ```rust,ignore
/// collection.create_index(vec!["isbn"], &unique_index())?;
/// collection.create_index(vec!["author", "published_year"], &non_unique_index())?;
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexOptions {
    index_type: String,
}

impl IndexOptions {
    pub fn new(index_type: &str) -> IndexOptions {
        IndexOptions {
            index_type: index_type.to_string(),
        }
    }

    pub fn index_type(&self) -> &str {
        &self.index_type
    }

    pub fn is_unique(&self) -> bool {
        self.index_type == UNIQUE_INDEX
    }
}

impl Default for IndexOptions {
    fn default() -> Self {
        IndexOptions::new(NON_UNIQUE_INDEX)
    }
}

pub fn unique_index() -> IndexOptions {
    IndexOptions::new(UNIQUE_INDEX)
}

pub fn non_unique_index() -> IndexOptions {
    IndexOptions::new(NON_UNIQUE_INDEX)
}
