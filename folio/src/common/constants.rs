// doc constants
pub const DOC_ID: &str = "_id";
pub const FIELD_SEPARATOR: &str = ".";

// index constants
pub const UNIQUE_INDEX: &str = "unique";
pub const NON_UNIQUE_INDEX: &str = "non-unique";
pub const INDEX_NAME_SEPARATOR: &str = "_";

// config defaults
pub const DEFAULT_PLAN_CACHE_SIZE: usize = 100;

// operator prefix for filters, updates, stages and field references
pub const OPERATOR_PREFIX: char = '$';
