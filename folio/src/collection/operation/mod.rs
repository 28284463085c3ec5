mod collection_operations;
mod collection_state;
mod find_optimizer;
mod index_manager;
mod read_operations;
mod write_operations;

pub(crate) use collection_operations::*;
pub(crate) use read_operations::{candidate_ids, execute, ReadOperations};
