use crate::collection::operation::collection_state::CollectionState;
use crate::collection::operation::read_operations::ReadOperations;
use crate::collection::{
    DeleteResult, Document, DocumentId, IdGenerator, Update, UpdateResult, WriteResult,
};
use crate::common::{Atomic, Value, WriteExecutor, DOC_ID};
use crate::errors::{ErrorKind, FolioError, FolioResult};
use crate::filter::Filter;
use std::sync::Arc;

/// Mutations of one collection. Each call prepares the next state on a
/// copy under the write lock and publishes it only when every step,
/// index maintenance included, succeeded.
#[derive(Clone)]
pub(crate) struct WriteOperations {
    state: Atomic<CollectionState>,
    id_generator: Arc<IdGenerator>,
    read_operations: ReadOperations,
}

impl WriteOperations {
    pub fn new(
        state: Atomic<CollectionState>,
        id_generator: Arc<IdGenerator>,
        read_operations: ReadOperations,
    ) -> Self {
        WriteOperations {
            state,
            id_generator,
            read_operations,
        }
    }

    pub fn insert(&self, document: Document) -> FolioResult<DocumentId> {
        self.state.write_with(|state| {
            state.ensure_open()?;
            let mut next = state.clone();
            let id = self.insert_into(&mut next, document)?;
            *state = next;
            Ok(id)
        })
    }

    /// Inserts all documents or none of them.
    pub fn insert_many(&self, documents: Vec<Document>) -> FolioResult<WriteResult> {
        self.state.write_with(|state| {
            state.ensure_open()?;
            let mut next = state.clone();
            let mut ids = Vec::with_capacity(documents.len());
            for document in documents {
                ids.push(self.insert_into(&mut next, document)?);
            }
            *state = next;
            log::debug!("Inserted {} documents into {}", ids.len(), state.name());
            Ok(WriteResult::new(ids))
        })
    }

    pub fn update(&self, filter: &Filter, update: &Update, first_only: bool) -> FolioResult<UpdateResult> {
        filter.validate()?;
        update.validate()?;

        self.state.write_with(|state| {
            state.ensure_open()?;
            let ids = self.read_operations.matching_ids(state, filter, first_only)?;

            let mut next = state.clone();
            let mut modified = 0;
            for id in &ids {
                let current = match next.get(id) {
                    Some(current) => current,
                    None => continue,
                };
                let updated = update.apply(current)?;
                if &updated != current {
                    next.replace_document(*id, updated)?;
                    modified += 1;
                }
            }

            if modified > 0 {
                *state = next;
            }
            Ok(UpdateResult::new(ids.len() as u64, modified))
        })
    }

    pub fn delete(&self, filter: &Filter, first_only: bool) -> FolioResult<DeleteResult> {
        filter.validate()?;

        self.state.write_with(|state| {
            state.ensure_open()?;
            let ids = self.read_operations.matching_ids(state, filter, first_only)?;
            if ids.is_empty() {
                return Ok(DeleteResult::new(0));
            }

            let mut next = state.clone();
            let mut deleted = 0;
            for id in &ids {
                if next.remove_document(id)?.is_some() {
                    deleted += 1;
                }
            }
            *state = next;
            Ok(DeleteResult::new(deleted))
        })
    }

    fn insert_into(&self, state: &mut CollectionState, document: Document) -> FolioResult<DocumentId> {
        let id = match document.lookup(DOC_ID)? {
            None => self.id_generator.next_id(),
            Some(Value::Id(id)) => {
                self.id_generator.observe(&id);
                id
            }
            Some(other) => {
                log::error!("Invalid {} value {} of type {}", DOC_ID, other, other.type_name());
                return Err(FolioError::new(
                    &format!("{} must be a document id, found {}", DOC_ID, other.type_name()),
                    ErrorKind::InvalidId,
                ));
            }
        };

        // _id leads the stored document
        let mut stored = Document::new();
        stored.insert_raw(DOC_ID, Value::Id(id));
        for (key, value) in document {
            if key != DOC_ID {
                stored.insert_raw(&key, value);
            }
        }
        state.insert_document(id, stored)?;
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::operation::find_optimizer::FindOptimizer;
    use crate::common::{atomic, ReadExecutor, SortableFields, UNIQUE_INDEX};
    use crate::doc;
    use crate::filter::{all, field};
    use crate::index::IndexDescriptor;

    fn operations() -> (WriteOperations, Atomic<CollectionState>) {
        let state = atomic(CollectionState::new("books"));
        let reads = ReadOperations::new(state.clone(), FindOptimizer::new(10));
        let writes = WriteOperations::new(state.clone(), Arc::new(IdGenerator::new()), reads);
        (writes, state)
    }

    #[test]
    fn insert_assigns_leading_id() {
        let (writes, state) = operations();
        let id = writes.insert(doc! { title: "Dune" }).unwrap();
        let stored = state.read_with(|s| s.get(&id).cloned()).unwrap();
        assert_eq!(stored.keys().next().unwrap(), DOC_ID);
        assert_eq!(stored.id(), Some(id));
    }

    #[test]
    fn insert_keeps_given_id_and_rejects_bad_ones() {
        let (writes, _) = operations();
        let mut doc = doc! { title: "Dune" };
        doc.put(DOC_ID, DocumentId::new(42)).unwrap();
        assert_eq!(writes.insert(doc.clone()).unwrap(), DocumentId::new(42));
        assert_eq!(
            writes.insert(doc).unwrap_err().kind(),
            &ErrorKind::UniqueConstraintViolation
        );
        // generated ids continue past observed ones
        assert!(writes.insert(doc! { a: 1 }).unwrap() > DocumentId::new(42));

        let err = writes.insert(doc! { "_id": "abc" }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidId);
    }

    #[test]
    fn insert_many_is_all_or_nothing() {
        let (writes, state) = operations();
        state
            .write()
            .add_index(IndexDescriptor::new(
                UNIQUE_INDEX,
                SortableFields::with_names(vec!["isbn"]),
                "books",
            ))
            .unwrap();

        let result = writes.insert_many(vec![doc! { isbn: "1" }, doc! { isbn: "1" }]);
        assert!(result.is_err());
        assert_eq!(state.read_with(|s| s.size()), 0);

        let result = writes
            .insert_many(vec![doc! { isbn: "1" }, doc! { isbn: "2" }])
            .unwrap();
        assert_eq!(result.affected_count(), 2);
    }

    #[test]
    fn update_one_picks_first_in_collection_order() {
        let (writes, state) = operations();
        let first = writes.insert(doc! { genre: "SF", n: 1 }).unwrap();
        writes.insert(doc! { genre: "SF", n: 2 }).unwrap();

        let result = writes
            .update(&field("genre").eq("SF"), &Update::new().inc("n", 10), true)
            .unwrap();
        assert_eq!(result.matched_count(), 1);
        assert_eq!(result.modified_count(), 1);
        let n = state.read_with(|s| s.get(&first).unwrap().get("n").unwrap());
        assert_eq!(n, Value::I64(11));
    }

    #[test]
    fn update_counts_unmodified_matches() {
        let (writes, _) = operations();
        writes.insert(doc! { genre: "SF" }).unwrap();
        writes.insert(doc! { genre: "Drama" }).unwrap();

        let result = writes
            .update(&all(), &Update::new().set("genre", "SF"), false)
            .unwrap();
        assert_eq!(result.matched_count(), 2);
        assert_eq!(result.modified_count(), 1);

        let none = writes
            .update(&field("genre").eq("Poetry"), &Update::new().set("x", 1), false)
            .unwrap();
        assert_eq!(none, UpdateResult::new(0, 0));
    }

    #[test]
    fn failed_update_changes_nothing() {
        let (writes, state) = operations();
        writes.insert(doc! { stock: 1 }).unwrap();
        writes.insert(doc! { stock: "many" }).unwrap();

        let err = writes
            .update(&all(), &Update::new().inc("stock", 1), false)
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::EvaluationError);
        let stocks: Vec<Value> = state.read_with(|s| {
            s.records().values().map(|d| d.get("stock").unwrap()).collect()
        });
        assert_eq!(stocks, vec![Value::I64(1), Value::from("many")]);
    }

    #[test]
    fn delete_one_and_many() {
        let (writes, state) = operations();
        for n in 0..4 {
            writes.insert(doc! { n: n, even: (n % 2 == 0) }).unwrap();
        }
        let one = writes.delete(&field("even").eq(true), true).unwrap();
        assert_eq!(one.deleted_count(), 1);
        let many = writes.delete(&all(), false).unwrap();
        assert_eq!(many.deleted_count(), 3);
        assert_eq!(state.read_with(|s| s.size()), 0);
        assert_eq!(writes.delete(&all(), false).unwrap().deleted_count(), 0);
    }
}
