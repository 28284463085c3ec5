use crate::collection::operation::collection_state::CollectionState;
use crate::collection::operation::find_optimizer::{scan_bounds, FindOptimizer};
use crate::collection::DocumentId;
use crate::common::{Atomic, ReadExecutor, SortableFields, WriteExecutor, NON_UNIQUE_INDEX, UNIQUE_INDEX};
use crate::errors::{ErrorKind, FolioError, FolioResult};
use crate::filter::Filter;
use crate::index::{IndexDescriptor, IndexOptions};

/// Creates, lists and drops the indexes of one collection and answers
/// direct index lookups.
#[derive(Clone)]
pub(crate) struct IndexManager {
    state: Atomic<CollectionState>,
    find_optimizer: FindOptimizer,
}

impl IndexManager {
    pub fn new(state: Atomic<CollectionState>, find_optimizer: FindOptimizer) -> Self {
        IndexManager {
            state,
            find_optimizer,
        }
    }

    /// Creates an index and fills it from the stored documents. Creating an
    /// index on an already indexed field sequence returns the existing one.
    pub fn create_index(&self, fields: SortableFields, options: &IndexOptions) -> FolioResult<IndexDescriptor> {
        fields.validate()?;
        let index_type = options.index_type();
        if index_type != UNIQUE_INDEX && index_type != NON_UNIQUE_INDEX {
            log::error!("Unsupported index type {}", index_type);
            return Err(FolioError::new(
                &format!("Unsupported index type '{}'", index_type),
                ErrorKind::IndexingError,
            ));
        }

        self.state.write_with(|state| {
            state.ensure_open()?;

            if let Some(existing) = state
                .indexes()
                .iter()
                .map(|i| i.descriptor())
                .find(|d| d.index_fields() == &fields)
            {
                if existing.index_type() != index_type {
                    log::warn!(
                        "Index {} already exists as {}, ignoring requested type {}",
                        existing.name(),
                        existing.index_type(),
                        index_type
                    );
                }
                return Ok(existing.clone());
            }

            let descriptor = IndexDescriptor::new(index_type, fields, state.name());
            let mut next = state.clone();
            if let Err(e) = next.add_index(descriptor.clone()) {
                log::error!("Failed to build index {}: {}", descriptor.name(), e);
                return Err(FolioError::new_with_cause(
                    &format!("Cannot create index {}", descriptor.name()),
                    e.kind().clone(),
                    e,
                ));
            }
            *state = next;
            self.find_optimizer.invalidate_cache();
            log::info!("Created index {}", descriptor);
            Ok(descriptor)
        })
    }

    /// Index definitions in creation order.
    pub fn list_indexes(&self) -> FolioResult<Vec<IndexDescriptor>> {
        self.state.read_with(|state| {
            state.ensure_open()?;
            Ok(state.index_descriptors())
        })
    }

    pub fn has_index(&self, fields: &SortableFields) -> FolioResult<bool> {
        self.state.read_with(|state| {
            state.ensure_open()?;
            Ok(state
                .indexes()
                .iter()
                .any(|i| i.descriptor().index_fields() == fields))
        })
    }

    pub fn drop_index(&self, fields: &SortableFields) -> FolioResult<()> {
        self.state.write_with(|state| {
            state.ensure_open()?;
            match state.remove_index(&fields.encoded_name()) {
                Some(descriptor) => {
                    self.find_optimizer.invalidate_cache();
                    log::info!("Dropped index {}", descriptor);
                    Ok(())
                }
                None => {
                    log::error!("No index on {} in {}", fields, state.name());
                    Err(FolioError::new(
                        &format!("No index on {} in collection {}", fields, state.name()),
                        ErrorKind::IndexNotFound,
                    ))
                }
            }
        })
    }

    /// Ids of the documents matching `filter`, served by an index whose
    /// fields start with `field_sequence`, in collection order. `None` when
    /// no such index exists or the filter does not bound its leading field.
    pub fn lookup(&self, field_sequence: &[&str], filter: &Filter) -> FolioResult<Option<Vec<DocumentId>>> {
        filter.validate()?;
        let snapshot = self.state.read_with(|state| {
            state.ensure_open()?;
            Ok::<_, FolioError>(state.clone())
        })?;

        let index = snapshot.indexes().iter().find(|i| {
            let names = i.descriptor().index_fields().field_names();
            !field_sequence.is_empty()
                && names.len() >= field_sequence.len()
                && names.iter().zip(field_sequence).all(|(a, b)| a == b)
        });
        let index = match index {
            Some(index) => index,
            None => return Ok(None),
        };

        let conjuncts = filter.conjuncts();
        let (bounds, consumed) = scan_bounds(index.descriptor().index_fields(), &conjuncts);
        if bounds.is_unbounded() {
            return Ok(None);
        }
        let residual = Filter::from_conjuncts(
            conjuncts
                .iter()
                .enumerate()
                .filter(|(i, _)| !consumed.contains(i))
                .map(|(_, f)| (*f).clone())
                .collect(),
        );

        let mut ids = index.scan(&bounds, false).ids;
        ids.sort();
        let mut matched = Vec::with_capacity(ids.len());
        for id in ids {
            let document = snapshot.get(&id).ok_or_else(|| {
                log::error!("Index {} refers to missing document {}", index.descriptor().name(), id);
                FolioError::new(
                    &format!("Index entry without document {}", id),
                    ErrorKind::InternalError,
                )
            })?;
            if residual.apply(document)? {
                matched.push(id);
            }
        }
        Ok(Some(matched))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{atomic, SortOrder};
    use crate::doc;
    use crate::filter::{and, field};
    use crate::index::{non_unique_index, unique_index};

    fn manager_with_books() -> IndexManager {
        let mut state = CollectionState::new("books");
        let books = vec![
            doc! { author: "George Orwell", published_year: 1949, isbn: "a" },
            doc! { author: "George Orwell", published_year: 1945, isbn: "b" },
            doc! { author: "Aldous Huxley", published_year: 1932, isbn: "c" },
            doc! { author: "George Orwell", published_year: 1938, isbn: "d" },
        ];
        for (i, book) in books.into_iter().enumerate() {
            state.insert_document(DocumentId::new(i as u64 + 1), book).unwrap();
        }
        IndexManager::new(atomic(state), FindOptimizer::new(10))
    }

    #[test]
    fn create_index_is_idempotent() {
        let manager = manager_with_books();
        let fields = SortableFields::with_names(vec!["author", "published_year"]);
        let first = manager.create_index(fields.clone(), &non_unique_index()).unwrap();
        let second = manager.create_index(fields.clone(), &non_unique_index()).unwrap();

        assert_eq!(first, second);
        assert_eq!(manager.list_indexes().unwrap().len(), 1);
        assert!(manager.has_index(&fields).unwrap());
    }

    #[test]
    fn unique_index_over_duplicates_fails_and_leaves_nothing() {
        let manager = manager_with_books();
        let err = manager
            .create_index(SortableFields::with_names(vec!["author"]), &unique_index())
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::UniqueConstraintViolation);
        assert!(manager.list_indexes().unwrap().is_empty());
    }

    #[test]
    fn unknown_index_type_is_rejected() {
        let manager = manager_with_books();
        let err = manager
            .create_index(SortableFields::with_names(vec!["author"]), &IndexOptions::new("spatial"))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::IndexingError);
    }

    #[test]
    fn drop_index_removes_it() {
        let manager = manager_with_books();
        let fields = SortableFields::from(vec![("published_year", SortOrder::Descending)]);
        manager.create_index(fields.clone(), &non_unique_index()).unwrap();
        manager.drop_index(&fields).unwrap();
        assert!(!manager.has_index(&fields).unwrap());
        assert_eq!(manager.drop_index(&fields).unwrap_err().kind(), &ErrorKind::IndexNotFound);
    }

    #[test]
    fn lookup_follows_prefix_rule() {
        let manager = manager_with_books();
        manager
            .create_index(
                SortableFields::with_names(vec!["author", "published_year"]),
                &non_unique_index(),
            )
            .unwrap();
        let filter = and(vec![
            field("author").eq("George Orwell"),
            field("published_year").gt(1940),
        ]);

        let ids = manager.lookup(&["author"], &filter).unwrap().unwrap();
        assert_eq!(ids, vec![DocumentId::new(1), DocumentId::new(2)]);
        let ids = manager
            .lookup(&["author", "published_year"], &filter)
            .unwrap()
            .unwrap();
        assert_eq!(ids.len(), 2);

        assert!(manager.lookup(&["published_year"], &filter).unwrap().is_none());
        assert!(manager
            .lookup(&["author"], &field("published_year").gt(1940))
            .unwrap()
            .is_none());
    }

    #[test]
    fn lookup_applies_remaining_predicates() {
        let manager = manager_with_books();
        manager
            .create_index(SortableFields::with_names(vec!["author"]), &non_unique_index())
            .unwrap();
        let filter = and(vec![field("author").eq("George Orwell"), field("isbn").ne("a")]);
        let ids = manager.lookup(&["author"], &filter).unwrap().unwrap();
        assert_eq!(ids, vec![DocumentId::new(2), DocumentId::new(4)]);
    }
}
