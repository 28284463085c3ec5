use folio::collection::{Document, DocumentId, ScanPath};
use folio::common::{SortOrder, Value};
use folio::doc;
use folio::errors::ErrorKind;
use folio::filter::{and, field, Filter};
use folio::index::{non_unique_index, unique_index, IndexOptions};
use folio_int_test::test_util::{cleanup, create_random_books, create_test_context, insert_book_documents, run_test};

fn ids(documents: &[Document]) -> Vec<DocumentId> {
    documents.iter().filter_map(|d| d.id()).collect()
}

#[test]
fn test_index_and_scan_return_same_documents() {
    run_test(
        create_test_context,
        |ctx| {
            let db = ctx.db();
            let indexed = db.collection("indexed")?;
            let plain = db.collection("plain")?;
            let books = create_random_books(300);
            indexed.insert_many(books.clone())?;
            plain.insert_many(books)?;
            indexed.create_index(vec!["author", "published_year"], &non_unique_index())?;
            indexed.create_index(vec!["price"], &non_unique_index())?;

            let sample = plain.find(field("published_year").gt(1900))?.first()?.expect("a book");
            let author = sample.get("author")?;
            let filters = vec![
                and(vec![field("author").eq(author.clone()), field("published_year").gt(1940)]),
                field("author").eq(author.clone()),
                field("price").between(10.0, 20.0),
                and(vec![field("price").lt(15), field("genre").eq("novel")]),
            ];

            for filter in filters {
                let with_index = indexed.find(filter.clone())?;
                assert_eq!(with_index.find_plan()?.path(), ScanPath::Index, "{}", filter);
                let without_index = plain.find(filter.clone())?;
                assert_eq!(without_index.find_plan()?.path(), ScanPath::Scan);

                let strip = |docs: Vec<Document>| -> Vec<Document> {
                    docs.into_iter()
                        .map(|mut d| {
                            d.remove("_id").expect("removable");
                            d
                        })
                        .collect()
                };
                assert_eq!(strip(with_index.to_vec()?), strip(without_index.to_vec()?), "{}", filter);

                let sorted_index = with_index.sort("price", SortOrder::Descending).to_vec()?;
                let sorted_scan = without_index.sort("price", SortOrder::Descending).to_vec()?;
                assert_eq!(strip(sorted_index), strip(sorted_scan), "{}", filter);
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_planner_prefers_covering_index() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;
            coll.create_index(vec!["author"], &non_unique_index())?;
            coll.create_index(vec!["author", "published_year"], &non_unique_index())?;

            let cursor = coll.find(and(vec![
                field("author").eq("George Orwell"),
                field("published_year").gt(1940),
            ]))?;
            let plan = cursor.find_plan()?;
            let descriptor = plan.index_descriptor().expect("index plan");
            assert_eq!(descriptor.index_fields().field_names(), vec!["author", "published_year"]);
            assert!(plan.full_scan_filter().is_all());
            assert_eq!(cursor.size()?, 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_index_provides_sort_order() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;
            coll.create_index(vec!["published_year"], &non_unique_index())?;

            let cursor = coll.find(field("published_year").gte(1945))?.sort("published_year", SortOrder::Descending);
            let plan = cursor.find_plan()?;
            assert!(plan.is_index_sorted());
            assert!(plan.is_reverse_scan());
            assert!(plan.blocking_sort_order().is_none());

            let years: Vec<Value> = cursor.to_vec()?.iter().map(|d| d.get("published_year").unwrap()).collect();
            assert_eq!(
                years,
                vec![1962, 1957, 1953, 1950, 1949, 1945].into_iter().map(Value::from).collect::<Vec<_>>()
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unique_index_rejects_duplicates() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;
            coll.create_index(vec!["title"], &unique_index())?;

            let err = coll.insert(doc! { title: "1984", author: "Someone" }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UniqueConstraintViolation);
            assert_eq!(coll.size()?, 8);

            let err = coll.create_index(vec!["author"], &unique_index()).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UniqueConstraintViolation);
            assert!(!coll.has_index(vec!["author"])?);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_index_catalog() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;

            let first = coll.create_index(vec!["author"], &non_unique_index())?;
            let again = coll.create_index(vec!["author"], &non_unique_index())?;
            assert_eq!(first, again);
            coll.create_index(vec!["genre", "price"], &IndexOptions::default())?;

            let listed = coll.list_indexes()?;
            assert_eq!(listed.len(), 2);
            assert!(coll.has_index(vec!["genre", "price"])?);
            assert!(!coll.has_index(vec!["price"])?);

            coll.drop_index(vec!["author"])?;
            assert!(!coll.has_index(vec!["author"])?);
            let err = coll.drop_index(vec!["author"]).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::IndexNotFound);

            let plan = coll.find(field("author").eq("George Orwell"))?.find_plan()?;
            assert_eq!(plan.path(), ScanPath::Scan);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_lookup_by_index_prefix() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;
            coll.create_index(vec!["author", "published_year"], &non_unique_index())?;

            let expected = ids(&coll.find(field("author").eq("Ray Bradbury"))?.to_vec()?);
            let found = coll.lookup(&["author"], &field("author").eq("Ray Bradbury"))?;
            assert_eq!(found, Some(expected));

            let filter = and(vec![field("author").eq("Ray Bradbury"), field("published_year").lt(1955)]);
            let found = coll.lookup(&["author", "published_year"], &filter)?.expect("bounded");
            assert_eq!(found.len(), 2);

            assert_eq!(coll.lookup(&["genre"], &field("genre").eq("novel"))?, None);
            assert_eq!(coll.lookup(&["author"], &Filter::default())?, None);
            Ok(())
        },
        cleanup,
    )
}
