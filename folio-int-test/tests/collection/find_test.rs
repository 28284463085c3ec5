use folio::collection::{limit_to, order_by, skip_by, Document, FindOptions, Projection};
use folio::common::{SortOrder, Value};
use folio::doc;
use folio::errors::ErrorKind;
use folio::filter::{all, and, field, not, or, Filter};
use folio_int_test::test_util::{cleanup, create_test_context, insert_book_documents, is_sorted, run_test};

fn titles(documents: &[Document]) -> Vec<String> {
    documents
        .iter()
        .map(|d| d.get("title").unwrap().as_string().cloned().unwrap_or_default())
        .collect()
}

#[test]
fn test_find_all() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;
            assert_eq!(coll.find(all())?.size()?, 8);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_filter() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;

            assert_eq!(coll.find(field("published_year").gt(1950))?.size()?, 3);
            assert_eq!(coll.find(field("published_year").gte(1950))?.size()?, 4);
            assert_eq!(coll.find(field("price").lt(9))?.size()?, 3);
            assert_eq!(coll.find(field("price").lte(9))?.size()?, 4);
            assert_eq!(coll.find(field("genre").ne("novel"))?.size()?, 5);
            assert_eq!(
                coll.find(field("genre").in_array(vec!["satire", "science fiction"]))?.size()?,
                2
            );
            assert_eq!(
                coll.find(field("genre").not_in_array(vec!["satire", "science fiction"]))?.size()?,
                6
            );
            assert_eq!(
                coll.find(and(vec![
                    field("author").eq("George Orwell"),
                    field("published_year").gt(1940),
                ]))?
                .size()?,
                2
            );
            assert_eq!(
                coll.find(or(vec![
                    field("author").eq("Aldous Huxley"),
                    field("price").gt(11),
                ]))?
                .size()?,
                3
            );
            assert_eq!(coll.find(not(field("author").eq("George Orwell")))?.size()?, 5);
            assert_eq!(coll.find(field("missing").eq(()))?.size()?, 8);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_parsed_filter() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;

            let filter = Filter::from_document(&doc! {
                author: "George Orwell",
                published_year: { "$gt": 1940 },
            })?;
            let found = coll.find(filter)?.sort("published_year", SortOrder::Ascending).to_vec()?;
            assert_eq!(titles(&found), vec!["Animal Farm", "1984"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_sort() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;

            let found = coll.find_with_options(all(), &order_by("price", SortOrder::Descending))?.to_vec()?;
            let prices: Vec<f64> = found.iter().filter_map(|d| d.get("price").unwrap().as_f64()).collect();
            assert_eq!(prices.len(), 8);
            assert!(is_sorted(prices, false));

            let found = coll
                .find(all())?
                .sort("author", SortOrder::Ascending)
                .sort("published_year", SortOrder::Descending)
                .to_vec()?;
            assert_eq!(
                titles(&found),
                vec![
                    "Island",
                    "Brave New World",
                    "1984",
                    "Animal Farm",
                    "Burmese Days",
                    "Dandelion Wine",
                    "Fahrenheit 451",
                    "The Martian Chronicles",
                ]
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_sort_is_stable() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;

            let found = coll.find(all())?.sort("genre", SortOrder::Ascending).to_vec()?;
            let dystopian: Vec<String> = titles(&found).into_iter().take(3).collect();
            assert_eq!(dystopian, vec!["1984", "Brave New World", "Fahrenheit 451"]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_pagination_partitions_results() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;

            let everything = coll.find(all())?.sort("title", SortOrder::Ascending).to_vec()?;
            let mut paged = Vec::new();
            for page in 0..3 {
                let options = FindOptions::new()
                    .sort_by("title", SortOrder::Ascending)
                    .skip(page * 3)
                    .limit(3);
                paged.extend(coll.find_with_options(all(), &options)?.to_vec()?);
            }
            assert_eq!(titles(&paged), titles(&everything));

            assert_eq!(coll.find_with_options(all(), &skip_by(10))?.size()?, 0);
            assert_eq!(coll.find_with_options(all(), &limit_to(0))?.size()?, 0);
            assert_eq!(coll.find(all())?.skip(6).limit(5).size()?, 2);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_with_projection() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;

            let found = coll
                .find(field("author").eq("George Orwell"))?
                .project(Projection::include(vec!["title", "price"]))?
                .to_vec()?;
            assert_eq!(found.len(), 3);
            for book in &found {
                let keys: Vec<&String> = book.keys().collect();
                assert_eq!(keys, vec!["_id", "title", "price"]);
            }

            let found = coll
                .find(all())?
                .project(Projection::exclude(vec!["genre", "price"]).exclude_id())?
                .first()?
                .expect("a book");
            assert!(!found.has_id());
            assert!(!found.contains_field("genre"));
            assert_eq!(found.get("title")?, Value::from("1984"));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_projection_from_document() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;

            let projection = Projection::from_document(&doc! { title: 1, _id: 0 })?;
            let found = coll.find(field("title").eq("Island"))?.project(projection)?.to_vec()?;
            assert_eq!(found, vec![doc! { title: "Island" }]);

            let err = Projection::from_document(&doc! { title: 1, price: 0 }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ValidationError);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_find_on_nested_fields() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("people")?;
            coll.insert_many(vec![
                doc! { name: "Ann", address: { city: "Oslo", zip: 150 }, tags: ["a", "b"] },
                doc! { name: "Bob", address: { city: "Bergen", zip: 5003 }, tags: ["c"] },
                doc! { name: "Cid" },
            ])?;

            assert_eq!(coll.find(field("address.city").eq("Oslo"))?.size()?, 1);
            assert_eq!(coll.find(field("address.zip").gt(1000))?.size()?, 1);
            assert_eq!(coll.find(field("tags.0").eq("c"))?.size()?, 1);
            assert_eq!(coll.find(field("tags.5").eq("c"))?.size()?, 0);

            let found = coll
                .find(all())?
                .sort("address.zip", SortOrder::Descending)
                .to_vec()?;
            let names: Vec<Value> = found.iter().map(|d| d.get("name").unwrap()).collect();
            assert_eq!(names, vec![Value::from("Bob"), Value::from("Ann"), Value::from("Cid")]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_filter_is_rejected() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;

            let err = Filter::from_document(&doc! { price: { "$near": 3 } }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ValidationError);
            assert!(coll.find(field("").eq(1)).is_err());
            Ok(())
        },
        cleanup,
    )
}
