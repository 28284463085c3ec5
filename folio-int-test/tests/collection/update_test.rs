use folio::collection::Update;
use folio::common::Value;
use folio::doc;
use folio::errors::ErrorKind;
use folio::filter::{all, field};
use folio::index::non_unique_index;
use folio_int_test::test_util::{cleanup, create_test_context, insert_book_documents, run_test};

#[test]
fn test_update_many_sets_fields() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;

            let result = coll.update_many(
                field("author").eq("George Orwell"),
                &Update::new().set("in_print", true),
            )?;
            assert_eq!(result.matched_count(), 3);
            assert_eq!(result.modified_count(), 3);
            assert_eq!(coll.find(field("in_print").eq(true))?.size()?, 3);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_one_touches_first_match() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;

            let result = coll.update_one(field("genre").eq("dystopian"), &Update::new().inc("price", 1))?;
            assert_eq!(result.matched_count(), 1);
            let first = coll.find(field("title").eq("1984"))?.first()?.expect("1984");
            assert_eq!(first.get("price")?.as_f64(), Some(10.99));
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_without_change_is_not_modified() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;

            let result = coll.update_many(
                field("title").eq("Island"),
                &Update::new().set("published_year", 1962),
            )?;
            assert_eq!(result.matched_count(), 1);
            assert_eq!(result.modified_count(), 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_keeps_index_in_step() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;
            coll.create_index(vec!["author"], &non_unique_index())?;

            coll.update_many(
                field("author").eq("Ray Bradbury"),
                &Update::new().set("author", "R. Bradbury"),
            )?;
            assert_eq!(coll.find(field("author").eq("Ray Bradbury"))?.size()?, 0);
            assert_eq!(coll.find(field("author").eq("R. Bradbury"))?.size()?, 3);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_unset_removes_field() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;

            coll.update_many(all(), &Update::new().unset("genre"))?;
            for book in coll.find(all())? {
                assert!(!book?.contains_field("genre"));
            }
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_failed_update_changes_nothing() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("test")?;
            coll.insert_many(vec![doc! { n: 1 }, doc! { n: "one" }])?;

            let err = coll.update_many(all(), &Update::new().inc("n", 1)).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::EvaluationError);
            let values: Vec<Value> = coll.find(all())?.to_vec()?.iter().map(|d| d.get("n").unwrap()).collect();
            assert_eq!(values, vec![Value::I64(1), Value::from("one")]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_update_of_id_is_rejected() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("test")?;
            coll.insert(doc! { n: 1 })?;
            let err = coll.update_many(all(), &Update::new().set("_id", 5)).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ValidationError);
            Ok(())
        },
        cleanup,
    )
}
