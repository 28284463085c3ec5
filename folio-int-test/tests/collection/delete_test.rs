use folio::filter::{all, field};
use folio::index::non_unique_index;
use folio_int_test::test_util::{cleanup, create_test_context, insert_book_documents, run_test};

#[test]
fn test_delete_one() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;

            let result = coll.delete_one(field("author").eq("George Orwell"))?;
            assert_eq!(result.deleted_count(), 1);
            assert_eq!(coll.find(field("author").eq("George Orwell"))?.size()?, 2);
            assert!(coll.find(field("title").eq("1984"))?.first()?.is_none());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_many_with_index() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;
            coll.create_index(vec!["genre"], &non_unique_index())?;

            let result = coll.delete_many(field("genre").eq("dystopian"))?;
            assert_eq!(result.deleted_count(), 3);
            assert_eq!(coll.size()?, 5);
            assert_eq!(coll.find(field("genre").eq("dystopian"))?.size()?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_delete_without_match() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;

            assert_eq!(coll.delete_many(field("author").eq("Nobody"))?.deleted_count(), 0);
            assert_eq!(coll.delete_many(all())?.deleted_count(), 8);
            assert_eq!(coll.size()?, 0);
            Ok(())
        },
        cleanup,
    )
}
