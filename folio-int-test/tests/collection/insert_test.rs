use folio::collection::DocumentId;
use folio::common::Value;
use folio::doc;
use folio::errors::ErrorKind;
use folio::filter::all;
use folio_int_test::test_util::{cleanup, create_test_context, run_test};

#[test]
fn test_insert_assigns_id() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("test")?;
            let id = coll.insert(doc! { title: "1984", price: 9.99 })?;

            let stored = coll.get_by_id(&id)?.expect("document stored");
            assert_eq!(stored.id(), Some(id));
            assert_eq!(stored.keys().next().map(|k| k.as_str()), Some("_id"));
            assert_eq!(stored.get("title")?, Value::from("1984"));
            assert_eq!(coll.size()?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_many_returns_ids_in_order() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("test")?;
            let result = coll.insert_many(vec![doc! { n: 1 }, doc! { n: 2 }, doc! { n: 3 }])?;
            assert_eq!(result.affected_count(), 3);

            let ids: Vec<DocumentId> = result.ids().to_vec();
            let mut sorted = ids.clone();
            sorted.sort();
            assert_eq!(ids, sorted);

            let scanned: Vec<Value> = coll.find(all())?.to_vec()?.iter().map(|d| d.get("n").unwrap()).collect();
            assert_eq!(scanned, vec![Value::I64(1), Value::I64(2), Value::I64(3)]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_with_supplied_id() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("test")?;
            let id = DocumentId::create_id(500)?;
            let mut document = doc! { title: "Island" };
            document.put("_id", id)?;

            assert_eq!(coll.insert(document)?, id);
            let next = coll.insert(doc! { title: "Dune" })?;
            assert!(next > id);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_duplicate_id_fails() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("test")?;
            let id = coll.insert(doc! { n: 1 })?;
            let mut duplicate = doc! { n: 2 };
            duplicate.put("_id", id)?;

            let err = coll.insert(duplicate).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::UniqueConstraintViolation);
            assert_eq!(coll.size()?, 1);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_invalid_id_type_fails() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("test")?;
            let err = coll.insert(doc! { _id: "abc", n: 1 }).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::InvalidId);
            assert_eq!(coll.size()?, 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_insert_many_is_atomic() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("test")?;
            let result = coll.insert_many(vec![doc! { n: 1 }, doc! { _id: true, n: 2 }]);
            assert!(result.is_err());
            assert_eq!(coll.size()?, 0);
            Ok(())
        },
        cleanup,
    )
}
