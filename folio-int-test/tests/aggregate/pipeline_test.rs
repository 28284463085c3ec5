use folio::aggregate::{
    avg, field_ref, literal, max, modulo, multiply, push, subtract, sum, Accumulator, Group, Pipeline,
};
use folio::collection::{Document, Projection};
use folio::common::{SortOrder, SortableFields, Value};
use folio::doc;
use folio::errors::ErrorKind;
use folio::filter::field;
use folio::index::non_unique_index;
use folio_int_test::test_util::{
    cleanup, create_optimizing_test_context, create_test_context, insert_book_documents, run_test,
};

fn decade() -> folio::aggregate::Expression {
    subtract(
        field_ref("published_year"),
        modulo(field_ref("published_year"), literal(10)),
    )
}

#[test]
fn test_group_by_decade() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;

            let pipeline = Pipeline::new()
                .add_fields(vec![("decade", decade())])
                .group(Group::by(field_ref("decade")).accumulate("count", sum(literal(1))))
                .sort(SortableFields::from(vec![("_id", SortOrder::Ascending)]));
            let result = coll.aggregate(pipeline)?.to_vec()?;

            assert_eq!(
                result,
                vec![
                    doc! { _id: 1930, count: 2 },
                    doc! { _id: 1940, count: 2 },
                    doc! { _id: 1950, count: 3 },
                    doc! { _id: 1960, count: 1 },
                ]
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_average_price_by_genre() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;

            let pipeline = Pipeline::from_documents(&[
                doc! { "$group": { _id: "$genre", average: { "$avg": "$price" }, titles: { "$push": "$title" } } },
                doc! { "$sort": { _id: 1 } },
            ])?;
            let result = coll.aggregate(pipeline)?.to_vec()?;
            assert_eq!(result.len(), 4);

            let dystopian = &result[0];
            assert_eq!(dystopian.get("_id")?, Value::from("dystopian"));
            let average = dystopian.get("average")?.as_f64().expect("numeric average");
            assert!((average - (9.99 + 8.25 + 10.5) / 3.0).abs() < 1e-9);
            assert_eq!(
                dystopian.get("titles")?,
                Value::from(vec!["1984", "Brave New World", "Fahrenheit 451"])
            );
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_top_author_by_revenue() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;

            let pipeline = Pipeline::new()
                .match_filter(field("published_year").lt(1960))
                .add_fields(vec![("revenue", multiply(vec![field_ref("price"), literal(100)]))])
                .group(
                    Group::by(field_ref("author"))
                        .accumulate("revenue", sum(field_ref("revenue")))
                        .accumulate("latest", max(field_ref("published_year"))),
                )
                .sort(SortableFields::from(vec![("revenue", SortOrder::Descending)]))
                .limit(1)
                .project(Projection::include(vec!["latest"]));
            let top = coll.aggregate(pipeline)?.first()?.expect("an author");
            assert_eq!(top, doc! { _id: "George Orwell", latest: 1949 });
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_leading_match_uses_index() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;
            coll.create_index(vec!["author"], &non_unique_index())?;

            let pipeline = Pipeline::new()
                .match_filter(field("author").eq("Ray Bradbury"))
                .group(Group::by(literal(())).accumulate("total", sum(field_ref("price"))));
            let result = coll.aggregate(pipeline)?.to_vec()?;
            assert_eq!(result.len(), 1);
            let total = result[0].get("total")?.as_f64().expect("numeric total");
            assert!((total - 26.25).abs() < 1e-9);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_missing_group_key_goes_to_null_bucket() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("test")?;
            coll.insert_many(vec![doc! { k: "a", n: 1 }, doc! { n: 2 }, doc! { k: (), n: 3 }])?;

            let pipeline = Pipeline::new().group(Group::by(field_ref("k")).accumulate("n", sum(field_ref("n"))));
            let result = coll.aggregate(pipeline)?.to_vec()?;
            assert_eq!(result, vec![doc! { _id: "a", n: 1 }, doc! { _id: (), n: 5 }]);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_pipeline_error_yields_no_partial_results() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("test")?;
            coll.insert_many(vec![doc! { n: 1 }, doc! { n: 2 }, doc! { name: "x" }])?;

            let pipeline = Pipeline::new().add_fields(vec![("double", multiply(vec![field_ref("n"), literal(2)]))]);
            let cursor = coll.aggregate(pipeline)?;
            let items: Vec<_> = cursor.iter().collect();
            assert_eq!(items.len(), 1);
            let err = items.into_iter().next().expect("an item").unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::EvaluationError);
            assert!(cursor.to_vec().is_err());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_invalid_pipeline_is_rejected() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("test")?;
            let err = Pipeline::from_documents(&[doc! { "$unwind": "$tags" }]).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::ValidationError);

            let bad = Pipeline::new().group(Group::by(field_ref("k")).accumulate("", push(field_ref("n"))));
            assert!(coll.aggregate(bad).is_err());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_optimized_pipeline_matches_plain_pipeline() {
    let pipeline = || {
        Pipeline::new()
            .add_fields(vec![("decade", decade())])
            .match_filter(field("author").eq("Ray Bradbury"))
            .group(Group::by(field_ref("decade")).accumulate("titles", push(field_ref("title"))))
            .sort(SortableFields::from(vec![("_id", SortOrder::Ascending)]))
    };

    let mut results: Vec<Vec<Document>> = Vec::new();
    for create in [create_test_context, create_optimizing_test_context] {
        let ctx = create().expect("context");
        let coll = ctx.db().collection("books").expect("collection");
        insert_book_documents(&coll).expect("books");
        results.push(coll.aggregate(pipeline()).expect("pipeline").to_vec().expect("results"));
        cleanup(ctx).expect("cleanup");
    }
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0].len(), 1);
    assert_eq!(
        results[0][0].get("titles").expect("titles"),
        Value::from(vec!["Fahrenheit 451", "The Martian Chronicles", "Dandelion Wine"])
    );
}

#[test]
fn test_optimized_pipeline_keeps_evaluation_errors() {
    let pipeline = || {
        Pipeline::new()
            .add_fields(vec![("decade", decade())])
            .match_filter(field("genre").eq("SF"))
            .group(Group::by(field_ref("decade")).accumulate("n", sum(literal(1))))
    };

    for create in [create_test_context, create_optimizing_test_context] {
        let ctx = create().expect("context");
        let coll = ctx.db().collection("books").expect("collection");
        // the second document has no year and is dropped by the $match
        coll.insert_many(vec![
            doc! { genre: "SF", published_year: 1955 },
            doc! { genre: "Poetry" },
        ])
        .expect("insert");

        let err = coll
            .aggregate(pipeline())
            .expect("pipeline")
            .to_vec()
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::EvaluationError);
        cleanup(ctx).expect("cleanup");
    }
}

#[test]
fn test_optimized_constant_add_fields_matches_plain_pipeline() {
    let pipeline = || {
        Pipeline::new()
            .add_fields(vec![("source", literal("catalog"))])
            .match_filter(field("genre").eq("dystopian"))
            .project(Projection::include(vec!["title", "source"]).exclude_id())
            .sort(SortableFields::from(vec![("title", SortOrder::Ascending)]))
    };

    let mut results: Vec<Vec<Document>> = Vec::new();
    for create in [create_test_context, create_optimizing_test_context] {
        let ctx = create().expect("context");
        let coll = ctx.db().collection("books").expect("collection");
        insert_book_documents(&coll).expect("books");
        results.push(coll.aggregate(pipeline()).expect("pipeline").to_vec().expect("results"));
        cleanup(ctx).expect("cleanup");
    }
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0].len(), 3);
    assert_eq!(results[0][0], doc! { title: "1984", source: "catalog" });
}

#[test]
fn test_accumulator_from_value() {
    let accumulator = Accumulator::from_value(&Value::Document(doc! { "$avg": "$price" })).expect("valid");
    assert_eq!(accumulator.expression(), &field_ref("price"));
    assert!(Accumulator::from_value(&Value::from("$price")).is_err());
}

#[test]
fn test_average_and_count_per_group() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("prices")?;
            coll.insert_many(vec![
                doc! { genre: "A", price: 10 },
                doc! { genre: "A", price: 20 },
                doc! { genre: "B", price: 30 },
            ])?;

            let pipeline = Pipeline::new().group(
                Group::by(field_ref("genre"))
                    .accumulate("average", avg(field_ref("price")))
                    .accumulate("count", sum(literal(1))),
            );
            let result = coll.aggregate(pipeline)?.to_vec()?;
            assert_eq!(
                result,
                vec![
                    doc! { _id: "A", average: 15.0, count: 2 },
                    doc! { _id: "B", average: 30.0, count: 1 },
                ]
            );
            Ok(())
        },
        cleanup,
    )
}
