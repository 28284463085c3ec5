use folio::common::{SortOrder, Value};
use folio::explain::ExplainMode;
use folio::filter::{and, field};
use folio::index::non_unique_index;
use folio_int_test::test_util::{cleanup, create_test_context, insert_book_documents, run_test};

#[test]
fn test_explain_scan() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;

            let cursor = coll.find(field("genre").eq("dystopian"))?.limit(2);
            let report = cursor.explain(ExplainMode::ExecutionStats)?;
            assert_eq!(report.path(), "scan");
            assert_eq!(report.returned(), 2);
            assert!(report.documents_examined() <= 8);
            assert_eq!(report.keys_examined(), 0);
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_explain_index_examines_fewer_documents() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;
            let filter = and(vec![
                field("author").eq("George Orwell"),
                field("published_year").gt(1940),
            ]);

            let scan = coll.find(filter.clone())?.explain(ExplainMode::ExecutionStats)?;
            coll.create_index(vec!["author", "published_year"], &non_unique_index())?;
            let index = coll.find(filter)?.explain(ExplainMode::ExecutionStats)?;

            assert_eq!(scan.path(), "scan");
            assert_eq!(scan.documents_examined(), 8);
            assert_eq!(index.path(), "index");
            assert_eq!(index.documents_examined(), 2);
            assert!(index.keys_examined() >= 2);
            assert_eq!(index.returned(), scan.returned());
            Ok(())
        },
        cleanup,
    )
}

#[test]
fn test_explain_query_planner_reports_plan_only() {
    run_test(
        create_test_context,
        |ctx| {
            let coll = ctx.db().collection("books")?;
            insert_book_documents(&coll)?;
            coll.create_index(vec!["published_year"], &non_unique_index())?;

            let cursor = coll
                .find(field("published_year").lt(1950))?
                .sort("published_year", SortOrder::Ascending);
            let report = cursor.explain(ExplainMode::QueryPlanner)?;
            assert_eq!(report.mode(), ExplainMode::QueryPlanner);
            assert_eq!(report.path(), "index");
            assert!(!report.blocking_sort());
            assert_eq!(report.returned(), 0);

            let blocking = coll
                .find(field("published_year").lt(1950))?
                .sort("price", SortOrder::Ascending)
                .explain(ExplainMode::QueryPlanner)?;
            assert!(blocking.blocking_sort());

            let document = report.to_document();
            assert_eq!(document.get("path")?, Value::from("index"));
            assert_eq!(
                document.get("indexName")?,
                Value::from(report.index_name().map(|n| n.to_string()))
            );
            Ok(())
        },
        cleanup,
    )
}
