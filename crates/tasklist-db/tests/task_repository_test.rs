//! PostgreSQL task repository integration tests.
//!
//! Require a running database (`DATABASE_URL`, see `test_fixtures`). Run with
//! `cargo test -p tasklist-db -- --ignored`.
//!
//! Every test scopes its queries with a unique marker in titles so that rows
//! left by other tests do not affect counts.

use chrono::{Duration, Utc};
use tasklist_db::{
    new_task_id, test_fixtures::connect_test_database, Database, ListTasksRequest, Task,
    TaskInput, TaskRepository, TaskSortField,
};
use uuid::Uuid;

async fn connect() -> Database {
    dotenvy::dotenv().ok();
    connect_test_database()
        .await
        .expect("Failed to connect to test database")
}

fn marker() -> String {
    format!("m{}", Uuid::new_v4().simple())
}

async fn create(db: &Database, input: TaskInput) -> Task {
    let new_task = input
        .into_new_task(new_task_id(), Utc::now())
        .expect("valid input");
    db.tasks.insert(new_task).await.expect("insert task")
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_insert_fetch_round_trip_sorts_tags() {
    let db = connect().await;
    let task = create(
        &db,
        TaskInput::titled(format!("Pay bills {}", marker())).with_tags(["work", "finance", "work"]),
    )
    .await;

    assert_eq!(task.tags, vec!["finance", "work"]);
    assert!(!task.completed);
    assert!(task.updated_at.is_none());

    let fetched = db.tasks.fetch(&task.id).await.expect("fetch");
    assert_eq!(fetched, task);

    db.tasks.delete(&task.id).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_fetch_missing_is_not_found() {
    let db = connect().await;
    let err = db.tasks.fetch("does-not-exist").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_update_replaces_tags_and_bumps_updated_at() {
    let db = connect().await;
    let task = create(
        &db,
        TaskInput::titled(format!("Draft {}", marker())).with_tags(["a", "b"]),
    )
    .await;

    let now = Utc::now();
    let update = TaskInput::titled("Final")
        .with_tags(["c"])
        .with_completed(true)
        .into_update(now)
        .expect("valid update");
    let first = db.tasks.update(&task.id, update.clone()).await.expect("update");
    assert_eq!(first.title, "Final");
    assert!(first.completed);
    assert_eq!(first.tags, vec!["c"]);

    // Same wall-clock instant still advances the timestamp
    let second = db.tasks.update(&task.id, update).await.expect("update again");
    assert!(second.updated_at > first.updated_at);

    db.tasks.delete(&task.id).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_delete_cascades_and_second_delete_is_not_found() {
    let db = connect().await;
    let tag = marker();
    let task = create(&db, TaskInput::titled("Ephemeral").with_tags([tag.clone()])).await;
    assert!(db.tasks.list_tags().await.expect("tags").contains(&tag));

    db.tasks.delete(&task.id).await.expect("delete");
    assert!(!db.tasks.list_tags().await.expect("tags").contains(&tag));
    assert!(db.tasks.delete(&task.id).await.unwrap_err().is_not_found());
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_list_search_counts_and_filters() {
    let db = connect().await;
    let m = marker();
    let now = Utc::now();

    let done = create(
        &db,
        TaskInput::titled(format!("Pay bills {m}")).with_completed(true),
    )
    .await;
    let overdue = create(
        &db,
        TaskInput::titled(format!("Pay rent {m}")).with_due_date(now - Duration::days(1)),
    )
    .await;
    let later = create(
        &db,
        TaskInput::titled(format!("Pay tax {m}")).with_due_date(now + Duration::days(3)),
    )
    .await;

    let mut req = ListTasksRequest::new(now);
    req.search_term = Some(m.to_uppercase());
    let all = db.tasks.list(req.clone()).await.expect("list");
    assert_eq!(all.total_count, 3);
    assert_eq!(all.completed_count, 1);
    assert_eq!(all.returned_count, 3);

    req.overdue = Some(true);
    let only_overdue = db.tasks.list(req.clone()).await.expect("list overdue");
    assert_eq!(only_overdue.tasks.len(), 1);
    assert_eq!(only_overdue.tasks[0].id, overdue.id);
    assert_eq!(only_overdue.total_count, 3);

    req.overdue = Some(false);
    req.completed = Some(false);
    let open_not_overdue = db.tasks.list(req).await.expect("list not overdue");
    assert_eq!(open_not_overdue.tasks.len(), 1);
    assert_eq!(open_not_overdue.tasks[0].id, later.id);

    for id in [&done.id, &overdue.id, &later.id] {
        db.tasks.delete(id).await.expect("cleanup");
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_list_search_matches_tags_and_escapes_wildcards() {
    let db = connect().await;
    let m = marker();
    let tagged = create(
        &db,
        TaskInput::titled("Untitled chore").with_tags([format!("{m}_home")]),
    )
    .await;

    let mut req = ListTasksRequest::new(Utc::now());
    req.search_term = Some(format!("{m}_HOME"));
    let found = db.tasks.list(req.clone()).await.expect("list");
    assert_eq!(found.total_count, 1);
    assert_eq!(found.tasks[0].id, tagged.id);

    // `%` is literal, not a wildcard
    req.search_term = Some(format!("{m}%"));
    let none = db.tasks.list(req).await.expect("list");
    assert_eq!(none.total_count, 0);

    db.tasks.delete(&tagged.id).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_list_due_date_sort_nulls_last_and_pagination() {
    let db = connect().await;
    let m = marker();
    let now = Utc::now();

    let undated = create(&db, TaskInput::titled(format!("c {m}"))).await;
    let soon = create(
        &db,
        TaskInput::titled(format!("a {m}")).with_due_date(now + Duration::days(1)),
    )
    .await;
    let far = create(
        &db,
        TaskInput::titled(format!("b {m}")).with_due_date(now + Duration::days(9)),
    )
    .await;

    let mut req = ListTasksRequest::new(now);
    req.search_term = Some(m.clone());
    req.order_by = TaskSortField::DueDate;
    req.ascending = false;
    let desc: Vec<String> = db
        .tasks
        .list(req.clone())
        .await
        .expect("list")
        .tasks
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(desc, vec![far.id.clone(), soon.id.clone(), undated.id.clone()]);

    req.ascending = true;
    req.skip = 1;
    req.take = 1;
    let page = db.tasks.list(req).await.expect("page");
    assert_eq!(page.returned_count, 1);
    assert_eq!(page.total_count, 3);
    assert_eq!(page.tasks[0].id, far.id);

    for id in [&undated.id, &soon.id, &far.id] {
        db.tasks.delete(id).await.expect("cleanup");
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_ping() {
    let db = connect().await;
    db.tasks.ping().await.expect("ping");
}
