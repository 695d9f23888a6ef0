//! TaskClient tests against a wiremock server.

use serde_json::json;
use tasklist_client::{Error, TaskClient, TaskInput, TaskQuery, TaskSortField};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn task_json(id: &str, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "completed": false,
        "dueDate": null,
        "tags": [],
        "createdAt": "2026-10-15T08:00:00Z",
        "updatedAt": null
    })
}

#[tokio::test]
async fn test_list_tasks_sends_paging_and_filters() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tasks"))
        .and(query_param("skip", "20"))
        .and(query_param("take", "10"))
        .and(query_param("searchTerm", "bills"))
        .and(query_param("orderBy", "dueDate"))
        .and(query_param("ascending", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tasks": [task_json("t1", "Pay bills")],
            "totalCount": 21,
            "completedCount": 0,
            "returnedCount": 1
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = TaskClient::new(mock_server.uri()).unwrap();
    let query = TaskQuery::new()
        .search("bills")
        .order_by(TaskSortField::DueDate, true)
        .page_size(10);

    let page = client.list_tasks(&query, 2).await.unwrap();
    assert_eq!(page.total_count, 21);
    assert_eq!(page.returned_count, 1);
    assert_eq!(page.tasks[0].title, "Pay bills");
}

#[tokio::test]
async fn test_create_posts_camel_case_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/tasks"))
        .and(body_json(json!({
            "title": "Pay bills",
            "completed": true,
            "dueDate": null,
            "tags": ["finance"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(task_json("t1", "Pay bills")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = TaskClient::new(mock_server.uri()).unwrap();
    let input = TaskInput::titled("Pay bills")
        .with_tags(["finance"])
        .with_completed(true);

    let task = client.create_task(&input).await.unwrap();
    assert_eq!(task.id, "t1");
}

#[tokio::test]
async fn test_404_maps_to_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/tasks/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = TaskClient::new(mock_server.uri()).unwrap();
    let err = client.delete_task("missing").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_400_carries_server_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/tasks/t1"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": "Title must be 1-140 characters long."})),
        )
        .mount(&mock_server)
        .await;

    let client = TaskClient::new(mock_server.uri()).unwrap();
    let err = client
        .update_task("t1", &TaskInput::titled(""))
        .await
        .unwrap_err();
    match err {
        Error::InvalidInput(msg) => assert_eq!(msg, "Title must be 1-140 characters long."),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_500_maps_to_request_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/tags"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": "Internal server error"})),
        )
        .mount(&mock_server)
        .await;

    let client = TaskClient::new(mock_server.uri()).unwrap();
    let err = client.list_tags().await.unwrap_err();
    match err {
        Error::Request(msg) => assert!(msg.contains("500")),
        other => panic!("unexpected error: {:?}", other),
    }
}
