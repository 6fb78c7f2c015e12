//! HTTP-level integration tests for the `/api/todos` resource.

mod common;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use common::{body_json, build_test_app, TestApp};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const BOUNDARY: &str = "taskhub-test-boundary";

/// A multipart body with one file part.
fn multipart_body(field: &str, file_name: &str, content: &str) -> String {
    format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         {content}\r\n\
         --{BOUNDARY}--\r\n"
    )
}

async fn upload(app: &TestApp, todo_id: i64, token: &str, body: String) -> axum::http::Response<Body> {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/todos/{todo_id}/attachments"))
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap();
    app.send(request).await
}

/// One user with one project.
async fn setup() -> (TestApp, String, i64, i64) {
    let app = build_test_app();
    let (token, user_id) = app.register("owner").await;
    let project = app.create_project(&token, "Apollo").await;
    (app, token, user_id, project)
}

// ---------------------------------------------------------------------------
// Create / read
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_sets_defaults_and_ignores_client_created_by() {
    let (app, token, user_id, project) = setup().await;

    let todo = app
        .create_todo(&token, project, json!({ "title": "  Write docs ", "createdBy": 999 }))
        .await;

    assert_eq!(todo["title"], "Write docs");
    assert_eq!(todo["status"], "pending");
    assert_eq!(todo["priority"], "medium");
    assert_eq!(todo["createdBy"], user_id);
    assert_eq!(todo["project"], project);
    assert!(todo["completedAt"].is_null());
    assert_eq!(todo["attachments"], json!([]));
}

#[tokio::test]
async fn create_without_title_is_400() {
    let (app, token, _, project) = setup().await;

    let response = app
        .post("/api/todos", json!({ "title": "", "project": project }), &token)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["message"], "Validation failed");
    assert_eq!(json["errors"][0]["field"], "title");
}

#[tokio::test]
async fn create_in_missing_or_foreign_project_fails() {
    let (app, _, _, project) = setup().await;
    let (stranger, _) = app.register("stranger").await;

    let response = app
        .post("/api/todos", json!({ "title": "x", "project": 4242 }), &stranger)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Project not found");

    let response = app
        .post("/api/todos", json!({ "title": "x", "project": project }), &stranger)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn only_the_creator_can_read_or_mutate_a_todo() {
    let (app, owner, _, project) = setup().await;
    let (member, member_id) = app.register("member").await;
    let response = app
        .post(
            &format!("/api/projects/{project}/members"),
            json!({ "userId": member_id }),
            &owner,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // The member creates a todo in the owner's project.
    let todo = app.create_todo(&member, project, json!({ "title": "Mine" })).await;
    let uri = format!("/api/todos/{}", todo["id"]);

    // Owning the project grants nothing on the todo.
    assert_eq!(app.get(&uri, &owner).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        app.put(&uri, json!({ "title": "Hijacked" }), &owner).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(app.delete(&uri, &owner).await.status(), StatusCode::UNAUTHORIZED);

    let response = app.get(&uri, &member).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["title"], "Mine");
}

#[tokio::test]
async fn unknown_and_malformed_ids() {
    let (app, token, _, _) = setup().await;

    let response = app.get("/api/todos/999", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Todo not found");

    let response = app.get("/api/todos/abc", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn assignee_must_be_a_registered_user() {
    let (app, token, _, project) = setup().await;
    let (_, helper_id) = app.register("helper").await;

    let response = app
        .post("/api/todos", json!({ "title": "x", "project": project, "assignedTo": 9999 }), &token)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "User not found");
    let listing = body_json(app.get("/api/todos", &token).await).await;
    assert_eq!(listing["count"], 0);

    let todo = app
        .create_todo(&token, project, json!({ "title": "x", "assignedTo": helper_id }))
        .await;
    assert_eq!(todo["assignedTo"], helper_id);

    let uri = format!("/api/todos/{}", todo["id"]);
    let response = app.put(&uri, json!({ "title": "x", "assignedTo": 9999 }), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let stored = body_json(app.get(&uri, &token).await).await;
    assert_eq!(stored["data"]["assignedTo"], helper_id);
}

// ---------------------------------------------------------------------------
// Update / status / priority
// ---------------------------------------------------------------------------

#[tokio::test]
async fn put_merges_fields_and_keeps_creator() {
    let (app, token, user_id, project) = setup().await;
    let todo = app
        .create_todo(
            &token,
            project,
            json!({ "title": "Draft", "description": "keep me", "tags": ["a"] }),
        )
        .await;
    let uri = format!("/api/todos/{}", todo["id"]);

    let response = app
        .put(&uri, json!({ "title": "Final", "priority": "high", "createdBy": 77 }), &token)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let data = body_json(response).await["data"].clone();
    assert_eq!(data["title"], "Final");
    assert_eq!(data["priority"], "high");
    assert_eq!(data["description"], "keep me");
    assert_eq!(data["tags"], json!(["a"]));
    assert_eq!(data["createdBy"], user_id);
}

#[tokio::test]
async fn completed_at_is_stamped_and_survives_leaving_completed() {
    let (app, token, _, project) = setup().await;
    let todo = app.create_todo(&token, project, json!({ "title": "Ship" })).await;
    let uri = format!("/api/todos/{}/status", todo["id"]);

    let response = app.patch(&uri, json!({ "status": "completed" }), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let completed = body_json(response).await["data"].clone();
    assert_eq!(completed["status"], "completed");
    let stamp = completed["completedAt"].clone();
    assert!(stamp.is_string());

    let response = app.patch(&uri, json!({ "status": "in-progress" }), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let reopened = body_json(response).await["data"].clone();
    assert_eq!(reopened["status"], "in-progress");
    assert_eq!(reopened["completedAt"], stamp);

    // Still there on a fresh read.
    let response = app.get(&format!("/api/todos/{}", todo["id"]), &token).await;
    assert_eq!(body_json(response).await["data"]["completedAt"], stamp);
}

#[tokio::test]
async fn invalid_status_and_priority_are_400() {
    let (app, token, _, project) = setup().await;
    let todo = app.create_todo(&token, project, json!({ "title": "x" })).await;

    let response = app
        .patch(&format!("/api/todos/{}/status", todo["id"]), json!({ "status": "done" }), &token)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .patch(
            &format!("/api/todos/{}/priority", todo["id"]),
            json!({ "priority": "critical" }),
            &token,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .patch(
            &format!("/api/todos/{}/priority", todo["id"]),
            json!({ "priority": "urgent" }),
            &token,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["priority"], "urgent");
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_filter_and_search_narrow_the_listing() {
    let (app, token, _, project) = setup().await;
    app.create_todo(&token, project, json!({ "title": "Buy food", "status": "completed" }))
        .await;
    app.create_todo(&token, project, json!({ "title": "Report", "description": "FOO numbers", "status": "completed" }))
        .await;
    app.create_todo(&token, project, json!({ "title": "Tidy", "status": "completed" }))
        .await;
    app.create_todo(&token, project, json!({ "title": "foo pending" })).await;

    let response = app.get("/api/todos?status=completed", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["count"], 3);
    assert!(json["data"]
        .as_array()
        .unwrap()
        .iter()
        .all(|t| t["status"] == "completed"));

    let response = app.get("/api/todos?status=completed&search=foo", &token).await;
    let json = body_json(response).await;
    let titles: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Report", "Buy food"]);
}

#[tokio::test]
async fn listing_only_returns_the_callers_todos() {
    let (app, token, _, project) = setup().await;
    app.create_todo(&token, project, json!({ "title": "mine" })).await;
    let (other, _) = app.register("other").await;
    let other_project = app.create_project(&other, "Other").await;
    app.create_todo(&other, other_project, json!({ "title": "theirs" })).await;

    let json = body_json(app.get("/api/todos", &token).await).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["data"][0]["title"], "mine");
}

#[tokio::test]
async fn pagination_reports_total_pages() {
    let (app, token, _, project) = setup().await;
    for title in ["one", "two", "three"] {
        app.create_todo(&token, project, json!({ "title": title })).await;
    }

    let response = app.get("/api/todos?limit=1&page=2&sort=title", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["data"][0]["title"], "three");
    assert_eq!(
        json["pagination"],
        json!({ "currentPage": 2, "totalPages": 3, "totalTodos": 3 })
    );
}

#[tokio::test]
async fn page_far_past_the_end_is_an_empty_listing() {
    let (app, token, _, project) = setup().await;
    app.create_todo(&token, project, json!({ "title": "only" })).await;

    for page in ["18446744073709551615", "100000000000000000"] {
        let response = app.get(&format!("/api/todos?page={page}"), &token).await;
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["count"], 0);
        assert_eq!(json["data"], json!([]));
        assert_eq!(json["pagination"]["totalTodos"], 1);
    }
}

#[tokio::test]
async fn range_filters_and_field_selection() {
    let (app, token, _, project) = setup().await;
    app.create_todo(&token, project, json!({ "title": "short", "estimatedTime": 5 })).await;
    app.create_todo(&token, project, json!({ "title": "long", "estimatedTime": 90 })).await;

    let json = body_json(
        app.get("/api/todos?estimatedTime%5Bgte%5D=30&fields=title", &token)
            .await,
    )
    .await;
    assert_eq!(json["count"], 1);
    let doc = json["data"][0].as_object().unwrap();
    assert_eq!(doc["title"], "long");
    assert!(doc.contains_key("id"));
    assert!(!doc.contains_key("estimatedTime"));

    let response = app.get("/api/todos?estimatedTime%5Bgte%5D=abc", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ---------------------------------------------------------------------------
// Delete / attachments / comments
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_returns_empty_data_and_removes_the_todo() {
    let (app, token, _, project) = setup().await;
    let todo = app.create_todo(&token, project, json!({ "title": "gone" })).await;
    let uri = format!("/api/todos/{}", todo["id"]);

    let response = app.delete(&uri, &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"], json!({}));

    assert_eq!(app.get(&uri, &token).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn attachment_upload_appends_a_record() {
    let (app, token, _, project) = setup().await;
    let todo = app.create_todo(&token, project, json!({ "title": "files" })).await;
    let id = todo["id"].as_i64().unwrap();

    let response = upload(&app, id, &token, multipart_body("attachment", "notes.txt", "hello")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let attachments = json["data"].as_array().unwrap();
    assert_eq!(attachments.len(), 1);
    let file_name = attachments[0]["fileName"].as_str().unwrap();
    assert!(file_name.starts_with("attachment-"));
    assert!(file_name.ends_with("-notes.txt"));
    assert_eq!(attachments[0]["fileType"], "text/plain");
    assert!(attachments[0]["uploadedAt"].is_string());

    let stored = app.uploads.path().join(file_name);
    assert_eq!(std::fs::read_to_string(stored).unwrap(), "hello");
}

#[tokio::test]
async fn attachment_exactly_at_the_cap_is_accepted() {
    let (app, token, _, project) = setup().await;
    let todo = app.create_todo(&token, project, json!({ "title": "files" })).await;
    let id = todo["id"].as_i64().unwrap();

    // The multipart body is larger than 1 KiB; only the file counts.
    let content = "x".repeat(1024);
    let response = upload(&app, id, &token, multipart_body("attachment", "full.txt", &content)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn attachment_upload_rejects_bad_input() {
    let (app, token, _, project) = setup().await;
    let todo = app.create_todo(&token, project, json!({ "title": "files" })).await;
    let id = todo["id"].as_i64().unwrap();

    let response = upload(&app, id, &token, multipart_body("attachment", "run.exe", "MZ")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = upload(&app, id, &token, multipart_body("other", "notes.txt", "hi")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "Please upload a file");

    // Over the 1 KiB cap configured for tests.
    let big = "x".repeat(1025);
    let response = upload(&app, id, &token, multipart_body("attachment", "big.txt", &big)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "File too large");

    // Far past the cap the body limit trips before the file is read whole.
    let huge = "x".repeat(200 * 1024);
    let response = upload(&app, id, &token, multipart_body("attachment", "huge.txt", &huge)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(app.get(&format!("/api/todos/{id}"), &token).await).await;
    assert_eq!(json["data"]["attachments"], json!([]));
}

#[tokio::test]
async fn comments_are_appended_in_order() {
    let (app, token, user_id, project) = setup().await;
    let todo = app.create_todo(&token, project, json!({ "title": "talk" })).await;
    let uri = format!("/api/todos/{}/comments", todo["id"]);

    app.post(&uri, json!({ "message": "first" }), &token).await;
    let response = app.post(&uri, json!({ "message": "second" }), &token).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let comments = body_json(response).await["data"]["comments"].clone();
    assert_eq!(comments[0]["message"], "first");
    assert_eq!(comments[1]["message"], "second");
    assert_eq!(comments[1]["user"], user_id);
}
