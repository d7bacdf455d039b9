use std::time::Duration;

use ::common::CourseRole;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64;
use sea_orm::{EntityTrait, QueryOrder};
use serde_json::json;

use server::entity::job_sequence;

use crate::common::{TestApp, TestResponse, routes};

async fn latest_job_sequence_id(app: &TestApp) -> i32 {
    job_sequence::Entity::find()
        .order_by_desc(job_sequence::Column::Id)
        .one(&app.db)
        .await
        .unwrap()
        .expect("a job sequence should exist")
        .id
}

/// Poll until the job sequence leaves `Running`.
async fn wait_for_job(app: &TestApp, course_id: i32, job_sequence_id: i32, token: &str) -> TestResponse {
    for _ in 0..50 {
        let res = app
            .get_with_token(&routes::job_sequence(course_id, job_sequence_id), token)
            .await;
        if res.body["status"] != "Running" {
            return res;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("job sequence {job_sequence_id} never finished");
}

#[tokio::test]
async fn file_edit_job_output_is_visible_to_its_owner() {
    let app = TestApp::spawn().await;
    let course = app.create_course("TEST 101", false).await;
    let (user_id, token) = app.create_user("editor@example.com").await;
    app.grant_course_role(user_id, course.id, CourseRole::Editor)
        .await;

    let path = "questions/addNumbers/question.html";
    let page = app.get_with_token(&routes::file_edit(course.id, path), &token).await;
    let orig_hash = page.body["disk_hash"].as_str().unwrap().to_string();
    let contents = Base64.encode("<p>{{params.a}} plus {{params.b}}?</p>\n");
    let res = app
        .post_form_with_token(
            &routes::file_edit(course.id, path),
            &[
                ("__action", "save_and_sync"),
                ("file_edit_contents", &contents),
                ("file_edit_orig_hash", &orig_hash),
            ],
            &token,
        )
        .await;
    assert_eq!(res.status, 303, "{}", res.text);

    let job_sequence_id = latest_job_sequence_id(&app).await;
    let res = app
        .get_with_token(&routes::job_sequence(course.id, job_sequence_id), &token)
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["job_type"], "file_edit");
    assert_eq!(res.body["status"], "Success");
    assert_eq!(res.body["save_succeeded"], true);
    assert_eq!(res.body["sync_succeeded"], true);
    assert!(
        res.body["jobs"][0]["output"]
            .as_str()
            .unwrap()
            .contains("questions/addNumbers/question.html")
    );
}

#[tokio::test]
async fn job_sequences_of_other_courses_are_not_found() {
    let app = TestApp::spawn().await;
    let course = app.create_course("TEST 101", false).await;
    let other = app.create_course("TEST 202", false).await;
    let (_, token) = app.create_admin("admin@example.com").await;

    let res = app
        .post_with_token(&routes::course_sync(course.id), &json!({}), &token)
        .await;
    assert_eq!(res.status, 202, "{}", res.text);
    let job_sequence_id = res.body["job_sequence_id"].as_i64().unwrap() as i32;

    let res = app
        .get_with_token(&routes::job_sequence(other.id, job_sequence_id), &token)
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn course_sync_runs_in_the_background() {
    let app = TestApp::spawn().await;
    let course = app.create_course("TEST 101", false).await;
    let (user_id, token) = app.create_user("editor@example.com").await;
    app.grant_course_role(user_id, course.id, CourseRole::Editor)
        .await;

    let res = app
        .post_with_token(&routes::course_sync(course.id), &json!({}), &token)
        .await;
    assert_eq!(res.status, 202, "{}", res.text);
    let job_sequence_id = res.body["job_sequence_id"].as_i64().unwrap() as i32;

    let res = wait_for_job(&app, course.id, job_sequence_id, &token).await;
    assert_eq!(res.body["status"], "Success", "{}", res.text);
    assert_eq!(res.body["job_type"], "sync");
    assert!(res.body["jobs"][0]["output"].as_str().unwrap().contains("Synced 3 questions"));
}

#[tokio::test]
async fn viewers_cannot_start_a_sync_but_can_read_jobs() {
    let app = TestApp::spawn().await;
    let course = app.create_course("TEST 101", false).await;
    let (_, admin) = app.create_admin("admin@example.com").await;
    let (viewer_id, viewer) = app.create_user("viewer@example.com").await;
    app.grant_course_role(viewer_id, course.id, CourseRole::Viewer)
        .await;

    let res = app
        .post_with_token(&routes::course_sync(course.id), &json!({}), &viewer)
        .await;
    assert_eq!(res.status, 403);

    let res = app
        .post_with_token(&routes::course_sync(course.id), &json!({}), &admin)
        .await;
    let job_sequence_id = res.body["job_sequence_id"].as_i64().unwrap() as i32;

    let res = wait_for_job(&app, course.id, job_sequence_id, &viewer).await;
    assert_eq!(res.status, 200);
}

#[tokio::test]
async fn strangers_cannot_read_job_sequences() {
    let app = TestApp::spawn().await;
    let course = app.create_course("TEST 101", false).await;
    let (_, admin) = app.create_admin("admin@example.com").await;
    let (_, stranger) = app.create_user("stranger@example.com").await;

    let res = app
        .post_with_token(&routes::course_sync(course.id), &json!({}), &admin)
        .await;
    let job_sequence_id = res.body["job_sequence_id"].as_i64().unwrap() as i32;

    let res = app
        .get_with_token(&routes::job_sequence(course.id, job_sequence_id), &stranger)
        .await;
    assert_eq!(res.status, 403);
}
