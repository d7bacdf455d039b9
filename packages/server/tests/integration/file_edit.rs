use ::common::storage::ContentHash;
use ::common::{CourseRole, JobSequenceStatus};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use server::editor::{DraftKey, update_file_edit_job_sequence_id, write_draft_edit};
use server::entity::{course, file, file_edit, job_sequence, question};
use server::jobs::{ServerJobOptions, prepare_server_job};

use crate::common::{TestApp, TestResponse, routes};

const INFO_JSON: &str = "questions/addNumbers/info.json";

struct Editor {
    app: TestApp,
    course: course::Model,
    user_id: i32,
    token: String,
}

async fn editor_setup() -> Editor {
    let app = TestApp::spawn().await;
    let course = app.create_course("TEST 101", false).await;
    let (user_id, token) = app.create_user("editor@example.com").await;
    app.grant_course_role(user_id, course.id, CourseRole::Editor)
        .await;
    Editor {
        app,
        course,
        user_id,
        token,
    }
}

impl Editor {
    fn key(&self) -> DraftKey {
        DraftKey {
            user_id: self.user_id,
            course_id: self.course.id,
            dir_name: "questions/addNumbers".into(),
            file_name: "info.json".into(),
        }
    }

    fn disk(&self) -> Vec<u8> {
        std::fs::read(self.app.course_file(INFO_JSON)).expect("fixture file")
    }

    fn disk_hash(&self) -> String {
        ContentHash::compute(&self.disk()).to_hex()
    }

    async fn open(&self) -> TestResponse {
        self.app
            .get_with_token(&routes::file_edit(self.course.id, INFO_JSON), &self.token)
            .await
    }

    async fn save_and_sync(&self, contents: &str, orig_hash: &str) -> TestResponse {
        let encoded = Base64.encode(contents);
        self.app
            .post_form_with_token(
                &routes::file_edit(self.course.id, INFO_JSON),
                &[
                    ("__action", "save_and_sync"),
                    ("file_edit_contents", &encoded),
                    ("file_edit_orig_hash", orig_hash),
                ],
                &self.token,
            )
            .await
    }

    async fn write_draft(&self, contents: &str, orig_hash: &str) -> file_edit::Model {
        write_draft_edit(
            &self.app.db,
            &*self.app.blob_store,
            &self.key(),
            contents.as_bytes(),
            orig_hash,
            self.user_id,
        )
        .await
        .expect("Failed to write draft")
    }
}

fn decode(value: &serde_json::Value) -> String {
    let bytes = Base64
        .decode(value.as_str().expect("base64 string"))
        .expect("valid base64");
    String::from_utf8(bytes).expect("utf-8")
}

const EDITED: &str = r#"{
  "title": "Add two numbers (edited)",
  "generatedFiles": {
    "data.txt": "This data is generated by code."
  }
}
"#;

mod opening {
    use super::*;

    #[tokio::test]
    async fn shows_disk_contents_when_there_is_no_draft() {
        let e = editor_setup().await;

        let res = e.open().await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["file_name"], "info.json");
        assert_eq!(res.body["dir_name"], "questions/addNumbers");
        assert_eq!(res.body["file_name_for_display"], INFO_JSON);
        assert_eq!(res.body["ace_mode"], "ace/mode/json");
        assert_eq!(res.body["disk_hash"], e.disk_hash());
        assert_eq!(res.body["orig_hash"], e.disk_hash());
        assert_eq!(decode(&res.body["edit_contents"]).as_bytes(), e.disk());
        assert!(res.body["draft_id"].is_null());
        assert!(res.body["job"].is_null());
        assert_eq!(res.body["alert_results"], false);
        assert_eq!(res.body["alert_choice"], false);
        assert_eq!(res.body["has_same_hash"], false);
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let e = editor_setup().await;

        let res = e
            .app
            .get_with_token(
                &routes::file_edit(e.course.id, "questions/nothing/here.txt"),
                &e.token,
            )
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn binary_files_are_refused() {
        let e = editor_setup().await;
        std::fs::write(e.app.course_file("questions/addNumbers/image.png"), b"\x89PNG\x00\x00")
            .unwrap();

        let res = e
            .app
            .get_with_token(
                &routes::file_edit(e.course.id, "questions/addNumbers/image.png"),
                &e.token,
            )
            .await;

        assert_eq!(res.status, 500);
        assert_eq!(res.body["code"], "INTERNAL_ERROR");
    }
}

mod drafts {
    use super::*;

    #[tokio::test]
    async fn draft_started_from_current_file_is_shown_without_conflict() {
        let e = editor_setup().await;
        let edit = e.write_draft("{\"title\": \"draft\"}", &e.disk_hash()).await;

        let res = e.open().await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["draft_id"], edit.id);
        assert_eq!(res.body["has_same_hash"], true);
        assert_eq!(res.body["alert_choice"], false);
        assert_eq!(res.body["alert_results"], false);
        assert_eq!(decode(&res.body["edit_contents"]), "{\"title\": \"draft\"}");
    }

    #[tokio::test]
    async fn draft_over_a_changed_file_asks_for_a_choice() {
        let e = editor_setup().await;
        e.write_draft("{\"title\": \"draft\"}", &"0".repeat(64)).await;

        let res = e.open().await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["alert_choice"], true);
        assert_eq!(res.body["has_same_hash"], false);
        assert_eq!(decode(&res.body["draft_contents"]), "{\"title\": \"draft\"}");
        assert_eq!(decode(&res.body["disk_contents"]).as_bytes(), e.disk());
    }

    #[tokio::test]
    async fn reading_a_draft_consumes_it() {
        let e = editor_setup().await;
        let edit = e.write_draft("{\"title\": \"draft\"}", &e.disk_hash()).await;

        let first = e.open().await;
        assert_eq!(first.body["draft_id"], edit.id);

        let second = e.open().await;
        assert_eq!(second.status, 200);
        assert!(second.body["draft_id"].is_null());
        assert_eq!(decode(&second.body["edit_contents"]).as_bytes(), e.disk());

        let row = file_edit::Entity::find_by_id(edit.id)
            .one(&e.app.db)
            .await
            .unwrap()
            .unwrap();
        assert!(row.deleted_at.is_some());
    }

    #[tokio::test]
    async fn drafts_older_than_a_day_are_ignored_and_removed() {
        let e = editor_setup().await;
        let edit = e.write_draft("{\"title\": \"old\"}", &e.disk_hash()).await;

        let mut active: file_edit::ActiveModel = edit.clone().into();
        active.created_at = Set(chrono::Utc::now() - chrono::Duration::hours(25));
        active.update(&e.app.db).await.unwrap();

        let res = e.open().await;

        assert_eq!(res.status, 200);
        assert!(res.body["draft_id"].is_null());
        let row = file_edit::Entity::find_by_id(edit.id)
            .one(&e.app.db)
            .await
            .unwrap()
            .unwrap();
        assert!(row.deleted_at.is_some());
    }

    #[tokio::test]
    async fn writing_a_new_draft_deletes_the_previous_one() {
        let e = editor_setup().await;
        let first = e.write_draft("{\"title\": \"one\"}", &e.disk_hash()).await;
        let second = e.write_draft("{\"title\": \"two\"}", &e.disk_hash()).await;

        let old_edit = file_edit::Entity::find_by_id(first.id)
            .one(&e.app.db)
            .await
            .unwrap()
            .unwrap();
        assert!(old_edit.deleted_at.is_some());

        let old_file = file::Entity::find_by_id(first.file_id)
            .one(&e.app.db)
            .await
            .unwrap()
            .unwrap();
        assert!(old_file.deleted_at.is_some());
        assert_eq!(old_file.deleted_by, Some(e.user_id));
        assert!(
            server::file_store::get(&e.app.db, &*e.app.blob_store, first.file_id)
                .await
                .is_err()
        );
        let old_hash = ContentHash::from_hex(&old_file.storage_hash).unwrap();
        assert!(e.app.blob_store.get(&old_hash).await.is_err());

        let res = e.open().await;
        assert_eq!(res.body["draft_id"], second.id);
        assert_eq!(decode(&res.body["edit_contents"]), "{\"title\": \"two\"}");
    }

    #[tokio::test]
    async fn failed_write_keeps_the_previous_draft() {
        let e = editor_setup().await;
        let kept = e.write_draft("{\"title\": \"kept\"}", &e.disk_hash()).await;

        let oversized = vec![b'x'; 2 * 1024 * 1024];
        let result = write_draft_edit(
            &e.app.db,
            &*e.app.blob_store,
            &e.key(),
            &oversized,
            &e.disk_hash(),
            e.user_id,
        )
        .await;
        assert!(result.is_err());

        let res = e.open().await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["draft_id"], kept.id);
        assert_eq!(decode(&res.body["edit_contents"]), "{\"title\": \"kept\"}");
    }

    #[tokio::test]
    async fn shared_blob_survives_while_another_draft_uses_it() {
        let e = editor_setup().await;
        let (other_id, _) = e.app.create_user("other-editor@example.com").await;
        let other_key = DraftKey {
            user_id: other_id,
            ..e.key()
        };
        let same = "{\"title\": \"same\"}";

        e.write_draft(same, &e.disk_hash()).await;
        write_draft_edit(
            &e.app.db,
            &*e.app.blob_store,
            &other_key,
            same.as_bytes(),
            &e.disk_hash(),
            other_id,
        )
        .await
        .unwrap();

        e.write_draft("{\"title\": \"replaced\"}", &e.disk_hash()).await;

        let shared = ContentHash::compute(same.as_bytes());
        assert_eq!(e.app.blob_store.get(&shared).await.unwrap(), same.as_bytes());
    }
}

mod save_and_sync {
    use super::*;

    #[tokio::test]
    async fn saves_syncs_and_redirects_back_to_the_editor() {
        let e = editor_setup().await;
        let path = routes::file_edit(e.course.id, INFO_JSON);

        let res = e.save_and_sync(EDITED, &e.disk_hash()).await;

        assert_eq!(res.status, 303, "{}", res.text);
        assert_eq!(res.location.as_deref(), Some(path.as_str()));
        assert_eq!(e.disk(), EDITED.as_bytes());

        let q = question::Entity::find_by_id(e.app.question_id(e.course.id, "addNumbers").await)
            .one(&e.app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(q.title, "Add two numbers (edited)");

        let page = e.open().await;
        assert_eq!(page.status, 200, "{}", page.text);
        assert_eq!(page.body["job"]["did_save"], true);
        assert_eq!(page.body["job"]["did_sync"], true);
        assert_eq!(page.body["alert_results"], true);
        assert_eq!(page.body["alert_choice"], false);
        assert_eq!(decode(&page.body["edit_contents"]), EDITED);
    }

    #[tokio::test]
    async fn stale_hash_leaves_the_file_alone_and_keeps_the_draft() {
        let e = editor_setup().await;
        let before = e.disk();

        let res = e.save_and_sync(EDITED, &"0".repeat(64)).await;

        assert_eq!(res.status, 303, "{}", res.text);
        assert_eq!(e.disk(), before);

        let page = e.open().await;
        assert_eq!(page.status, 200, "{}", page.text);
        assert_eq!(page.body["job"]["did_save"], false);
        assert_eq!(page.body["job"]["did_sync"], false);
        assert_eq!(page.body["alert_results"], true);
        assert_eq!(page.body["alert_choice"], true);
        assert_eq!(decode(&page.body["edit_contents"]), EDITED);

        let job_sequence_id = page.body["job"]["job_sequence_id"].as_i64().unwrap() as i32;
        let sequence = job_sequence::Entity::find_by_id(job_sequence_id)
            .one(&e.app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sequence.status, JobSequenceStatus::Error);
        assert_eq!(sequence.save_attempted, Some(true));
        assert_eq!(sequence.save_succeeded, None);
        assert_eq!(sequence.sync_attempted, None);
    }

    #[tokio::test]
    async fn failed_sync_still_reports_the_save() {
        let e = editor_setup().await;

        let res = e.save_and_sync("{ not json", &e.disk_hash()).await;
        assert_eq!(res.status, 303, "{}", res.text);

        let page = e.open().await;
        assert_eq!(page.body["job"]["did_save"], true);
        assert_eq!(page.body["job"]["did_sync"], false);
        assert_eq!(page.body["alert_results"], true);
        assert_eq!(decode(&page.body["edit_contents"]), "{ not json");

        let job_sequence_id = page.body["job"]["job_sequence_id"].as_i64().unwrap() as i32;
        let sequence = job_sequence::Entity::find_by_id(job_sequence_id)
            .one(&e.app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(sequence.status, JobSequenceStatus::Error);
        assert_eq!(sequence.save_succeeded, Some(true));
        assert_eq!(sequence.sync_attempted, Some(true));
        assert_eq!(sequence.sync_succeeded, None);
    }

    #[tokio::test]
    async fn unknown_action_is_a_bad_request() {
        let e = editor_setup().await;

        let res = e
            .app
            .post_form_with_token(
                &routes::file_edit(e.course.id, INFO_JSON),
                &[("__action", "launch_rockets")],
                &e.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(res.body["message"].as_str().unwrap().contains("launch_rockets"));
    }
}

mod linked_jobs {
    use super::*;

    async fn linked_job(e: &Editor) -> i32 {
        let edit = e.write_draft("{\"title\": \"draft\"}", &e.disk_hash()).await;
        let job = prepare_server_job(
            &e.app.db,
            ServerJobOptions {
                course_id: Some(e.course.id),
                user_id: e.user_id,
                authn_user_id: e.user_id,
                job_type: "file_edit".into(),
                description: "test".into(),
            },
        )
        .await
        .unwrap();
        update_file_edit_job_sequence_id(&e.app.db, edit.id, job.job_sequence_id)
            .await
            .unwrap();
        job.job_sequence_id
    }

    #[tokio::test]
    async fn running_job_redirects_to_the_job_sequence() {
        let e = editor_setup().await;
        let job_sequence_id = linked_job(&e).await;

        let res = e.open().await;

        assert_eq!(res.status, 303);
        assert_eq!(
            res.location.as_deref(),
            Some(routes::job_sequence(e.course.id, job_sequence_id).as_str())
        );
    }

    #[tokio::test]
    async fn legacy_job_reports_nothing_saved() {
        let e = editor_setup().await;
        let job_sequence_id = linked_job(&e).await;

        job_sequence::ActiveModel {
            id: Set(job_sequence_id),
            status: Set(JobSequenceStatus::Success),
            legacy: Set(true),
            save_succeeded: Set(Some(true)),
            sync_succeeded: Set(Some(true)),
            ..Default::default()
        }
        .update(&e.app.db)
        .await
        .unwrap();

        let res = e.open().await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["job"]["job_sequence_id"], job_sequence_id);
        assert_eq!(res.body["job"]["did_save"], false);
        assert_eq!(res.body["job"]["did_sync"], false);
        assert_eq!(res.body["alert_results"], true);
    }
}

mod permissions {
    use super::*;

    #[tokio::test]
    async fn course_viewers_cannot_edit() {
        let app = TestApp::spawn().await;
        let course = app.create_course("TEST 101", false).await;
        let (user_id, token) = app.create_user("viewer@example.com").await;
        app.grant_course_role(user_id, course.id, CourseRole::Viewer)
            .await;

        let res = app
            .get_with_token(&routes::file_edit(course.id, INFO_JSON), &token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn example_course_cannot_be_edited_even_by_admins() {
        let app = TestApp::spawn().await;
        let course = app.create_course("XC 101", true).await;
        let (_, token) = app.create_admin("admin@example.com").await;

        let res = app
            .get_with_token(&routes::file_edit(course.id, INFO_JSON), &token)
            .await;

        assert_eq!(res.status, 403);
        assert!(res.body["message"].as_str().unwrap().contains("example course"));

        let post = app
            .post_form_with_token(
                &routes::file_edit(course.id, INFO_JSON),
                &[("__action", "save_and_sync")],
                &token,
            )
            .await;
        assert_eq!(post.status, 403);
    }

    #[tokio::test]
    async fn anonymous_requests_are_rejected() {
        let app = TestApp::spawn().await;
        let course = app.create_course("TEST 101", false).await;

        let res = app
            .get_without_token(&routes::file_edit(course.id, INFO_JSON))
            .await;

        assert_eq!(res.status, 401);
    }
}
