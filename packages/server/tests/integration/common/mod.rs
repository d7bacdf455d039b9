use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ::common::{CourseInstanceRole, CourseRole};
use ::common::storage::BlobStore;
use ::common::storage::filesystem::FilesystemBlobStore;
use reqwest::Client;
use reqwest::redirect::Policy;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde_json::Value;
use tempfile::TempDir;

use server::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, EditorConfig, ServerConfig, StorageConfig,
};
use server::entity::{
    assessment, assessment_question, course, course_instance, course_instance_permission,
    course_permission, enrollment, question, user,
};
use server::state::AppState;

pub mod routes {
    pub const REGISTER: &str = "/api/v1/auth/register";
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const ME: &str = "/api/v1/auth/me";

    pub fn file_edit(course_id: i32, path: &str) -> String {
        format!("/api/v1/courses/{course_id}/file-edit/{path}")
    }

    pub fn job_sequence(course_id: i32, job_sequence_id: i32) -> String {
        format!("/api/v1/courses/{course_id}/job-sequences/{job_sequence_id}")
    }

    pub fn course_sync(course_id: i32) -> String {
        format!("/api/v1/courses/{course_id}/sync")
    }

    pub fn preview_question(course_id: i32, question_id: i32) -> String {
        format!("/api/v1/courses/{course_id}/questions/{question_id}")
    }

    pub fn assessment_question(
        course_instance_id: i32,
        assessment_id: i32,
        question_id: i32,
    ) -> String {
        format!(
            "/api/v1/course-instances/{course_instance_id}/assessments/{assessment_id}/questions/{question_id}"
        )
    }

    pub fn public_question(course_id: i32, question_id: i32) -> String {
        format!("/api/v1/public/courses/{course_id}/questions/{question_id}")
    }

    pub fn workspace(workspace_id: i32) -> String {
        format!("/api/v1/workspaces/{workspace_id}")
    }
}

/// A running test server backed by a throwaway SQLite database, blob
/// directory, and copy of the fixture course.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub blob_store: Arc<dyn BlobStore>,
    pub course_root: PathBuf,
    _dir: TempDir,
}

/// Path to the test fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn copy_dir(from: &Path, to: &Path) {
    std::fs::create_dir_all(to).expect("Failed to create fixture directory");
    for entry in std::fs::read_dir(from).expect("Failed to read fixture directory") {
        let entry = entry.expect("Failed to read fixture entry");
        let target = to.join(entry.file_name());
        if entry.file_type().expect("Failed to stat fixture").is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            std::fs::copy(entry.path(), &target).expect("Failed to copy fixture file");
        }
    }
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// `Location` header of redirects.
    pub location: Option<String>,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let course_root = dir.path().join("course");
        copy_dir(&fixtures_dir().join("course"), &course_root);

        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let db = server::database::init_db(&db_url)
            .await
            .expect("Failed to initialize test database");
        server::seed::ensure_indexes(&db)
            .await
            .expect("Failed to create indexes");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig::default(),
            },
            database: DatabaseConfig { url: db_url },
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests".to_string(),
            },
            storage: StorageConfig {
                blob_dir: dir.path().join("blobs"),
                max_blob_size: 1024 * 1024,
            },
            editor: EditorConfig::default(),
        };

        let blob_store = FilesystemBlobStore::new(
            app_config.storage.blob_dir.clone(),
            app_config.storage.max_blob_size,
        )
        .await
        .expect("Failed to create blob store");

        let blob_store: Arc<dyn BlobStore> = Arc::new(blob_store);
        let state = AppState {
            db: db.clone(),
            blob_store: blob_store.clone(),
            config: app_config,
        };

        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client = Client::builder()
            .redirect(Policy::none())
            .build()
            .expect("Failed to build HTTP client");

        Self {
            addr,
            client,
            db,
            blob_store,
            course_root,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_form_with_token(
        &self,
        path: &str,
        form: &[(&str, &str)],
        token: &str,
    ) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .form(form)
            .send()
            .await
            .expect("Failed to send form POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    /// Register a user and log in, returning `(user_id, token)`.
    pub async fn create_user(&self, uid: &str) -> (i32, String) {
        let body = serde_json::json!({
            "uid": uid,
            "password": "password123",
        });

        let reg = self.post_without_token(routes::REGISTER, &body).await;
        assert_eq!(reg.status, 201, "Registration failed: {}", reg.text);

        let res = self.post_without_token(routes::LOGIN, &body).await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);

        let token = res.body["token"]
            .as_str()
            .expect("Login response should contain a token")
            .to_string();
        (reg.id(), token)
    }

    /// Register an administrator and return `(user_id, token)`.
    pub async fn create_admin(&self, uid: &str) -> (i32, String) {
        let (id, _) = self.create_user(uid).await;

        let mut active: user::ActiveModel = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .expect("DB query failed")
            .expect("User not found after registration")
            .into();
        active.is_administrator = Set(true);
        active.update(&self.db).await.expect("Failed to promote user");

        let res = self
            .post_without_token(
                routes::LOGIN,
                &serde_json::json!({"uid": uid, "password": "password123"}),
            )
            .await;
        let token = res.body["token"].as_str().expect("token").to_string();
        (id, token)
    }

    /// Insert a course pointing at the fixture copy and sync it from disk.
    pub async fn create_course(&self, short_name: &str, example_course: bool) -> course::Model {
        let course = course::ActiveModel {
            short_name: Set(short_name.to_string()),
            title: Set(String::new()),
            path: Set(self.course_root.display().to_string()),
            example_course: Set(example_course),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("Failed to insert course");

        server::sync::sync_course(&self.db, &course)
            .await
            .expect("Failed to sync fixture course");
        course
    }

    pub async fn grant_course_role(&self, user_id: i32, course_id: i32, role: CourseRole) {
        course_permission::ActiveModel {
            user_id: Set(user_id),
            course_id: Set(course_id),
            course_role: Set(role),
        }
        .insert(&self.db)
        .await
        .expect("Failed to grant course role");
    }

    pub async fn create_course_instance(&self, course_id: i32) -> i32 {
        course_instance::ActiveModel {
            course_id: Set(course_id),
            short_name: Set("Fa26".to_string()),
            created_at: Set(chrono::Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("Failed to insert course instance")
        .id
    }

    pub async fn grant_course_instance_role(
        &self,
        user_id: i32,
        course_instance_id: i32,
        role: CourseInstanceRole,
    ) {
        course_instance_permission::ActiveModel {
            user_id: Set(user_id),
            course_instance_id: Set(course_instance_id),
            course_instance_role: Set(role),
        }
        .insert(&self.db)
        .await
        .expect("Failed to grant course instance role");
    }

    pub async fn enroll(&self, user_id: i32, course_instance_id: i32) {
        enrollment::ActiveModel {
            user_id: Set(user_id),
            course_instance_id: Set(course_instance_id),
            created_at: Set(chrono::Utc::now()),
        }
        .insert(&self.db)
        .await
        .expect("Failed to enroll user");
    }

    /// Create an assessment holding a single question.
    pub async fn create_assessment(&self, course_instance_id: i32, question_id: i32) -> i32 {
        let assessment = assessment::ActiveModel {
            course_instance_id: Set(course_instance_id),
            tid: Set("hw1".to_string()),
            title: Set("Homework 1".to_string()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .expect("Failed to insert assessment");

        assessment_question::ActiveModel {
            assessment_id: Set(assessment.id),
            question_id: Set(question_id),
            number: Set(1),
        }
        .insert(&self.db)
        .await
        .expect("Failed to insert assessment question");

        assessment.id
    }

    pub async fn question_id(&self, course_id: i32, qid: &str) -> i32 {
        question::Entity::find()
            .filter(question::Column::CourseId.eq(course_id))
            .filter(question::Column::Qid.eq(qid))
            .one(&self.db)
            .await
            .expect("DB query failed")
            .unwrap_or_else(|| panic!("Question {qid} was not synced"))
            .id
    }

    pub fn course_file(&self, relative: &str) -> PathBuf {
        self.course_root.join(relative)
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let location = res
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            location,
            text,
            body,
        }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }
}
