//! Integration tests for the volunteer backend.

use std::path::PathBuf;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::config::Config;
use crate::engine::Engine;
use crate::store::JsonFileStore;
use crate::validation::Rules;
use crate::{create_router, AppState};

fn test_config(psk: Option<String>, data_path: PathBuf) -> Config {
    Config {
        api_psk: psk,
        data_path,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        log_level: "warn".to_string(),
        rules: Rules::default(),
    }
}

fn test_state(psk: Option<String>, data_path: PathBuf) -> AppState {
    let config = test_config(psk, data_path);
    let engine = Engine::open(config.rules.clone(), JsonFileStore::new(&config.data_path))
        .expect("Failed to open engine");
    AppState::new(engine, config)
}

/// Test fixture for integration tests.
struct TestFixture {
    client: Client,
    base_url: String,
    data_path: PathBuf,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_psk(Some("test-api-key".to_string())).await
    }

    async fn with_psk(psk: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_path = temp_dir.path().join("data.json");

        let app = create_router(test_state(psk.clone(), data_path.clone()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let mut client_builder = Client::builder();
        if let Some(key) = psk {
            let mut headers = reqwest::header::HeaderMap::new();
            headers.insert("x-api-key", key.parse().unwrap());
            client_builder = client_builder.default_headers(headers);
        }

        TestFixture {
            client: client_builder.build().unwrap(),
            base_url,
            data_path,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn put(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self
            .client
            .put(self.url(path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json().await.unwrap())
    }

    async fn register(&self, username: &str, role: &str) -> Value {
        let (status, body) = self.post("/api/users", registration(username, role)).await;
        assert_eq!(status, 200, "registration of {} failed: {}", username, body);
        body
    }

    async fn seed(&self) {
        self.register("rob", "Recruit").await;
        self.register("ann", "Volunteer").await;
        self.register("ben", "Volunteer").await;
        self.register("cat", "Volunteer").await;
        let (status, _) = self
            .post(
                "/api/opportunities",
                json!({
                    "title": "Beach cleanup",
                    "description": "Collect litter along the shore",
                    "location": "North Bay",
                    "date": "2024-06-01",
                    "postedBy": "rob"
                }),
            )
            .await;
        assert_eq!(status, 200);
    }
}

fn registration(username: &str, role: &str) -> Value {
    json!({
        "name": "Sam Green",
        "email": format!("{}@example.org", username),
        "phone": "+441234567",
        "age": "30",
        "username": username,
        "password": "Abc123",
        "confirmPassword": "Abc123",
        "role": role,
        "disabilities": "none"
    })
}

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_auth_missing_psk() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_router(test_state(
        Some("secret-key".to_string()),
        temp_dir.path().join("data.json"),
    ));

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/datastore")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_invalid_psk() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_router(test_state(
        Some("correct-key".to_string()),
        temp_dir.path().join("data.json"),
    ));

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/datastore")
                .header("x-api-key", "wrong-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_bearer_token() {
    let temp_dir = TempDir::new().unwrap();
    let app = create_router(test_state(
        Some("correct-key".to_string()),
        temp_dir.path().join("data.json"),
    ));

    let resp = app
        .oneshot(
            Request::builder()
                .uri("/api/datastore")
                .header("authorization", "Bearer correct-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_no_psk_allows_requests() {
    let fixture = TestFixture::with_psk(None).await;
    let (status, body) = fixture.get("/api/datastore").await;
    assert_eq!(status, 200);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_empty_datastore() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get("/api/datastore").await;
    assert_eq!(status, 200);
    assert_eq!(body["revisionId"], 0);
    assert_eq!(body["data"]["users"].as_array().unwrap().len(), 0);
    assert_eq!(body["data"]["opportunities"].as_array().unwrap().len(), 0);
    assert_eq!(body["data"]["applications"].as_array().unwrap().len(), 0);
    assert!(!fixture.data_path.exists());
}

#[tokio::test]
async fn test_register_and_login() {
    let fixture = TestFixture::new().await;

    let body = fixture.register("ann", "Volunteer").await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["role"], "Volunteer");
    assert_eq!(body["data"]["disabilities"], "none");
    assert!(body["data"].get("password").is_none());
    assert_eq!(body["revisionId"], 1);

    let (status, body) = fixture
        .post(
            "/api/login",
            json!({ "username": "ann", "password": "Abc123" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["username"], "ann");

    let (status, body) = fixture
        .post(
            "/api/login",
            json!({ "username": "ann", "password": "wrong" }),
        )
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, body) = fixture.get("/api/users/ann").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["email"], "ann@example.org");
}

#[tokio::test]
async fn test_registration_validation_errors() {
    let fixture = TestFixture::new().await;
    fixture.register("ann", "Volunteer").await;

    let (status, body) = fixture.post("/api/users", registration("ann", "Volunteer")).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(body["error"]["message"], "Username already exists.");

    let mut request = registration("bob", "Volunteer");
    request["email"] = json!("bob@example.net");
    let (status, body) = fixture.post("/api/users", request).await;
    assert_eq!(status, 400);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Email"));

    let mut request = registration("bob", "Volunteer");
    request["confirmPassword"] = json!("Abc124");
    let (_, body) = fixture.post("/api/users", request).await;
    assert_eq!(body["error"]["message"], "Passwords do not match.");

    let (_, body) = fixture.post("/api/users", registration("bob", "Admin")).await;
    assert_eq!(body["error"]["message"], "Invalid role selected.");

    let (_, body) = fixture.get("/api/datastore").await;
    assert_eq!(body["data"]["users"].as_array().unwrap().len(), 1);
    assert_eq!(body["revisionId"], 1);
}

#[tokio::test]
async fn test_post_opportunity_validation() {
    let fixture = TestFixture::new().await;
    fixture.register("rob", "Recruit").await;
    fixture.register("ann", "Volunteer").await;

    let (status, body) = fixture
        .post(
            "/api/opportunities",
            json!({
                "title": "Park",
                "description": "short",
                "location": "Park",
                "date": "2024-05-05",
                "postedBy": "rob"
            }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["message"], "Description too short.");

    let (status, body) = fixture
        .post(
            "/api/opportunities",
            json!({
                "title": "Park day",
                "description": "Plant trees in the park",
                "location": "Park",
                "date": "2024-05-05",
                "postedBy": "ann"
            }),
        )
        .await;
    assert_eq!(status, 403);
    assert_eq!(body["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_apply_and_duplicate() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;

    let (status, body) = fixture
        .post(
            "/api/opportunities/0/applications",
            json!({ "username": "ann", "disabilityInfo": "No" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["status"], "Pending");
    assert_eq!(body["data"]["opportunityTitle"], "Beach cleanup");
    assert_eq!(body["data"]["disabilityInfo"], "No");

    let (status, body) = fixture
        .post(
            "/api/opportunities/0/applications",
            json!({ "username": "ann" }),
        )
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], "CONFLICT");

    let (status, body) = fixture
        .post(
            "/api/opportunities/5/applications",
            json!({ "username": "ann" }),
        )
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["details"]["len"], 1);

    let (_, body) = fixture.get("/api/users/ann/applications").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = fixture.get("/api/users/ann/applications/0").await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["location"], "North Bay");
    assert_eq!(body["data"]["poster"]["username"], "rob");
}

#[tokio::test]
async fn test_recruiter_review_flow() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;
    for name in ["ann", "ben", "cat"] {
        let (status, _) = fixture
            .post(
                "/api/opportunities/0/applications",
                json!({ "username": name }),
            )
            .await;
        assert_eq!(status, 200);
    }

    let (status, body) = fixture
        .put(
            "/api/recruiters/rob/applications/0",
            json!({ "status": "Accepted" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["username"], "ann");

    let (status, body) = fixture
        .put(
            "/api/recruiters/rob/applications/0",
            json!({ "status": "Rejected" }),
        )
        .await;
    assert_eq!(status, 409);
    assert_eq!(body["error"]["code"], "INVALID_TRANSITION");

    let (_, body) = fixture.get("/api/recruiters/rob/next-pending").await;
    assert_eq!(body["data"]["username"], "ben");

    let (status, body) = fixture
        .post(
            "/api/recruiters/rob/next-pending",
            json!({ "status": "Approved" }),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["username"], "ben");
    assert_eq!(body["data"]["status"], "Accepted");

    let (_, body) = fixture.get("/api/recruiters/rob/applications").await;
    let order: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["username"].as_str().unwrap())
        .collect();
    assert_eq!(order, ["ann", "cat", "ben"]);

    let (_, body) = fixture
        .post(
            "/api/recruiters/rob/next-pending",
            json!({ "status": "Rejected" }),
        )
        .await;
    assert_eq!(body["data"]["username"], "cat");

    let (status, body) = fixture
        .post(
            "/api/recruiters/rob/next-pending",
            json!({ "status": "Rejected" }),
        )
        .await;
    assert_eq!(status, 200);
    assert!(body["data"].is_null());

    let (_, body) = fixture.post("/api/users/ben/notifications", json!({})).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    let (_, body) = fixture.post("/api/users/ben/notifications", json!({})).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_revision_increments_on_writes() {
    let fixture = TestFixture::new().await;

    let (_, body) = fixture.get("/api/datastore/revision").await;
    let initial = body["data"]["revisionId"].as_i64().unwrap();

    fixture.seed().await;

    let (_, body) = fixture.get("/api/datastore/revision").await;
    assert_eq!(body["data"]["revisionId"].as_i64().unwrap(), initial + 5);

    let (_, body) = fixture.post("/api/users", registration("rob", "Recruit")).await;
    assert_eq!(body["revisionId"].as_i64().unwrap(), initial + 5);
}

#[tokio::test]
async fn test_concurrent_registrations_are_serialized() {
    let fixture = TestFixture::new().await;

    let mut requests = tokio::task::JoinSet::new();
    for i in 0..8 {
        let client = fixture.client.clone();
        let url = fixture.url("/api/users");
        let body = registration(&format!("user{}", i), "Volunteer");
        requests.spawn(async move { client.post(url).json(&body).send().await.unwrap().status() });
    }
    while let Some(status) = requests.join_next().await {
        assert_eq!(status.unwrap(), 200);
    }

    let (_, body) = fixture.get("/api/datastore/revision").await;
    assert_eq!(body["data"]["revisionId"], 8);

    let raw: Value =
        serde_json::from_str(&std::fs::read_to_string(&fixture.data_path).unwrap()).unwrap();
    assert_eq!(raw["users"].as_array().unwrap().len(), 8);
    assert_eq!(raw["revision_id"], 8);
}

#[tokio::test]
async fn test_data_file_survives_restart() {
    let fixture = TestFixture::new().await;
    fixture.seed().await;
    fixture
        .post(
            "/api/opportunities/0/applications",
            json!({ "username": "ann" }),
        )
        .await;

    let raw: Value =
        serde_json::from_str(&std::fs::read_to_string(&fixture.data_path).unwrap()).unwrap();
    assert_eq!(raw["users"].as_array().unwrap().len(), 4);
    assert_eq!(raw["users"][0]["role"], "Recruit");
    assert_eq!(raw["applications"][0]["opportunity_title"], "Beach cleanup");
    assert_eq!(raw["applications"][0]["status"], "Pending");

    let reopened = Engine::open(Rules::default(), JsonFileStore::new(&fixture.data_path)).unwrap();
    assert_eq!(reopened.users().len(), 4);
    assert_eq!(reopened.applications_for_volunteer("ann").unwrap().len(), 1);
    assert_eq!(reopened.revision_id(), 6);
}

#[tokio::test]
async fn test_not_found_errors() {
    let fixture = TestFixture::new().await;

    let (status, body) = fixture.get("/api/users/ghost").await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);

    let (status, _) = fixture.get("/api/users/ghost/applications").await;
    assert_eq!(status, 404);

    let (status, _) = fixture
        .put(
            "/api/recruiters/rob/applications/0",
            json!({ "status": "Accepted" }),
        )
        .await;
    assert_eq!(status, 404);
}
