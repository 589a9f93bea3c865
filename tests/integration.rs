//! End-to-end integration tests for the booker suite runner
//!
//! These tests run against an in-process mock of the booking service that
//! reproduces its observable contract:
//! 1. Status codes (201 ping/delete, 403 without a valid cookie token, 404/405 for unknown ids)
//! 2. The lenient validation (dates and field types are not checked)
//! 3. Cookie-style `token=<value>` auth on mutating calls

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use booker::booking::{BookerApi, BookingDates, BookingPatch, BookingRecord};
use booker::common::config::{Config, Credentials, TargetConfig};
use booker::testing::{self, StepStatus};
use booker::{Error, HttpClient, HttpMethod, RequestOptions};

// ============== Mock booking service ==============

#[derive(Default)]
struct ServiceState {
    next_id: u64,
    bookings: BTreeMap<u64, Value>,
    tokens: HashSet<String>,
}

type Shared = Arc<Mutex<ServiceState>>;

const REQUIRED_FIELDS: [&str; 5] = [
    "firstname",
    "lastname",
    "totalprice",
    "depositpaid",
    "bookingdates",
];

/// Running mock service
struct MockBooker {
    base_url: String,
    state: Shared,
}

impl MockBooker {
    /// Start the mock on an ephemeral port with two seeded bookings
    async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(ServiceState {
            next_id: 1,
            ..Default::default()
        }));
        {
            let mut s = state.lock().unwrap();
            for (first, last) in [("Sally", "Brown"), ("Jim", "Wilson")] {
                let id = s.next_id;
                s.next_id += 1;
                s.bookings.insert(
                    id,
                    json!({
                        "firstname": first,
                        "lastname": last,
                        "totalprice": 111,
                        "depositpaid": true,
                        "bookingdates": {"checkin": "2018-01-01", "checkout": "2019-01-01"},
                        "additionalneeds": "Breakfast"
                    }),
                );
            }
        }

        let app = Router::new()
            .route("/ping", get(ping))
            .route("/auth", post(auth))
            .route("/booking", get(list_bookings).post(create_booking))
            .route(
                "/booking/{id}",
                get(get_booking)
                    .put(update_booking)
                    .patch(patch_booking)
                    .delete(delete_booking),
            )
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock service");
        let addr = listener.local_addr().expect("Mock service has no address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Mock service crashed");
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    fn config(&self) -> Config {
        Config {
            target: TargetConfig {
                base_url: self.base_url.clone(),
            },
            ..Default::default()
        }
    }

    fn client(&self) -> HttpClient {
        HttpClient::new(&self.base_url, Duration::from_secs(5)).expect("Invalid mock URL")
    }

    fn api(&self) -> BookerApi {
        BookerApi::new(self.client())
    }

    fn booking_count(&self) -> usize {
        self.state.lock().unwrap().bookings.len()
    }
}

fn text(status: StatusCode, body: &'static str) -> Response {
    (status, body).into_response()
}

fn authorized(headers: &HeaderMap, state: &ServiceState) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .into_iter()
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|c| c.trim().strip_prefix("token="))
        .any(|token| state.tokens.contains(token))
}

fn has_required_fields(body: &Value) -> bool {
    REQUIRED_FIELDS.iter().all(|f| body.get(f).is_some())
        && body["bookingdates"].get("checkin").is_some()
        && body["bookingdates"].get("checkout").is_some()
}

async fn ping() -> Response {
    text(StatusCode::CREATED, "Created")
}

async fn auth(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    if body["username"] == "admin" && body["password"] == "password123" {
        let mut s = state.lock().unwrap();
        let token = format!("{:015x}", 0xabc000 + s.tokens.len());
        s.tokens.insert(token.clone());
        Json(json!({ "token": token })).into_response()
    } else {
        Json(json!({ "reason": "Bad credentials" })).into_response()
    }
}

async fn list_bookings(State(state): State<Shared>) -> Response {
    let s = state.lock().unwrap();
    let ids: Vec<Value> = s.bookings.keys().map(|id| json!({ "bookingid": id })).collect();
    Json(Value::Array(ids)).into_response()
}

async fn get_booking(State(state): State<Shared>, Path(id): Path<u64>) -> Response {
    let s = state.lock().unwrap();
    match s.bookings.get(&id) {
        Some(booking) => Json(booking.clone()).into_response(),
        None => text(StatusCode::NOT_FOUND, "Not Found"),
    }
}

async fn create_booking(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    if !has_required_fields(&body) {
        return text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
    }
    let mut s = state.lock().unwrap();
    let id = s.next_id;
    s.next_id += 1;
    s.bookings.insert(id, body.clone());
    Json(json!({ "bookingid": id, "booking": body })).into_response()
}

async fn update_booking(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut s = state.lock().unwrap();
    if !authorized(&headers, &s) {
        return text(StatusCode::FORBIDDEN, "Forbidden");
    }
    if !s.bookings.contains_key(&id) {
        return text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    }
    if !has_required_fields(&body) {
        return text(StatusCode::BAD_REQUEST, "Bad Request");
    }
    s.bookings.insert(id, body.clone());
    Json(body).into_response()
}

async fn patch_booking(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut s = state.lock().unwrap();
    if !authorized(&headers, &s) {
        return text(StatusCode::FORBIDDEN, "Forbidden");
    }
    let Some(existing) = s.bookings.get_mut(&id) else {
        return text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    };
    if let (Some(target), Some(changes)) = (existing.as_object_mut(), body.as_object()) {
        for (k, v) in changes {
            target.insert(k.clone(), v.clone());
        }
    }
    Json(existing.clone()).into_response()
}

async fn delete_booking(
    State(state): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let mut s = state.lock().unwrap();
    if !authorized(&headers, &s) {
        return text(StatusCode::FORBIDDEN, "Forbidden");
    }
    match s.bookings.remove(&id) {
        Some(_) => text(StatusCode::CREATED, "Created"),
        None => text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"),
    }
}

// ============== Helpers ==============

fn suites_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("suites")
}

fn jasir() -> BookingRecord {
    BookingRecord {
        firstname: "Jasir".to_string(),
        lastname: "Buric".to_string(),
        totalprice: 166,
        depositpaid: true,
        bookingdates: BookingDates::new("2025-05-01", "2025-05-10"),
        additionalneeds: Some("Breakfast".to_string()),
    }
}

fn write_suite(dir: &tempfile::TempDir, name: &str, yaml: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, yaml).expect("Failed to write suite");
    path
}

// ============== Tests ==============

#[tokio::test]
async fn test_shipped_suites_pass() {
    let mock = MockBooker::start().await;

    let results = testing::run_suites(&[suites_dir()], &mock.config(), false)
        .await
        .expect("Suites failed to load");

    assert_eq!(results.len(), 4);
    for result in &results {
        let failures: Vec<String> = result
            .steps
            .iter()
            .filter(|s| s.status != StepStatus::Passed)
            .map(|s| format!("{}: {:?}", s.name, s.status))
            .collect();
        assert!(
            result.passed,
            "Suite '{}' failed: {:?} {:?}",
            result.name, result.error, failures
        );
        assert_eq!(result.steps.len(), result.steps_total);
    }
}

#[tokio::test]
async fn test_crud_scenario_cleans_up() {
    let mock = MockBooker::start().await;
    let before = mock.booking_count();

    let result = testing::run_suite(
        &suites_dir().join("02_booking_crud.yml"),
        &mock.config(),
        false,
    )
    .await
    .unwrap();

    assert!(result.passed, "{:?}", result.steps);
    assert_eq!(mock.booking_count(), before);
}

#[tokio::test]
async fn test_smoke_suite_reads_back_created_booking() {
    let mock = MockBooker::start().await;
    let before = mock.booking_count();

    let result = testing::run_suite(&suites_dir().join("01_smoke.yml"), &mock.config(), false)
        .await
        .unwrap();

    assert!(result.passed, "{:?}", result.steps);
    assert_eq!(result.steps_total, 6);
    assert_eq!(
        result.steps.last().map(|s| s.name.as_str()),
        Some("read back the created booking")
    );
    assert_eq!(mock.booking_count(), before + 2);
}

#[tokio::test]
async fn test_typed_api_end_to_end() {
    let mock = MockBooker::start().await;
    let api = mock.api();

    api.ping().await.unwrap();
    let token = api.authenticate(&Credentials::default()).await.unwrap();

    let created = api.create(&jasir()).await.unwrap();
    assert_eq!(created.booking, jasir());

    let fetched = api.get(created.bookingid).await.unwrap();
    assert_eq!(fetched, Some(jasir()));

    let mut updated = jasir();
    updated.totalprice = 233;
    updated.depositpaid = false;
    updated.bookingdates = BookingDates::new("2025-06-01", "2025-06-10");
    updated.additionalneeds = Some("Lunch".to_string());
    let replaced = api
        .update(created.bookingid, &updated, &token)
        .await
        .unwrap();
    assert_eq!(replaced, updated);

    let patched = api
        .patch(
            created.bookingid,
            &BookingPatch {
                totalprice: Some(300),
                ..Default::default()
            },
            &token,
        )
        .await
        .unwrap();
    assert_eq!(patched.totalprice, 300);
    assert_eq!(patched.lastname, "Buric");

    let ids: Vec<u64> = api.list().await.unwrap().iter().map(|r| r.bookingid).collect();
    assert!(ids.contains(&created.bookingid));

    api.delete(created.bookingid, &token).await.unwrap();
    assert_eq!(api.get(created.bookingid).await.unwrap(), None);
}

#[tokio::test]
async fn test_retrieved_booking_is_superset_of_submitted() {
    let mock = MockBooker::start().await;
    let client = mock.client();

    let submitted = json!({
        "firstname": "Minimal",
        "lastname": "Test",
        "totalprice": 100,
        "depositpaid": true,
        "bookingdates": {"checkin": "2024-05-01", "checkout": "2024-05-02"}
    });
    let created = client
        .send(
            HttpMethod::Post,
            "/booking",
            RequestOptions::default().json(submitted.clone()),
        )
        .await
        .unwrap();
    let id = created.body["bookingid"].as_u64().unwrap();

    let fetched = client
        .send(HttpMethod::Get, &format!("/booking/{}", id), RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(fetched.status, 200);
    assert!(testing::deep_includes(&fetched.body, &submitted).is_ok());
}

#[tokio::test]
async fn test_mutations_without_valid_token_are_forbidden() {
    let mock = MockBooker::start().await;
    let client = mock.client();
    let id = mock.api().create(&jasir()).await.unwrap().bookingid;
    let path = format!("/booking/{}", id);
    let body = serde_json::to_value(jasir()).unwrap();

    let auth_variants: [Option<&str>; 3] = [None, Some(""), Some("invalid_token_format")];
    for method in [HttpMethod::Put, HttpMethod::Patch, HttpMethod::Delete] {
        for token in auth_variants {
            let mut options = RequestOptions::tolerant();
            if let Some(token) = token {
                options = options.token(token);
            }
            if method != HttpMethod::Delete {
                options = options.json(body.clone());
            }

            let response = client.send(method, &path, options).await.unwrap();
            assert_eq!(
                response.status, 403,
                "{} with token {:?} should be forbidden",
                method, token
            );
        }
    }

    // The booking survived every attempt
    assert!(mock.api().get(id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_nonexistent_booking_is_not_found() {
    let mock = MockBooker::start().await;

    assert_eq!(mock.api().get(999999).await.unwrap(), None);

    let response = mock
        .client()
        .send(HttpMethod::Get, "/booking/999999", RequestOptions::tolerant())
        .await
        .unwrap();
    assert_eq!(response.status, 404);
    assert_eq!(response.body, json!("Not Found"));
}

#[tokio::test]
async fn test_missing_required_field_is_rejected() {
    let mock = MockBooker::start().await;

    let response = mock
        .client()
        .send(
            HttpMethod::Post,
            "/booking",
            RequestOptions::tolerant().json(json!({
                "firstname": "Test",
                "totalprice": 100,
                "depositpaid": true,
                "bookingdates": {"checkin": "2024-05-01", "checkout": "2024-05-05"}
            })),
        )
        .await
        .unwrap();
    assert!(!response.is_success(), "got {}", response.status);
}

#[tokio::test]
async fn test_strict_mode_surfaces_unexpected_status() {
    let mock = MockBooker::start().await;

    let err = mock
        .client()
        .send(HttpMethod::Get, "/booking/999999", RequestOptions::default())
        .await
        .unwrap_err();
    match err {
        Error::UnexpectedStatus { status, method, .. } => {
            assert_eq!(status, 404);
            assert_eq!(method, "GET");
        }
        other => panic!("Expected UnexpectedStatus, got {other}"),
    }
}

#[tokio::test]
async fn test_bad_credentials_are_rejected() {
    let mock = MockBooker::start().await;

    let err = mock
        .api()
        .authenticate(&Credentials {
            username: "admin".to_string(),
            password: "wrong".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AuthRejected(ref reason) if reason == "Bad credentials"));
}

#[tokio::test]
async fn test_failed_assertion_does_not_stop_suite() {
    let mock = MockBooker::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_suite(
        &dir,
        "failing.yml",
        r#"
name: failing step
steps:
  - name: wrong ping status
    request: { path: /ping }
    expect: { status: 200 }
  - name: lastname mismatch
    request: { path: /booking/1 }
    expect:
      body:
        - includes: { lastname: Doe }
  - name: ping still runs
    request: { path: /ping }
    expect: { status: 201 }
"#,
    );

    let result = testing::run_suite(&path, &mock.config(), false).await.unwrap();
    assert!(!result.passed);

    match &result.steps[0].status {
        StepStatus::Failed(e) => assert!(e.contains("Expected status 200, got 201"), "{e}"),
        other => panic!("Expected failure, got {other:?}"),
    }
    match &result.steps[1].status {
        StepStatus::Failed(e) => {
            assert!(e.contains(r#"'lastname' was "Brown" (expected "Doe")"#), "{e}")
        }
        other => panic!("Expected failure, got {other:?}"),
    }
    assert_eq!(result.steps[2].status, StepStatus::Passed);
}

#[tokio::test]
async fn test_cleanup_failure_is_ignored() {
    let mock = MockBooker::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_suite(
        &dir,
        "cleanup.yml",
        r#"
name: cleanup fails
before_all:
  - name: obtain auth token
    request:
      method: POST
      path: /auth
      body: { username: "{{username}}", password: "{{password}}" }
    save: { token: token }
steps:
  - name: ping
    request: { path: /ping }
    expect: { status: 201 }
after_all:
  - name: delete a booking that never existed
    request:
      method: DELETE
      path: /booking/424242
      auth: true
"#,
    );

    let result = testing::run_suite(&path, &mock.config(), false).await.unwrap();
    assert!(result.passed, "{:?}", result.steps);
}

#[tokio::test]
async fn test_saved_state_feeds_later_steps() {
    let mock = MockBooker::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_suite(
        &dir,
        "state.yml",
        r#"
name: state flows forward
steps:
  - name: create
    request:
      method: POST
      path: /booking
      body:
        firstname: Flow
        lastname: Test
        totalprice: 1
        depositpaid: false
        bookingdates: { checkin: "2025-01-01", checkout: "2025-01-02" }
    save: { booking_id: bookingid }
  - name: read back through the saved id
    requires: [booking_id]
    request: { path: "/booking/{{booking_id}}" }
    expect:
      body:
        - path: firstname
          equals: Flow
  - name: missing save target fails
    request: { path: /ping }
    save: { booking_id: bookingid }
"#,
    );

    let result = testing::run_suite(&path, &mock.config(), false).await.unwrap();
    assert_eq!(result.steps[0].status, StepStatus::Passed);
    assert_eq!(result.steps[1].status, StepStatus::Passed);
    match &result.steps[2].status {
        StepStatus::Failed(e) => assert!(e.contains("Cannot save 'booking_id'"), "{e}"),
        other => panic!("Expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_service_fails_steps_with_transport_error() {
    let config = Config {
        target: TargetConfig {
            base_url: "http://127.0.0.1:9".to_string(),
        },
        ..Default::default()
    };

    let result = testing::run_suite(&suites_dir().join("01_smoke.yml"), &config, false)
        .await
        .unwrap();
    assert!(!result.passed);
    assert_eq!(result.failed_steps().count(), result.steps_total);
}

#[tokio::test]
async fn test_ping_error_names_full_url() {
    // A service that answers 200 instead of the expected 201
    let app = Router::new().route("/ping", get(|| async { "OK" }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = HttpClient::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();
    let err = BookerApi::new(client).ping().await.unwrap_err();
    match err {
        Error::UnexpectedStatus { url, status, .. } => {
            assert_eq!(url, format!("http://{}/ping", addr));
            assert_eq!(status, 200);
        }
        other => panic!("Expected UnexpectedStatus, got {other}"),
    }
}

#[tokio::test]
async fn test_auth_with_explicit_cookie_header_sends_one_cookie() {
    let mock = MockBooker::start().await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_suite(
        &dir,
        "cookie.yml",
        r#"
name: auth alongside a cookie
before_all:
  - name: obtain auth token
    request:
      method: POST
      path: /auth
      body: { username: "{{username}}", password: "{{password}}" }
    save: { token: token }
steps:
  - name: patch with extra cookie
    request:
      method: PATCH
      path: /booking/1
      auth: true
      headers:
        Cookie: session=abc
      body: { totalprice: 5 }
    expect:
      status: 200
      body:
        - path: totalprice
          equals: 5
"#,
    );

    let result = testing::run_suite(&path, &mock.config(), false).await.unwrap();
    assert!(result.passed, "{:?}", result.steps);
}

// ============== Live service ==============

#[tokio::test]
#[ignore = "requires network access to restful-booker"]
async fn test_live_smoke_suite() {
    let result = testing::run_suite(&suites_dir().join("01_smoke.yml"), &Config::default(), true)
        .await
        .unwrap();
    assert!(result.passed, "{:?}", result.steps);
}

#[tokio::test]
#[ignore = "requires network access to restful-booker"]
async fn test_live_crud_suite() {
    let result = testing::run_suite(
        &suites_dir().join("02_booking_crud.yml"),
        &Config::default(),
        true,
    )
    .await
    .unwrap();
    assert!(result.passed, "{:?}", result.steps);
}
