//! End-to-end tests for the gateway.
//!
//! Each test starts a fake upstream (standing in for Teleport, OpenWeatherMap
//! and Walk Score) and the real application, both on ephemeral ports, and
//! talks to the application over HTTP.
//!
//! Run with: `cargo test --test integration_tests`
//!
//! The fake upstream answers by path:
//!
//! - `slug:atlantis` → 404
//! - `slug:broken` → 500
//! - `slug:garbled` → 200 with a non-JSON body
//! - `slug:slow-city` → 200 after longer than the gateway's timeout
//! - `slug:verbatim` → 200 with [`VERBATIM_BODY`], oddly spaced and ordered
//! - any other slug → 200 `{"score":80,"slug":...}`
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use reqwest::Client;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::sleep;

use lamb_api::{AppState, Config, build_router};

const VERBATIM_BODY: &str = "{ \"zeta\": 1,\n  \"alpha\" :[ 2,3 ], \"score\": 80.0 }\n";

// ============================================================================
// Fake upstream
// ============================================================================

#[derive(Clone, Default)]
struct FakeUpstream {
    /// Path and query of every request received, in order
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeUpstream {
    async fn start() -> (Self, String) {
        let fake = Self::default();
        let app = Router::new()
            .fallback(fake_upstream_handler)
            .with_state(fake.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake upstream");
        let addr = listener.local_addr().expect("Failed to get local address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Fake upstream failed");
        });

        (fake, format!("http://{addr}"))
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn last_path(&self) -> String {
        let last = self.requests().last().cloned().expect("No upstream request");
        last.split('?').next().unwrap_or_default().to_string()
    }
}

async fn fake_upstream_handler(
    State(fake): State<FakeUpstream>,
    uri: Uri,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let recorded = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_default();
    fake.requests.lock().unwrap().push(recorded);

    let path = uri.path();

    if let Some(rest) = path.strip_prefix("/api/urban_areas/slug:") {
        let slug = rest.trim_end_matches("/scores/");
        return match slug {
            "atlantis" => (StatusCode::NOT_FOUND, Json(json!({"status": 404}))).into_response(),
            "broken" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
            "garbled" => (StatusCode::OK, "<html>not json</html>").into_response(),
            "verbatim" => (
                [(axum::http::header::CONTENT_TYPE, "application/json")],
                VERBATIM_BODY,
            )
                .into_response(),
            "slow-city" => {
                sleep(Duration::from_secs(3)).await;
                Json(json!({"score": 1})).into_response()
            }
            _ => Json(json!({"score": 80, "slug": slug})).into_response(),
        };
    }

    if path == "/data/2.5/weather" {
        let city = params.get("q").cloned().unwrap_or_default();
        if city == "Nowhere" {
            return (StatusCode::NOT_FOUND, Json(json!({"cod": "404"}))).into_response();
        }
        return Json(json!({
            "name": city,
            "units": params.get("units"),
            "appid": params.get("appid"),
        }))
        .into_response();
    }

    if path == "/score" {
        return Json(json!({
            "status": 1,
            "walkscore": 98,
            "address": params.get("address"),
            "wsapikey": params.get("wsapikey"),
        }))
        .into_response();
    }

    StatusCode::NOT_FOUND.into_response()
}

// ============================================================================
// Application fixture
// ============================================================================

/// Test fixture that manages the fake upstream and the app server
struct TestFixture {
    upstream: FakeUpstream,
    base_url: String,
    client: Client,
}

impl TestFixture {
    async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Start the app against a fresh fake upstream, letting the test adjust
    /// the configuration first.
    async fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let (upstream, upstream_url) = FakeUpstream::start().await;

        let mut config = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            teleport_base_url: upstream_url.clone(),
            weather_base_url: upstream_url.clone(),
            weather_api_key: Some("weather-test-key".to_string()),
            walkscore_base_url: upstream_url,
            walkscore_api_key: Some("walk-test-key".to_string()),
            upstream_timeout: Duration::from_secs(1),
            max_request_body_size: 1024,
            log_level: "warn".to_string(),
            ..Config::default()
        };
        adjust(&mut config);

        let addr = Self::start_server(config).await;
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            upstream,
            base_url: format!("http://{addr}"),
            client,
        }
    }

    async fn start_server(config: Config) -> SocketAddr {
        let state = AppState::new(config).expect("Failed to build state");
        let app = build_router(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind app server");
        let addr = listener.local_addr().expect("Failed to get local address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server failed");
        });

        addr
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    async fn issue_token(&self, username: &str) -> String {
        let response = self
            .client
            .post(self.url("/auth/token"))
            .json(&json!({ "username": username }))
            .send()
            .await
            .expect("Token request failed");
        assert_eq!(response.status(), 200);

        let body: Value = response.json().await.unwrap();
        body["token"].as_str().expect("token missing").to_string()
    }
}

/// Local port that nothing listens on.
async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Token with a well-formed payload, signed with a key the gateway does not know.
fn foreign_token(sub: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &json!({ "sub": sub, "username": sub, "iat": now, "exp": now + 3600 }),
        &jsonwebtoken::EncodingKey::from_secret(b"attacker"),
    )
    .unwrap()
}

fn internal_error_envelope() -> Value {
    json!({"error": {"message": "Internal Server Error", "status": 500}})
}

// ============================================================================
// Health & Routing Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/health").await;
    assert!(response.status().is_success());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body.get("version").is_some());
    assert!(body.get("timestamp").is_some());
}

#[tokio::test]
async fn test_unmatched_path_returns_404_envelope() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/does/not/exist").await;
    assert_eq!(response.status(), 404);
    assert!(
        response.headers()[reqwest::header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/json")
    );

    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"error": {"message": "Not Found", "status": 404}}));
}

#[tokio::test]
async fn test_malformed_json_rejected_on_any_path() {
    let fixture = TestFixture::new().await;

    for path in ["/auth/token", "/does/not/exist"] {
        let response = fixture
            .client
            .post(fixture.url(path))
            .header("content-type", "application/json")
            .body("{\"username\": ")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 400, "path {path}");
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"]["status"], 400);
    }

    assert!(fixture.upstream.requests().is_empty());
}

#[tokio::test]
async fn test_oversized_json_body_returns_413() {
    let fixture = TestFixture::new().await;
    let padding = "x".repeat(4096);

    let response = fixture
        .client
        .post(fixture.url("/auth/token"))
        .json(&json!({ "username": padding }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 413);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["status"], 413);
}

// ============================================================================
// City Scores Tests
// ============================================================================

#[tokio::test]
async fn test_city_scores_passes_upstream_body_through() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/city/Lisbon/scores").await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"score": 80, "slug": "lisbon"}));
    assert_eq!(
        fixture.upstream.last_path(),
        "/api/urban_areas/slug:lisbon/scores/"
    );
}

#[tokio::test]
async fn test_city_scores_slugifies_multi_word_names() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/city/New%20York%20City/scores").await;
    assert_eq!(response.status(), 200);

    assert_eq!(
        fixture.upstream.last_path(),
        "/api/urban_areas/slug:new-york-city/scores/"
    );
}

#[tokio::test]
async fn test_city_scores_upstream_404() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/city/Atlantis/scores").await;
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({"error": {"message": "City scores not found on Teleport API.", "status": 404}})
    );
}

#[tokio::test]
async fn test_city_scores_upstream_500() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/city/broken/scores").await;
    assert_eq!(response.status(), 500);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body, internal_error_envelope());
}

#[tokio::test]
async fn test_city_scores_non_json_upstream_body() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/city/garbled/scores").await;
    assert_eq!(response.status(), 500);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body, internal_error_envelope());
}

#[tokio::test]
async fn test_city_scores_upstream_timeout() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/city/Slow%20City/scores").await;
    assert_eq!(response.status(), 500);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body, internal_error_envelope());
}

#[tokio::test]
async fn test_city_scores_upstream_unreachable() {
    let unreachable = closed_port_url().await;
    let fixture = TestFixture::with_config(|config| {
        config.teleport_base_url = unreachable;
    })
    .await;

    let response = fixture.get("/api/city/Lisbon/scores").await;
    assert_eq!(response.status(), 500);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body, internal_error_envelope());
}

#[tokio::test]
async fn test_city_scores_body_is_byte_for_byte() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/city/Verbatim/scores").await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()[reqwest::header::CONTENT_TYPE],
        "application/json"
    );

    let bytes = response.bytes().await.unwrap();
    assert_eq!(&bytes[..], VERBATIM_BODY.as_bytes());
}

#[tokio::test]
async fn test_city_scores_forwards_any_name() {
    let fixture = TestFixture::new().await;

    // Long names are not capped
    let long_name = "Llanfair".repeat(20);
    let response = fixture.get(&format!("/api/city/{long_name}/scores")).await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        fixture.upstream.last_path(),
        format!("/api/urban_areas/slug:{}/scores/", long_name.to_lowercase())
    );

    // Blank names still go upstream as a slug
    let response = fixture.get("/api/city/%20%20/scores").await;
    assert_eq!(response.status(), 200);
    assert_eq!(fixture.upstream.last_path(), "/api/urban_areas/slug:-/scores/");

    // A slash inside the name stays inside one path segment
    let response = fixture.get("/api/city/Fort%2FWorth/scores").await;
    assert_eq!(response.status(), 200);
    assert_eq!(
        fixture.upstream.last_path(),
        "/api/urban_areas/slug:fort%2Fworth/scores/"
    );
}

// ============================================================================
// Weather & Walk Score Tests
// ============================================================================

#[tokio::test]
async fn test_weather_proxies_with_key_and_units() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/weather/Porto?units=imperial").await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Porto");
    assert_eq!(body["units"], "imperial");
    assert_eq!(body["appid"], "weather-test-key");
}

#[tokio::test]
async fn test_weather_defaults_to_metric() {
    let fixture = TestFixture::new().await;

    let body: Value = fixture.get("/api/weather/Porto").await.json().await.unwrap();
    assert_eq!(body["units"], "metric");
}

#[tokio::test]
async fn test_weather_unknown_units_rejected() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/weather/Porto?units=kelvin").await;
    assert_eq!(response.status(), 400);
    assert!(fixture.upstream.requests().is_empty());
}

#[tokio::test]
async fn test_weather_upstream_404() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/weather/Nowhere").await;
    assert_eq!(response.status(), 404);

    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["error"]["message"],
        "Weather data not found for this location."
    );
}

#[tokio::test]
async fn test_weather_without_api_key_is_500() {
    let fixture = TestFixture::with_config(|config| {
        config.weather_api_key = None;
    })
    .await;

    let response = fixture.get("/api/weather/Porto").await;
    assert_eq!(response.status(), 500);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body, internal_error_envelope());
    assert!(fixture.upstream.requests().is_empty());
}

#[tokio::test]
async fn test_walkscore_proxies_request() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .get("/getwalkscore?address=1119%208th%20Avenue%20Seattle&lat=47.6085&lon=-122.3295")
        .await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["walkscore"], 98);
    assert_eq!(body["address"], "1119 8th Avenue Seattle");
    assert_eq!(body["wsapikey"], "walk-test-key");
}

#[tokio::test]
async fn test_walkscore_missing_params() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/getwalkscore?address=Seattle").await;
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["status"], 400);
}

// ============================================================================
// Auth & Preferences Tests
// ============================================================================

#[tokio::test]
async fn test_token_and_me() {
    let fixture = TestFixture::new().await;
    let token = fixture.issue_token("ada").await;

    let response = fixture
        .client
        .get(fixture.url("/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user_id"], "ada");
    assert_eq!(body["claims"]["username"], "ada");
}

#[tokio::test]
async fn test_garbage_token_is_anonymous_not_rejected() {
    let fixture = TestFixture::new().await;

    // Public routes ignore a bad token entirely
    let response = fixture
        .client
        .get(fixture.url("/api/city/Lisbon/scores"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Identity-bound routes see an anonymous caller
    let response = fixture
        .client
        .get(fixture.url("/auth/me"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_invalid_username_rejected() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .client
        .post(fixture.url("/auth/token"))
        .json(&json!({ "username": "a b" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_preferences_lifecycle() {
    let fixture = TestFixture::new().await;
    let token = fixture.issue_token("grace").await;
    let prefs_url = fixture.url("/user/preferences");

    // Defaults before anything is stored
    let body: Value = fixture
        .client
        .get(&prefs_url)
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["units"], "metric");

    // Store
    let stored = json!({
        "home_city": "Lisbon",
        "units": "imperial",
        "favorite_cities": ["Porto", "Boston"],
    });
    let response = fixture
        .client
        .put(&prefs_url)
        .bearer_auth(&token)
        .json(&stored)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: Value = fixture
        .client
        .get(&prefs_url)
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, stored);

    // Stored units apply when the weather query does not name any
    let body: Value = fixture
        .client
        .get(fixture.url("/api/weather/Porto"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["units"], "imperial");

    // Delete, then delete again
    let response = fixture
        .client
        .delete(&prefs_url)
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 204);

    let response = fixture
        .client
        .delete(&prefs_url)
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_preferences_reject_unknown_fields() {
    let fixture = TestFixture::new().await;
    let token = fixture.issue_token("linus").await;

    let response = fixture
        .client
        .put(fixture.url("/user/preferences"))
        .bearer_auth(&token)
        .json(&json!({ "theme": "dark" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["status"], 400);
}

#[tokio::test]
async fn test_foreign_signed_token_is_unauthorized() {
    let fixture = TestFixture::with_config(|config| {
        config.jwt_secret = "real-secret".to_string();
    })
    .await;

    // grace stores preferences with a genuine token
    let genuine = fixture.issue_token("grace").await;
    let stored = json!({ "home_city": "Lisbon", "units": "imperial", "favorite_cities": [] });
    let response = fixture
        .client
        .put(fixture.url("/user/preferences"))
        .bearer_auth(&genuine)
        .json(&stored)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let forged = foreign_token("grace");
    let prefs_url = fixture.url("/user/preferences");
    let attempts = [
        fixture.client.get(&prefs_url),
        fixture
            .client
            .put(&prefs_url)
            .json(&json!({ "home_city": "Elsewhere" })),
        fixture.client.delete(&prefs_url),
        fixture.client.get(fixture.url("/auth/me")),
    ];

    for attempt in attempts {
        let response = attempt.bearer_auth(&forged).send().await.unwrap();
        assert_eq!(response.status(), 401);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"]["status"], 401);
    }

    // grace's record is untouched
    let body: Value = fixture
        .client
        .get(&prefs_url)
        .bearer_auth(&genuine)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, stored);

    // and a forged identity does not pick up her stored units
    let body: Value = fixture
        .client
        .get(fixture.url("/api/weather/Porto"))
        .bearer_auth(&forged)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["units"], "metric");
}
