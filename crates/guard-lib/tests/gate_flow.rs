//! End-to-end flows through the router: blocking, prompting, password
//! change, and the administrative re-arm.
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use guard_lib::config::Settings;
use guard_lib::rotation::TimeSource;
use guard_lib::router::create_router;
use guard_lib::store::MemoryStore;
use guard_lib::{AppState, CurrentUser};
use passguard_common::{UnixSeconds, UserId};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

struct FixedTime(AtomicI64);

impl FixedTime {
    fn at(secs: UnixSeconds) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(secs)))
    }

    fn set(&self, secs: UnixSeconds) {
        self.0.store(secs, Ordering::SeqCst);
    }
}

impl TimeSource for FixedTime {
    fn now_secs(&self) -> UnixSeconds {
        self.0.load(Ordering::SeqCst)
    }
}

struct Harness {
    app: Router,
    state: Arc<AppState<MemoryStore>>,
    time: Arc<FixedTime>,
}

fn harness() -> Harness {
    let time = FixedTime::at(1000);
    let state = Arc::new(AppState::with_time_source(
        MemoryStore::new(),
        Settings::default(),
        time.clone(),
    ));
    let app = create_router(Arc::clone(&state));
    Harness { app, state, time }
}

fn user(name: &str) -> CurrentUser {
    CurrentUser {
        id: UserId::from(name),
        is_admin: false,
    }
}

fn admin(name: &str) -> CurrentUser {
    CurrentUser {
        id: UserId::from(name),
        is_admin: true,
    }
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str, identity: Option<CurrentUser>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(identity) = identity {
        builder = builder.extension(identity);
    }
    builder.body(Body::empty()).unwrap()
}

fn get_programmatic(uri: &str, identity: Option<CurrentUser>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .header("x-requested-with", "XMLHttpRequest");
    if let Some(identity) = identity {
        builder = builder.extension(identity);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn anonymous_profile_load_shows_no_prompt() {
    let h = harness();

    let response = h.app.oneshot(get("/profile", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["show_prompt"], false);
    assert!(body["password_hint"].as_str().unwrap().contains("22"));
}

#[tokio::test]
async fn stale_user_is_redirected_off_interactive_pages() {
    let h = harness();
    h.state.clock.arm_rotation_requirement().await.unwrap();

    let response = h
        .app
        .oneshot(get("/rotation/status", Some(user("alice"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/profile?force_password_change=1"
    );
}

#[tokio::test]
async fn programmatic_requests_are_never_redirected() {
    let h = harness();
    h.state.clock.arm_rotation_requirement().await.unwrap();

    let response = h
        .app
        .oneshot(get_programmatic("/rotation/status", Some(user("alice"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["rotation_required"], true);
}

#[tokio::test]
async fn profile_page_stays_reachable_and_prompts_with_marker() {
    let h = harness();
    h.state.clock.arm_rotation_requirement().await.unwrap();

    // allowed through without the marker, no prompt
    let response = h
        .app
        .clone()
        .oneshot(get("/profile", Some(user("alice"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["show_prompt"], false);

    // the redirect target renders the prompt
    let response = h
        .app
        .oneshot(get(
            "/profile?force_password_change=1",
            Some(user("alice")),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["show_prompt"], true);
}

#[tokio::test]
async fn weak_password_is_rejected_with_all_violations() {
    let h = harness();

    let request = Request::builder()
        .method("POST")
        .uri("/password/change")
        .header(header::CONTENT_TYPE, "application/json")
        .extension(user("alice"))
        .body(Body::from(r#"{"password":"aaaaaaaaaaaaaaaaaaaaaa"}"#))
        .unwrap();

    let response = h.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = json_body(response).await;
    let violations = body["error"]["violations"].as_array().unwrap();
    assert_eq!(violations.len(), 3);
    assert!(violations.contains(&serde_json::json!("missing_uppercase")));
    assert!(violations.contains(&serde_json::json!("missing_digit")));
    assert!(violations.contains(&serde_json::json!("missing_special")));
}

#[tokio::test]
async fn empty_password_is_a_bad_request_not_a_violation() {
    let h = harness();

    let request = Request::builder()
        .method("POST")
        .uri("/password/change")
        .header(header::CONTENT_TYPE, "application/json")
        .extension(user("alice"))
        .body(Body::from(r#"{"password":""}"#))
        .unwrap();

    let response = h.app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn successful_change_clears_the_requirement() {
    let h = harness();
    h.state.clock.arm_rotation_requirement().await.unwrap();
    h.time.set(2000);

    // a plain interactive form post: the change endpoint is exempt, so a
    // stale user can always reach it
    let request = Request::builder()
        .method("POST")
        .uri("/password/change")
        .header(header::CONTENT_TYPE, "application/json")
        .extension(user("alice"))
        .body(Body::from(
            r#"{"password":"Correct-Horse-Battery-Staple-99"}"#,
        ))
        .unwrap();

    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = h
        .app
        .oneshot(get_programmatic("/rotation/status", Some(user("alice"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["rotation_required"], false);
}

#[tokio::test]
async fn admin_rearm_flow_reapplies_the_requirement() {
    let h = harness();
    h.state.clock.arm_rotation_requirement().await.unwrap();

    // alice rotates at t=2000 and is fresh
    h.time.set(2000);
    h.state
        .clock
        .record_password_changed(&UserId::from("alice"))
        .await
        .unwrap();

    // admin fetches the form to get a nonce
    let response = h
        .app
        .clone()
        .oneshot(get_programmatic("/admin/rearm", Some(admin("root"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let nonce = json_body(response).await["nonce"].as_str().unwrap().to_string();

    // re-arm at t=3000
    h.time.set(3000);
    let request = Request::builder()
        .method("POST")
        .uri("/admin/rearm")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("x-requested-with", "XMLHttpRequest")
        .extension(admin("root"))
        .body(Body::from(format!("nonce={nonce}")))
        .unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/admin/rearm?forced=1"
    );

    // alice is stale again
    let response = h
        .app
        .oneshot(get_programmatic("/rotation/status", Some(user("alice"))))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["rotation_required"], true);
}

#[tokio::test]
async fn non_admin_cannot_rearm() {
    let h = harness();

    // the form never hands a nonce to a regular user
    let response = h
        .app
        .clone()
        .oneshot(get_programmatic("/admin/rearm", Some(user("alice"))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // and a forged POST fails without arming anything
    let request = Request::builder()
        .method("POST")
        .uri("/admin/rearm")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("x-requested-with", "XMLHttpRequest")
        .extension(user("alice"))
        .body(Body::from("nonce=forged"))
        .unwrap();
    let response = h.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = h
        .app
        .oneshot(get_programmatic("/rotation/status", Some(user("alice"))))
        .await
        .unwrap();
    assert_eq!(json_body(response).await["rotation_required"], false);
}
