//! Registration, login and logout through the HTTP surface.

mod common;

use axum::http::{Method, StatusCode};
use axum_session_todo::session::SessionStore;
use common::*;
use serde_json::json;

#[tokio::test]
async fn register_rejects_short_password_and_accepts_valid_one() {
    let app = spawn_app().await;

    let response = app
        .send(form_post(
            "/register",
            "name=A&email=a%40x.com&username=alice&password=se",
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "validation");
    assert_eq!(body["message"], "password length should be 3-20");

    let response = app
        .send(form_post(
            "/register",
            "name=A&email=a%40x.com&username=alice&password=secret1",
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn register_reports_duplicates() {
    let app = spawn_app().await;
    assert_eq!(app.register("alice", "secret1").await.status(), StatusCode::SEE_OTHER);

    // same email, different username
    let response = app
        .send(form_post(
            "/register",
            "name=B&email=ALICE%40x.com&username=alice2&password=secret1",
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "conflict");
    assert_eq!(body["message"], "Email already exists");

    let response = app
        .send(form_post(
            "/register",
            "name=B&email=other%40x.com&username=alice&password=secret1",
            None,
        ))
        .await;
    let body = body_json(response).await;
    assert_eq!(body["message"], "Username already exists");
}

#[tokio::test]
async fn login_with_wrong_password_fails() {
    let app = spawn_app().await;
    app.register("alice", "secret1").await;

    let response = app.login("alice", "wrong").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(session_cookie(&response).is_none());
    let body = body_json(response).await;
    assert_eq!(body["message"], "Wrong Password");
    assert_eq!(body["error"], "invalid_credentials");
}

#[tokio::test]
async fn login_with_unknown_user_or_missing_fields_fails() {
    let app = spawn_app().await;

    let body = body_json(app.login("ghost", "secret1").await).await;
    assert_eq!(body["status"], 400);
    assert_eq!(body["message"], "User Not Found Invalid Credentials");

    let response = app
        .send(form_post("/login", "loginId=&password=secret1", None))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["message"],
        "Fields should not be empty"
    );
}

#[tokio::test]
async fn login_establishes_authenticated_session() {
    let app = spawn_app().await;
    app.register("alice", "secret1").await;

    let response = app.login("alice", "secret1").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/dashboard"));
    let cookie = session_cookie(&response).expect("session cookie");

    let session_id = cookie.trim_start_matches("todo.sid=");
    let session = app
        .state
        .sessions
        .load(session_id, chrono::Utc::now())
        .await
        .unwrap()
        .expect("stored session");
    assert!(session.is_auth);
    assert_eq!(session.user_data.unwrap().username, "alice");

    let response = app.send(get("/dashboard", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains(r#"<form id="create_form">"#));
    for endpoint in ["/create-item", "/read-item?skip=", "/edit-item", "/delete-item"] {
        assert!(page.contains(endpoint), "dashboard never calls {endpoint}");
    }
}

#[tokio::test]
async fn relogin_rotates_the_session_and_drops_its_access_record() {
    let app = spawn_app().await;
    let old = app.signed_in("alice").await;
    let old_id = old.trim_start_matches("todo.sid=").to_string();
    let response = app
        .send(json_request(
            Method::POST,
            "/create-item",
            json!({ "todo": "Buy eggs" }),
            Some(&old),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(app.state.throttle.last_access(&old_id).await.unwrap().is_some());

    let response = app
        .send(form_post("/login", "loginId=alice&password=secret1", Some(&old)))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let fresh = session_cookie(&response).expect("new session cookie");
    assert_ne!(fresh, old);

    assert_eq!(app.state.throttle.last_access(&old_id).await.unwrap(), None);
    let response = app.send(get("/dashboard", Some(&old))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let response = app.send(get("/dashboard", Some(&fresh))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn expired_sessions_are_purged_with_their_access_records() {
    let app = spawn_app().await;
    let cookie = app.signed_in("alice").await;
    let session_id = cookie.trim_start_matches("todo.sid=").to_string();
    let response = app
        .send(json_request(
            Method::POST,
            "/create-item",
            json!({ "todo": "Buy eggs" }),
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // nothing has expired yet
    assert_eq!(app.state.purge_expired_sessions(chrono::Utc::now()).await.unwrap(), 0);
    assert!(app.state.throttle.last_access(&session_id).await.unwrap().is_some());

    let past_ttl = chrono::Utc::now() + app.state.config.session_ttl + chrono::Duration::minutes(1);
    assert_eq!(app.state.purge_expired_sessions(past_ttl).await.unwrap(), 1);
    assert_eq!(app.state.throttle.last_access(&session_id).await.unwrap(), None);
    assert!(app
        .state
        .sessions
        .load(&session_id, chrono::Utc::now())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn login_accepts_email_in_any_case() {
    let app = spawn_app().await;
    app.register("alice", "secret1").await;

    let response = app.login("Alice%40X.com", "secret1").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(session_cookie(&response).is_some());
}

#[tokio::test]
async fn dashboard_requires_session() {
    let app = spawn_app().await;

    let response = app.send(get("/dashboard", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Session Expired, please login again");

    let response = app
        .send(get("/dashboard", Some("todo.sid=forged-session-id")))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_destroys_the_session() {
    let app = spawn_app().await;
    let cookie = app.signed_in("alice").await;

    let response = app.send(form_post("/logout", "", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));

    let response = app.send(get("/dashboard", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_from_all_devices_ends_every_session_of_the_user() {
    let app = spawn_app().await;
    let laptop = app.signed_in("alice").await;
    let phone = session_cookie(&app.login("alice", "secret1").await).unwrap();
    let bob = app.signed_in("bob").await;

    let response = app
        .send(form_post("/logout_from_all_devices", "", Some(&laptop)))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    for cookie in [&laptop, &phone] {
        let response = app.send(get("/dashboard", Some(cookie))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    let response = app.send(get("/dashboard", Some(&bob))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn logout_requires_session() {
    let app = spawn_app().await;
    let response = app
        .send(json_request(Method::POST, "/logout", json!({}), None))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_check_reports_ok() {
    let app = spawn_app().await;
    let response = app.send(get("/", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], 200);
}
