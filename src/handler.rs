use std::sync::Arc;

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Redirect},
    Extension, Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    model::{CurrentUser, Session, UserSnapshot},
    pages,
    password::{hash_password, verify_password},
    schema::{
        CreateTodoSchema, DeleteTodoSchema, EditTodoSchema, LoginSchema, ReadTodoQuery,
        RegisterSchema,
    },
    session::{generate_session_id, removal_cookie, session_cookie},
    validation, AppState,
};

// Success envelope; the HTTP status mirrors `status`
fn envelope<T: Serialize>(status: StatusCode, message: &str, data: T) -> (StatusCode, Json<Value>) {
    let body = json!({
        "status": status.as_u16(),
        "message": message,
        "data": data,
    });
    (status, Json(body))
}

fn bad_body(rejection: impl std::fmt::Display) -> AppError {
    AppError::Validation(format!("Malformed request body: {rejection}"))
}

// Handler for the health checker route
pub async fn health_checker_handler(
    State(data): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    sqlx::query("SELECT 1").execute(&data.db).await?;

    let json_response = json!({
        "status": StatusCode::OK.as_u16(),
        "message": "Session todo service is running",
    });
    Ok(Json(json_response))
}

pub async fn register_page() -> Html<&'static str> {
    Html(pages::REGISTER_PAGE)
}

pub async fn login_page() -> Html<&'static str> {
    Html(pages::LOGIN_PAGE)
}

pub async fn dashboard_page() -> Html<&'static str> {
    Html(pages::DASHBOARD_PAGE)
}

pub async fn register(
    State(data): State<Arc<AppState>>,
    body: Result<Form<RegisterSchema>, FormRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Form(body) = body.map_err(bad_body)?;
    let registration = validation::registration(&body)?;

    if data.users.find_by_email(&registration.email).await?.is_some() {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }
    if data
        .users
        .find_by_username(&registration.username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    // argon2 is CPU bound
    let password = registration.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let user = data.users.create(&registration, &password_hash).await?;
    tracing::info!(user_id = user.id, username = %user.username, "user registered");

    Ok(Redirect::to("/login"))
}

pub async fn login(
    State(data): State<Arc<AppState>>,
    Extension(current): Extension<Session>,
    jar: CookieJar,
    body: Result<Form<LoginSchema>, FormRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Form(body) = body.map_err(bad_body)?;
    let (login_id, password) = match (body.login_id, body.password) {
        (Some(login_id), Some(password)) if !login_id.is_empty() && !password.is_empty() => {
            (login_id, password)
        }
        _ => {
            return Err(AppError::Validation(
                "Fields should not be empty".to_string(),
            ))
        }
    };

    let found = if validation::is_email(&login_id) {
        data.users.find_by_email(&login_id).await?
    } else {
        data.users.find_by_username(&login_id).await?
    };
    let user = found.ok_or(AppError::UserNotFound)?;

    let stored_hash = user.password.clone();
    let matched = tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;
    if !matched {
        tracing::info!(username = %user.username, "login rejected: wrong password");
        return Err(AppError::WrongPassword);
    }

    // fresh id on every login
    if let Some(old_id) = current.id.as_deref() {
        data.sessions.destroy(old_id).await?;
        data.throttle.forget(old_id).await?;
    }

    let session = Session::authenticated(
        generate_session_id()?,
        UserSnapshot::from(&user),
        Utc::now() + data.config.session_ttl,
    );
    data.sessions.save(&session).await?;
    tracing::info!(username = %user.username, "user logged in");

    let session_id = session.id.unwrap_or_default();
    let jar = jar.add(session_cookie(&data.config.session_cookie, &session_id));
    Ok((jar, Redirect::to("/dashboard")))
}

pub async fn logout(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    data.sessions.destroy(&user.session_id).await?;
    data.throttle.forget(&user.session_id).await?;
    tracing::info!(username = %user.username(), "user logged out");

    let jar = jar.remove(removal_cookie(&data.config.session_cookie));
    Ok((jar, Redirect::to("/login")))
}

pub async fn logout_from_all_devices(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let removed = data.sessions.destroy_for_user(user.username()).await?;
    for session_id in &removed {
        data.throttle.forget(session_id).await?;
    }
    tracing::info!(
        username = %user.username(),
        sessions = removed.len(),
        "user logged out from all devices"
    );

    let jar = jar.remove(removal_cookie(&data.config.session_cookie));
    Ok((jar, Redirect::to("/login")))
}

// Handler for creating a new Todo
pub async fn create_item(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    body: Result<Json<CreateTodoSchema>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body.map_err(bad_body)?;
    let text = validation::todo_text(body.todo.as_ref())?;

    let todo = data.todos.create(&text, user.username()).await?;
    Ok(envelope(StatusCode::CREATED, "Todo created successfully", todo))
}

// Handler for reading one page of the caller's Todos
pub async fn read_item(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    query: Result<Query<ReadTodoQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let skip = match query {
        Ok(Query(query)) => validation::skip(query.skip.as_deref())?,
        Err(_) => 0,
    };

    let todos = data.todos.list(user.username(), skip).await?;
    Ok(envelope(StatusCode::OK, "Todo read successfully", todos))
}

// Handler for editing a Todo; responds with the record as it was before
pub async fn edit_item(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    body: Result<Json<EditTodoSchema>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body.map_err(bad_body)?;
    let id = body
        .id
        .ok_or_else(|| AppError::Validation("Todo id is required".to_string()))?;
    let new_text = validation::todo_text(body.new_text.as_ref())?;

    let previous = data.todos.update(id, &new_text, user.username()).await?;
    Ok(envelope(StatusCode::OK, "Todo updated successfully", previous))
}

// Handler for deleting a Todo
pub async fn delete_item(
    State(data): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    body: Result<Json<DeleteTodoSchema>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = body.map_err(bad_body)?;
    let id = body
        .id
        .ok_or_else(|| AppError::Validation("Todo id is required".to_string()))?;

    let deleted = data.todos.delete(id, user.username()).await?;
    Ok(envelope(
        StatusCode::OK,
        "Todo deleted successfully",
        json!({ "acknowledged": true, "deletedCount": deleted }),
    ))
}
