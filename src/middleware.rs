use std::sync::Arc;

use axum::{
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;

use crate::{
    error::AppError,
    model::{CurrentUser, Session},
    AppState,
};

/// Loads the session named by the cookie (or an anonymous one) into the
/// request extensions. Runs for every request.
pub async fn load_session<B>(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request<B>,
    next: Next<B>,
) -> Result<Response, AppError> {
    let session = match jar.get(&state.config.session_cookie) {
        Some(cookie) => state
            .sessions
            .load(cookie.value(), Utc::now())
            .await?
            .unwrap_or_else(Session::anonymous),
        None => Session::anonymous(),
    };

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

/// Admits only authenticated sessions. No store access: it trusts the
/// snapshot captured at login.
pub fn authorize(session: &Session) -> Result<CurrentUser, AppError> {
    match (session.is_auth, &session.id, &session.user_data) {
        (true, Some(id), Some(user)) => Ok(CurrentUser {
            session_id: id.clone(),
            user: user.clone(),
        }),
        _ => Err(AppError::Unauthenticated),
    }
}

pub async fn mw_require_auth<B>(
    mut request: Request<B>,
    next: Next<B>,
) -> Result<Response, AppError> {
    let current_user = match request.extensions().get::<Session>() {
        Some(session) => authorize(session)?,
        None => return Err(AppError::Unauthenticated),
    };

    request.extensions_mut().insert(current_user);
    Ok(next.run(request).await)
}

/// Per-session throttle; must run inside `mw_require_auth`.
pub async fn mw_rate_limit<B>(
    State(state): State<Arc<AppState>>,
    request: Request<B>,
    next: Next<B>,
) -> Result<Response, AppError> {
    let session_id = request
        .extensions()
        .get::<CurrentUser>()
        .map(|user| user.session_id.clone())
        .ok_or(AppError::Unauthenticated)?;

    state.throttle.check(&session_id).await?;
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserSnapshot;
    use chrono::Duration;

    fn alice() -> UserSnapshot {
        UserSnapshot {
            id: 1,
            email: "a@x.com".into(),
            username: "alice".into(),
        }
    }

    #[test]
    fn authenticated_session_passes() {
        let session =
            Session::authenticated("s1".into(), alice(), Utc::now() + Duration::hours(1));
        let user = authorize(&session).unwrap();
        assert_eq!(user.username(), "alice");
        assert_eq!(user.session_id, "s1");
    }

    #[test]
    fn anonymous_session_is_rejected() {
        assert!(matches!(
            authorize(&Session::anonymous()),
            Err(AppError::Unauthenticated)
        ));
    }

    #[test]
    fn auth_flag_without_user_is_rejected() {
        let mut session =
            Session::authenticated("s1".into(), alice(), Utc::now() + Duration::hours(1));
        session.user_data = None;
        assert!(authorize(&session).is_err());

        let mut session =
            Session::authenticated("s1".into(), alice(), Utc::now() + Duration::hours(1));
        session.is_auth = false;
        assert!(authorize(&session).is_err());
    }
}
