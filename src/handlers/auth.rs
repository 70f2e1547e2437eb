use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use serde_json::json;

use crate::{
    db::models::AuthUser,
    extractors::AuthGuard,
    models, names,
    rejections::{AppError, ResultExt},
    utils, AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/profile", get(profile))
}

fn user_payload(user: &AuthUser) -> serde_json::Value {
    json!({
        "id": user.id,
        "email": user.email,
        "full_name": user.full_name(),
        "role": user.role,
    })
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<models::Register>,
) -> Result<axum::response::Response, AppError> {
    use crate::services::auth::RegisterOutcome;

    let outcome = state
        .auth
        .register(
            &body.email,
            &body.password,
            &body.first_name,
            &body.last_name,
            body.role.as_deref(),
        )
        .await
        .reject("registration failed")?;

    match outcome {
        RegisterOutcome::LoggedIn(user, session_token) => {
            let cookie = utils::cookie(
                names::SESSION_COOKIE_NAME,
                &session_token,
                state.secure_cookies,
            )
            .reject("could not build session cookie")?;
            Ok((
                StatusCode::CREATED,
                [(SET_COOKIE, cookie)],
                Json(json!({ "success": true, "user": user_payload(&user) })),
            )
                .into_response())
        }
        RegisterOutcome::EmptyFields => Err(AppError::BadRequest("all fields are required")),
        RegisterOutcome::InvalidEmail => Err(AppError::BadRequest("invalid email address")),
        RegisterOutcome::WeakPassword => Err(AppError::BadRequest(
            "password must be at least 6 characters",
        )),
        RegisterOutcome::EmailTaken => Err(AppError::Conflict("email already registered")),
    }
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<models::Login>,
) -> Result<axum::response::Response, AppError> {
    use crate::services::auth::LoginOutcome;

    let outcome = state
        .auth
        .login(&body.email, &body.password)
        .await
        .reject("login failed")?;

    match outcome {
        LoginOutcome::Success(user, session_token) => {
            let cookie = utils::cookie(
                names::SESSION_COOKIE_NAME,
                &session_token,
                state.secure_cookies,
            )
            .reject("could not build session cookie")?;
            Ok((
                [(SET_COOKIE, cookie)],
                Json(json!({ "success": true, "user": user_payload(&user) })),
            )
                .into_response())
        }
        LoginOutcome::InvalidCredentials => Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "invalid email or password" })),
        )
            .into_response()),
    }
}

async fn logout(
    jar: CookieJar,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(session_id) = jar
        .get(names::SESSION_COOKIE_NAME)
        .map(|c| c.value().to_string())
    {
        let _ = state.auth.logout(&session_id).await;
    }

    let clear = utils::clear_cookie(names::SESSION_COOKIE_NAME, state.secure_cookies)
        .reject("could not build clear cookie")?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, clear);

    Ok((
        headers,
        Json(json!({ "success": true, "message": "logged out" })),
    ))
}

async fn profile(AuthGuard(user): AuthGuard) -> Json<serde_json::Value> {
    Json(json!({
        "id": user.id,
        "email": user.email,
        "first_name": user.first_name,
        "last_name": user.last_name,
        "full_name": user.full_name(),
        "role": user.role,
    }))
}
