use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::{
    db::models::AuthUser,
    db::AttemptMeta,
    extractors::{AdminGuard, AuthGuard, TeacherGuard},
    models, names, progress,
    rejections::{AppError, ResultExt},
    AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(service_info))
        .route("/api/passages", get(list_passages))
        .route("/api/passages/random", get(random_passage))
        .route("/api/passages/{id}", get(get_passage))
        .route("/api/recitations", post(submit_recitation))
        .route("/api/progress/me", get(my_progress))
        .route("/api/progress/student/{id}", get(student_progress))
        .route("/api/attempts/recent", get(recent_attempts))
        .route("/api/attempts/passage/{id}", get(passage_attempts))
        .route("/api/analysis/errors/{id}", get(error_analysis))
        .route("/api/settings", get(get_settings).post(update_settings))
        .route("/api/admin/students", get(list_students))
        .route("/api/admin/class-progress/{id}", get(class_progress))
}

/// Students may only look at their own data; teachers and admins may look at
/// any student's.
fn can_view_student(user: &AuthUser, student_id: i64) -> bool {
    user.is_teacher() || user.id == student_id
}

async fn service_info() -> Json<serde_json::Value> {
    Json(json!({ "name": "versecraft", "version": names::VERSION }))
}

async fn list_passages(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let passages = state
        .db
        .list_passages(false)
        .await
        .reject("could not list passages")?;
    Ok(Json(passages))
}

async fn random_passage(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    match state
        .db
        .random_passage()
        .await
        .reject("could not pick a passage")?
    {
        Some(passage) => Ok(Json(passage)),
        None => Err(AppError::NotFound("no passages available")),
    }
}

async fn get_passage(
    State(state): State<AppState>,
    Path(passage_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    match state
        .db
        .get_passage(passage_id)
        .await
        .reject("could not load passage")?
    {
        Some(passage) => Ok(Json(passage)),
        None => Err(AppError::NotFound("passage not found")),
    }
}

async fn submit_recitation(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    Json(body): Json<models::SubmitRecitation>,
) -> Result<impl IntoResponse, AppError> {
    let meta = AttemptMeta {
        time_spent_seconds: body.time_spent_seconds,
        used_speech_recognition: body.used_speech_recognition,
    };

    let (attempt_id, summary) = state
        .db
        .record_attempt(
            user.id,
            body.passage_id,
            &body.recitation,
            body.score,
            body.reference_text.as_deref(),
            &meta,
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "attemptId": attempt_id,
        "progress": summary,
    })))
}

async fn my_progress(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let rows = state
        .db
        .progress_for_student(user.id, None)
        .await
        .reject("could not load progress")?;
    let summaries = state
        .db
        .progress_rows(user.id)
        .await
        .reject("could not load progress summaries")?;
    let summary = progress::summarize(&summaries);

    Ok(Json(json!({ "progress": rows, "summary": summary })))
}

async fn student_progress(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !can_view_student(&user, student_id) {
        return Err(AppError::Forbidden);
    }

    let rows = state
        .db
        .progress_for_student(student_id, None)
        .await
        .reject("could not load progress")?;
    Ok(Json(rows))
}

async fn recent_attempts(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    Query(query): Query<models::RecentAttemptsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let limit = query
        .limit
        .unwrap_or(names::DEFAULT_RECENT_ATTEMPTS)
        .clamp(1, names::MAX_RECENT_ATTEMPTS);
    let attempts = state
        .db
        .recent_attempts(user.id, limit)
        .await
        .reject("could not load attempts")?;
    Ok(Json(attempts))
}

async fn passage_attempts(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    Path(passage_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = state
        .db
        .attempts_for_passage(user.id, passage_id)
        .await
        .reject("could not load attempts")?;
    Ok(Json(attempts))
}

async fn error_analysis(
    AuthGuard(user): AuthGuard,
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if !can_view_student(&user, student_id) {
        return Err(AppError::Forbidden);
    }

    let patterns = state
        .db
        .error_patterns(student_id)
        .await
        .reject("could not load error patterns")?;
    let problem_words = state
        .db
        .problem_words(student_id)
        .await
        .reject("could not load problem words")?;

    Ok(Json(json!({
        "error_patterns": patterns,
        "problem_words": problem_words,
    })))
}

async fn get_settings(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let settings = state
        .db
        .get_settings()
        .await
        .reject("could not load settings")?;
    let map: serde_json::Map<String, serde_json::Value> = settings
        .into_iter()
        .map(|s| (s.key, serde_json::Value::String(s.value)))
        .collect();
    Ok(Json(serde_json::Value::Object(map)))
}

async fn update_settings(
    AdminGuard(_): AdminGuard,
    State(state): State<AppState>,
    Json(body): Json<serde_json::Map<String, serde_json::Value>>,
) -> Result<impl IntoResponse, AppError> {
    for (key, value) in body {
        let value = match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        state
            .db
            .upsert_setting(&key, &value)
            .await
            .reject("could not store setting")?;
    }
    Ok(Json(json!({ "success": true })))
}

async fn list_students(
    TeacherGuard(_): TeacherGuard,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let students = state
        .db
        .list_students()
        .await
        .reject("could not list students")?;
    Ok(Json(students))
}

async fn class_progress(
    TeacherGuard(teacher): TeacherGuard,
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let owned = state
        .db
        .class_owned_by(class_id, teacher.id)
        .await
        .reject("could not check class ownership")?;
    if !owned {
        return Err(AppError::NotFound("class not found"));
    }

    let rows = state
        .db
        .class_progress(class_id)
        .await
        .reject("could not load class progress")?;
    Ok(Json(rows))
}
