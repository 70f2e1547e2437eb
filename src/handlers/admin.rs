use axum::{
    extract::{Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde_json::json;

use crate::{
    extractors::{AdminGuard, TeacherGuard},
    models, names,
    rejections::{AppError, ResultExt},
    utils, AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/classes", get(list_classes).post(create_class))
        .route(
            "/admin/classes/{id}/students",
            get(class_students).post(add_student),
        )
        .route(
            "/admin/classes/{id}/students/{student_id}",
            delete(remove_student),
        )
        .route("/admin/passages", get(list_passages).post(create_passage))
        .route("/admin/passages/{id}", put(update_passage))
        .route("/admin/passages/{id}/deactivate", post(deactivate_passage))
        .route("/admin/reports/class-overview/{id}", get(class_overview))
        .route("/admin/reports/student-detail/{id}", get(student_detail))
        .route("/admin/export/class-data/{id}", get(export_class_data))
        .route("/admin/users", get(list_users))
        .route("/admin/users/{id}/toggle-active", post(toggle_user_active))
}

async fn list_classes(
    TeacherGuard(teacher): TeacherGuard,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let classes = state
        .db
        .classes_for_teacher(teacher.id)
        .await
        .reject("could not list classes")?;
    Ok(Json(classes))
}

async fn create_class(
    TeacherGuard(teacher): TeacherGuard,
    State(state): State<AppState>,
    Json(body): Json<models::CreateClass>,
) -> Result<impl IntoResponse, AppError> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("class name is required"));
    }

    let class_id = state
        .db
        .create_class(name, body.description.as_deref(), teacher.id)
        .await
        .reject("could not create class")?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "class_id": class_id })),
    ))
}

async fn class_students(
    TeacherGuard(teacher): TeacherGuard,
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let Some(class) = state
        .db
        .find_class(class_id, teacher.id)
        .await
        .reject("could not load class")?
    else {
        return Err(AppError::NotFound("class not found"));
    };

    let students = state
        .db
        .class_roster(class_id)
        .await
        .reject("could not load class roster")?;
    let available = state
        .db
        .available_students(class_id)
        .await
        .reject("could not load available students")?;

    Ok(Json(json!({
        "class": class,
        "students": students,
        "available_students": available,
    })))
}

async fn add_student(
    TeacherGuard(teacher): TeacherGuard,
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
    Json(body): Json<models::AddStudent>,
) -> Result<impl IntoResponse, AppError> {
    let owned = state
        .db
        .class_owned_by(class_id, teacher.id)
        .await
        .reject("could not check class ownership")?;
    if !owned {
        return Err(AppError::NotFound("class not found"));
    }

    let student = state
        .db
        .find_student(body.student_id)
        .await
        .reject("could not look up student")?;
    if student.is_none() {
        return Err(AppError::NotFound("student not found"));
    }

    let already_member = state
        .db
        .is_class_member(class_id, body.student_id)
        .await
        .reject("could not check membership")?;
    if already_member {
        return Err(AppError::Conflict("student is already in this class"));
    }

    state
        .db
        .add_student_to_class(class_id, body.student_id)
        .await
        .reject("could not add student to class")?;

    Ok(Json(json!({ "success": true })))
}

async fn remove_student(
    TeacherGuard(teacher): TeacherGuard,
    State(state): State<AppState>,
    Path((class_id, student_id)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, AppError> {
    let owned = state
        .db
        .class_owned_by(class_id, teacher.id)
        .await
        .reject("could not check class ownership")?;
    if !owned {
        return Err(AppError::NotFound("class not found"));
    }

    let removed = state
        .db
        .remove_student_from_class(class_id, student_id)
        .await
        .reject("could not remove student")?;
    if !removed {
        return Err(AppError::NotFound("student not in class"));
    }

    Ok(Json(json!({ "success": true })))
}

async fn list_passages(
    TeacherGuard(_): TeacherGuard,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let passages = state
        .db
        .list_passages(true)
        .await
        .reject("could not list passages")?;
    Ok(Json(passages))
}

async fn create_passage(
    TeacherGuard(_): TeacherGuard,
    State(state): State<AppState>,
    Json(body): Json<models::CreatePassage>,
) -> Result<impl IntoResponse, AppError> {
    let reference = body.reference.trim();
    let text = body.text.trim();
    if reference.is_empty() || text.is_empty() {
        return Err(AppError::BadRequest("reference and text are required"));
    }

    let translation = body.translation.as_deref().unwrap_or(names::DEFAULT_TRANSLATION);
    let difficulty = body.difficulty_level.unwrap_or(names::DEFAULT_DIFFICULTY);

    match state
        .db
        .create_passage(reference, text, translation, difficulty)
        .await
        .reject("could not create passage")?
    {
        Some(passage) => Ok((
            StatusCode::CREATED,
            Json(json!({ "success": true, "passage": passage })),
        )),
        None => Err(AppError::Conflict(
            "a passage with this reference already exists",
        )),
    }
}

async fn update_passage(
    TeacherGuard(_): TeacherGuard,
    State(state): State<AppState>,
    Path(passage_id): Path<i64>,
    Json(body): Json<models::UpdatePassage>,
) -> Result<impl IntoResponse, AppError> {
    match state
        .db
        .update_passage(
            passage_id,
            body.text.as_deref(),
            body.translation.as_deref(),
            body.difficulty_level,
        )
        .await
        .reject("could not update passage")?
    {
        Some(passage) => Ok(Json(json!({ "success": true, "passage": passage }))),
        None => Err(AppError::NotFound("passage not found")),
    }
}

async fn deactivate_passage(
    TeacherGuard(_): TeacherGuard,
    State(state): State<AppState>,
    Path(passage_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let deactivated = state
        .db
        .deactivate_passage(passage_id)
        .await
        .reject("could not deactivate passage")?;
    if !deactivated {
        return Err(AppError::NotFound("passage not found"));
    }
    Ok(Json(json!({ "success": true })))
}

async fn class_overview(
    TeacherGuard(teacher): TeacherGuard,
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let Some(class) = state
        .db
        .find_class(class_id, teacher.id)
        .await
        .reject("could not load class")?
    else {
        return Err(AppError::NotFound("class not found"));
    };

    let students = state
        .db
        .class_overview_students(class_id)
        .await
        .reject("could not load student progress")?;
    let passage_difficulty = state
        .db
        .passage_difficulty(class_id)
        .await
        .reject("could not load passage difficulty")?;
    let recent_activity = state
        .db
        .recent_activity(class_id)
        .await
        .reject("could not load recent activity")?;

    Ok(Json(json!({
        "class_info": class,
        "student_progress": students,
        "passage_difficulty": passage_difficulty,
        "recent_activity": recent_activity,
        "generated_at": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    })))
}

async fn student_detail(
    TeacherGuard(teacher): TeacherGuard,
    State(state): State<AppState>,
    Path(student_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let accessible = state
        .db
        .teacher_can_access_student(teacher.id, student_id)
        .await
        .reject("could not check student access")?;
    let student = state
        .db
        .find_student(student_id)
        .await
        .reject("could not look up student")?;

    let Some(student) = student.filter(|_| accessible) else {
        return Err(AppError::NotFound("student not found or access denied"));
    };

    let timeline = state
        .db
        .student_timeline(student_id)
        .await
        .reject("could not load timeline")?;
    let error_analysis = state
        .db
        .error_patterns(student_id)
        .await
        .reject("could not load error patterns")?;
    let performance = state
        .db
        .progress_for_student(student_id, None)
        .await
        .reject("could not load progress")?;

    Ok(Json(json!({
        "student": student,
        "progress_timeline": timeline,
        "error_analysis": error_analysis,
        "passage_performance": performance,
        "generated_at": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    })))
}

const EXPORT_HEADER: [&str; 10] = [
    "Student_First_Name",
    "Student_Last_Name",
    "Student_Email",
    "Passage_Reference",
    "Recitation",
    "Score",
    "Passed",
    "Attempt_Number",
    "Date_Time",
    "Used_Speech_Recognition",
];

async fn export_class_data(
    TeacherGuard(teacher): TeacherGuard,
    State(state): State<AppState>,
    Path(class_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let Some(class) = state
        .db
        .find_class(class_id, teacher.id)
        .await
        .reject("could not load class")?
    else {
        return Err(AppError::NotFound("class not found"));
    };

    let rows = state
        .db
        .export_rows(class_id)
        .await
        .reject("could not load export data")?;

    let data: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.first_name.clone(),
                r.last_name.clone(),
                r.email.clone(),
                r.reference.clone(),
                r.recitation.clone(),
                r.score.to_string(),
                i64::from(r.is_passing).to_string(),
                r.attempt_number.to_string(),
                r.created_at.clone(),
                i64::from(r.used_speech_recognition).to_string(),
            ]
        })
        .collect();
    let csv = utils::render_csv(&EXPORT_HEADER, &data);

    let disposition = format!("attachment; filename=\"class_{}_data.csv\"", class.name);
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/csv"));
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .map_err(|_| AppError::Internal("could not build download header"))?,
    );

    Ok((headers, csv))
}

async fn list_users(
    AdminGuard(_): AdminGuard,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let users = state.db.list_users().await.reject("could not list users")?;
    Ok(Json(users))
}

async fn toggle_user_active(
    AdminGuard(_): AdminGuard,
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    match state
        .db
        .toggle_user_active(user_id)
        .await
        .reject("could not toggle user")?
    {
        Some(is_active) => {
            let message = if is_active {
                "user activated"
            } else {
                "user deactivated"
            };
            Ok(Json(json!({
                "success": true,
                "message": message,
                "is_active": is_active,
            })))
        }
        None => Err(AppError::NotFound("user not found")),
    }
}
