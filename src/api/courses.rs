use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::error::ApiError;
use crate::models::{Course, CoursePayload};
use crate::state::AppState;

/// Unparsable ids can never match a row.
fn course_id(path: Result<Path<u64>, PathRejection>) -> Result<u64, ApiError> {
    path.map(|Path(id)| id).map_err(|_| ApiError::NotFound)
}

fn course_payload(body: Result<Json<CoursePayload>, JsonRejection>) -> Result<CoursePayload, ApiError> {
    body.map(|Json(p)| p)
        .map_err(|rejection| ApiError::non_field(rejection.body_text()))
}

/// GET /courses/ - List all courses
pub async fn list_courses(State(state): State<AppState>) -> Json<Vec<Course>> {
    Json(state.courses.list())
}

/// POST /courses/ - Create a course
pub async fn create_course(
    State(state): State<AppState>,
    body: Result<Json<CoursePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Course>), ApiError> {
    let changes = course_payload(body)?
        .validate(false)
        .map_err(ApiError::Validation)?;

    let course = state.courses.create(changes)?;
    tracing::info!(id = course.id, "Created course");
    Ok((StatusCode::CREATED, Json(course)))
}

/// GET /courses/{id}/
pub async fn get_course(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<Json<Course>, ApiError> {
    let id = course_id(path)?;
    state.courses.get(id).map(Json).ok_or(ApiError::NotFound)
}

/// PATCH /courses/{id}/ - Update only the supplied fields
pub async fn update_course(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
    body: Result<Json<CoursePayload>, JsonRejection>,
) -> Result<Json<Course>, ApiError> {
    let id = course_id(path)?;
    if state.courses.get(id).is_none() {
        return Err(ApiError::NotFound);
    }

    let changes = course_payload(body)?
        .validate(true)
        .map_err(ApiError::Validation)?;

    let course = state.courses.update(id, changes)?.ok_or(ApiError::NotFound)?;
    tracing::info!(id, "Updated course");
    Ok(Json(course))
}

/// DELETE /courses/{id}/
pub async fn delete_course(
    State(state): State<AppState>,
    path: Result<Path<u64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = course_id(path)?;
    if state.courses.delete(id)? {
        tracing::info!(id, "Deleted course");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
