// src/handlers/results.rs

use axum::{
    Json,
    extract::{Extension, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::quiz_result::SubmitQuizRequest,
    scoring::{results, submission},
    utils::jwt::Claims,
};

/// Grades a quiz attempt and stores it.
///
/// * The token subject must match `userId` unless the caller is an admin.
/// * The result and every answer are written in one transaction; any failure
///   (or a dropped request) rolls the whole submission back.
pub async fn submit_quiz(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    claims.ensure_can_access(&payload.user_id)?;

    let mut tx = pool.begin().await?;
    let summary = submission::submit(&mut *tx, payload).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

/// Retrieves one stored result with its derived percentage.
pub async fn get_result(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = pool.acquire().await?;
    let result = results::get_result(&mut *conn, id).await?;
    claims.ensure_can_access(&result.user_id)?;

    Ok(Json(result))
}

/// Per-question breakdown of a stored result.
pub async fn get_result_answers(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = pool.acquire().await?;
    let result = results::get_result(&mut *conn, id).await?;
    claims.ensure_can_access(&result.user_id)?;

    let detail = results::answers_for(&mut *conn, &result).await?;
    Ok(Json(detail))
}

/// Every result of one user, newest first.
pub async fn get_user_results(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    claims.ensure_can_access(&user_id)?;

    let mut conn = pool.acquire().await?;
    let list = results::get_results_for_user(&mut *conn, &user_id).await?;
    Ok(Json(list))
}

/// Every stored result, newest first.
/// Admin only.
pub async fn list_all_results(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let mut conn = pool.acquire().await?;
    let list = results::get_all_results(&mut *conn).await?;
    Ok(Json(list))
}
