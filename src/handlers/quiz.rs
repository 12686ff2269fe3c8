// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    catalog,
    error::AppError,
    models::quiz::{CreateQuizRequest, UpdateQuizRequest},
};

/// Lists every quiz with its question count.
pub async fn list_quizzes(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let mut conn = pool.acquire().await?;
    let quizzes = catalog::list_quizzes(&mut *conn).await?;
    Ok(Json(quizzes))
}

/// Retrieves a quiz as a learner sees it: options without correct answers.
pub async fn get_public_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = pool.acquire().await?;
    let quiz = catalog::get_public_quiz(&mut *conn, id).await?;
    Ok(Json(quiz))
}

/// Full quiz definition including correct answers.
/// Admin only.
pub async fn get_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = pool.acquire().await?;
    let quiz = catalog::get_quiz(&mut *conn, id).await?;
    Ok(Json(quiz))
}

/// Creates a quiz with its questions and options in one transaction.
/// Admin only.
pub async fn create_quiz(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;
    let quiz = catalog::create_quiz(&mut *tx, payload).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// Updates quiz metadata. Fields are optional.
/// Admin only.
pub async fn update_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;
    let summary = catalog::update_quiz(&mut *tx, id, payload).await?;
    tx.commit().await?;

    Ok(Json(summary))
}

/// Deletes a quiz that nobody has answered yet.
/// Admin only.
pub async fn delete_quiz(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;
    catalog::delete_quiz(&mut *tx, id).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Deletes a question that nobody has answered yet.
/// Admin only.
pub async fn delete_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let mut tx = pool.begin().await?;
    catalog::delete_question(&mut *tx, id).await?;
    tx.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
