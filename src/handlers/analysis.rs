// src/handlers/analysis.rs

//! Leaderboards and statistics. Read-only; everything is recomputed from the
//! stored results on each request.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{error::AppError, scoring::ranking};

pub async fn get_rankings(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let mut conn = pool.acquire().await?;
    let rankings = ranking::rank_all(&mut *conn).await?;
    Ok(Json(rankings))
}

/// Leaderboard of one job category. Also served under `/jobrole/{role}`.
pub async fn get_rankings_by_category(
    State(pool): State<PgPool>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = pool.acquire().await?;
    let rankings = ranking::rank_by_scope(&mut *conn, &category).await?;
    Ok(Json(rankings))
}

pub async fn get_categories(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let mut conn = pool.acquire().await?;
    let categories = ranking::available_scopes(&mut *conn).await?;
    Ok(Json(categories))
}

pub async fn get_statistics(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let mut conn = pool.acquire().await?;
    let stats = ranking::statistics(&mut *conn).await?;
    Ok(Json(stats))
}

pub async fn get_category_statistics(
    State(pool): State<PgPool>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = pool.acquire().await?;
    let stats = ranking::scope_statistics(&mut *conn, &category).await?;
    Ok(Json(stats))
}
