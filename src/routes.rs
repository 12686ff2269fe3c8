// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{analysis, quiz, results},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public: quiz listing/reading, leaderboards and statistics.
/// * Authenticated: submission and reading one's own results.
/// * Admin: quiz authoring, guarded deletion and the full result listing.
/// * Global middleware: Trace, CORS.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let quiz_routes = Router::new()
        .route("/", get(quiz::list_quizzes))
        .route("/{id}", get(quiz::get_public_quiz));

    let result_routes = Router::new()
        .route("/", post(results::submit_quiz))
        .route("/{id}", get(results::get_result))
        .route("/{id}/answers", get(results::get_result_answers))
        .route("/user/{user_id}", get(results::get_user_results))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    let analysis_routes = Router::new()
        .route("/rankings", get(analysis::get_rankings))
        .route("/rankings/category/{category}", get(analysis::get_rankings_by_category))
        .route("/rankings/jobrole/{role}", get(analysis::get_rankings_by_category))
        .route("/categories", get(analysis::get_categories))
        .route("/statistics", get(analysis::get_statistics))
        .route("/statistics/category/{category}", get(analysis::get_category_statistics))
        .route("/statistics/jobrole/{role}", get(analysis::get_category_statistics));

    let admin_routes = Router::new()
        .route("/quizzes", get(quiz::list_quizzes).post(quiz::create_quiz))
        .route(
            "/quizzes/{id}",
            get(quiz::get_quiz)
                .put(quiz::update_quiz)
                .delete(quiz::delete_quiz),
        )
        .route("/questions/{id}", delete(quiz::delete_question))
        .route("/results", get(results::list_all_results))
        // Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/results", result_routes)
        .nest("/api/analysis", analysis_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
