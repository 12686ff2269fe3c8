// src/repositories/mod.rs

//! Storage seams of the scoring core.
//!
//! Every trait takes `&mut self` so one implementation can be a live
//! connection or an open transaction; the caller decides the boundary.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{
        quiz::{CreateQuizRequest, QuizDefinition, QuizSummary, UpdateQuizRequest},
        quiz_result::{Answer, NewQuizResult, QuizResult},
        ranking::ScopedResult,
    },
};

pub mod postgres;

/// Authoritative quiz definitions, including correct answers.
#[async_trait]
pub trait QuizReader: Send {
    async fn find_quiz_definition(&mut self, quiz_id: i64) -> AppResult<Option<QuizDefinition>>;
}

/// Writes a result and all of its answers. Implementations must write the
/// whole aggregate through the same connection so a surrounding transaction
/// covers it.
#[async_trait]
pub trait ResultWriter: Send {
    async fn insert_result(&mut self, result: &NewQuizResult) -> AppResult<QuizResult>;
}

/// Read side over stored results.
#[async_trait]
pub trait ResultReader: Send {
    /// Results joined with their quiz, optionally limited to one category.
    async fn list_scoped_results(&mut self, category: Option<&str>)
    -> AppResult<Vec<ScopedResult>>;

    async fn find_result(&mut self, result_id: i64) -> AppResult<Option<QuizResult>>;

    async fn list_results_for_user(&mut self, user_id: &str) -> AppResult<Vec<QuizResult>>;

    async fn list_all_results(&mut self) -> AppResult<Vec<QuizResult>>;

    async fn list_answers(&mut self, result_id: i64) -> AppResult<Vec<Answer>>;

    /// Distinct quiz categories, sorted.
    async fn list_categories(&mut self) -> AppResult<Vec<String>>;
}

/// Maps user ids to display names. Unknown ids are simply absent.
#[async_trait]
pub trait DisplayNameResolver: Send {
    async fn display_names(&mut self, user_ids: &[String]) -> AppResult<HashMap<String, String>>;
}

/// Quiz authoring operations.
#[async_trait]
pub trait QuizCatalog: Send {
    async fn quiz_name_taken(&mut self, name: &str, except_id: Option<i64>) -> AppResult<bool>;

    /// Expects an already validated and normalized request.
    async fn insert_quiz(&mut self, quiz: &CreateQuizRequest) -> AppResult<QuizDefinition>;

    async fn list_quizzes(&mut self) -> AppResult<Vec<QuizSummary>>;

    /// Returns false when the quiz does not exist.
    async fn update_quiz(&mut self, quiz_id: i64, patch: &UpdateQuizRequest) -> AppResult<bool>;

    async fn count_answers_for_quiz(&mut self, quiz_id: i64) -> AppResult<i64>;

    async fn count_answers_for_question(&mut self, question_id: i64) -> AppResult<i64>;

    /// Returns false when the quiz does not exist.
    async fn delete_quiz(&mut self, quiz_id: i64) -> AppResult<bool>;

    /// Returns false when the question does not exist.
    async fn delete_question(&mut self, question_id: i64) -> AppResult<bool>;
}
