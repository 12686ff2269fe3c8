// src/models/quiz_result.rs

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::scoring::percentage;

/// Represents the 'quiz_results' table in the database.
/// Written once per submission, never updated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub id: i64,
    pub user_id: String,
    pub quiz_id: i64,
    pub score: i32,
    /// Snapshot of the quiz's total marks at submission time.
    pub total_marks: i32,
    pub submission_time: chrono::DateTime<chrono::Utc>,
    /// Seconds.
    pub time_taken: i32,
}

/// An answer row joined with its selected option keys.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: i64,
    pub quiz_result_id: i64,
    pub question_id: i64,
    pub selected_options: Vec<String>,
    pub is_correct: bool,
    pub marks_obtained: i32,
}

/// A graded answer waiting to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnswer {
    pub question_id: i64,
    pub selected_options: BTreeSet<String>,
    pub is_correct: bool,
    pub marks_obtained: i32,
}

/// A graded submission waiting to be written as one unit.
#[derive(Debug, Clone)]
pub struct NewQuizResult {
    pub user_id: String,
    pub quiz_id: i64,
    pub score: i32,
    pub total_marks: i32,
    pub time_taken: i32,
    pub answers: Vec<NewAnswer>,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizRequest {
    #[validate(length(min = 1, max = 450, message = "User id is required."))]
    pub user_id: String,

    #[validate(range(min = 1, message = "Quiz id is required."))]
    pub quiz_id: i64,

    #[validate(range(min = 0, message = "Time taken cannot be negative."))]
    #[serde(alias = "timeTaken")]
    pub time_taken_seconds: i32,

    #[validate(length(min = 1, message = "At least one answer is required."))]
    pub answers: Vec<SubmittedAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedAnswer {
    pub question_id: i64,
    #[serde(default)]
    pub selected_options: Vec<String>,
}

/// What callers get back for a stored result. Percentage is derived, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResultSummary {
    pub id: i64,
    pub user_id: String,
    pub quiz_id: i64,
    pub score: i32,
    pub total_marks: i32,
    pub percentage: f64,
    pub submission_time: chrono::DateTime<chrono::Utc>,
    pub time_taken: i32,
}

impl From<QuizResult> for QuizResultSummary {
    fn from(result: QuizResult) -> Self {
        Self {
            id: result.id,
            user_id: result.user_id,
            quiz_id: result.quiz_id,
            score: result.score,
            total_marks: result.total_marks,
            percentage: percentage(result.score, result.total_marks),
            submission_time: result.submission_time,
            time_taken: result.time_taken,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDetail {
    pub question_id: i64,
    pub selected_options: Vec<String>,
    pub is_correct: bool,
    pub marks_obtained: i32,
}

impl From<Answer> for AnswerDetail {
    fn from(answer: Answer) -> Self {
        Self {
            question_id: answer.question_id,
            selected_options: answer.selected_options,
            is_correct: answer.is_correct,
            marks_obtained: answer.marks_obtained,
        }
    }
}

/// Per-answer breakdown of one stored result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultAnswers {
    pub result_id: i64,
    pub answers: Vec<AnswerDetail>,
}
