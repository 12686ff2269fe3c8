// src/scoring/submission.rs

use std::collections::HashSet;

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        quiz::QuizDefinition,
        quiz_result::{NewAnswer, NewQuizResult, QuizResultSummary, SubmitQuizRequest},
    },
    repositories::{QuizReader, ResultWriter},
    scoring::grader::{grade, normalize_keys},
};

/// Grades every answer of a submission against the quiz definition.
///
/// Nothing is written here. Any bad question id or option key fails the
/// whole submission.
pub fn grade_submission(
    definition: &QuizDefinition,
    request: &SubmitQuizRequest,
) -> AppResult<NewQuizResult> {
    if definition.questions.is_empty() {
        return Err(AppError::InvalidSubmission(format!(
            "Quiz {} has no questions",
            definition.quiz.id
        )));
    }

    let mut seen = HashSet::with_capacity(request.answers.len());
    let mut answers = Vec::with_capacity(request.answers.len());
    let mut score: i32 = 0;

    for submitted in &request.answers {
        let question = definition.question(submitted.question_id).ok_or_else(|| {
            AppError::InvalidSubmission(format!(
                "Question {} does not belong to quiz {}",
                submitted.question_id, definition.quiz.id
            ))
        })?;

        if !seen.insert(question.id) {
            return Err(AppError::InvalidSubmission(format!(
                "Question {} is answered more than once",
                question.id
            )));
        }

        let selected = normalize_keys(&submitted.selected_options);
        let outcome = grade(question, &selected)?;

        score = checked_marks(definition, score.checked_add(outcome.marks_obtained))?;
        answers.push(NewAnswer {
            question_id: question.id,
            selected_options: selected,
            is_correct: outcome.is_correct,
            marks_obtained: outcome.marks_obtained,
        });
    }

    Ok(NewQuizResult {
        user_id: request.user_id.trim().to_string(),
        quiz_id: definition.quiz.id,
        score,
        total_marks: checked_marks(definition, definition.total_marks())?,
        time_taken: request.time_taken_seconds,
        answers,
    })
}

fn checked_marks(definition: &QuizDefinition, marks: Option<i32>) -> AppResult<i32> {
    marks.ok_or_else(|| {
        AppError::InvalidSubmission(format!(
            "Quiz {} has more marks than can be scored",
            definition.quiz.id
        ))
    })
}

/// Grades a submission and stores the result with all of its answers.
///
/// `store` is the caller's transaction. This function never commits; on any
/// error the caller drops the transaction and nothing of the submission
/// survives. Re-submitting creates a new, separate result.
pub async fn submit<S>(store: &mut S, request: SubmitQuizRequest) -> AppResult<QuizResultSummary>
where
    S: QuizReader + ResultWriter,
{
    request.validate()?;
    if request.user_id.trim().is_empty() {
        return Err(AppError::ValidationFailure("User id is required.".to_string()));
    }

    let definition = store
        .find_quiz_definition(request.quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", request.quiz_id)))?;

    let graded = grade_submission(&definition, &request)?;

    let stored = store.insert_result(&graded).await?;

    tracing::info!(
        "Stored result {} for user {} on quiz {}: {}/{}",
        stored.id,
        stored.user_id,
        stored.quiz_id,
        stored.score,
        stored.total_marks
    );

    Ok(stored.into())
}
