// src/scoring/results.rs

use crate::{
    error::{AppError, AppResult},
    models::quiz_result::{AnswerDetail, QuizResultSummary, ResultAnswers},
    repositories::ResultReader,
};

pub async fn get_result<S>(store: &mut S, result_id: i64) -> AppResult<QuizResultSummary>
where
    S: ResultReader,
{
    store
        .find_result(result_id)
        .await?
        .map(QuizResultSummary::from)
        .ok_or_else(|| AppError::NotFound(format!("Quiz result {} not found", result_id)))
}

/// Newest first.
pub async fn get_results_for_user<S>(store: &mut S, user_id: &str) -> AppResult<Vec<QuizResultSummary>>
where
    S: ResultReader,
{
    let results = store.list_results_for_user(user_id.trim()).await?;
    Ok(results.into_iter().map(QuizResultSummary::from).collect())
}

pub async fn get_all_results<S>(store: &mut S) -> AppResult<Vec<QuizResultSummary>>
where
    S: ResultReader,
{
    let results = store.list_all_results().await?;
    Ok(results.into_iter().map(QuizResultSummary::from).collect())
}

/// Per-answer breakdown of a result.
pub async fn get_answer_detail<S>(store: &mut S, result_id: i64) -> AppResult<ResultAnswers>
where
    S: ResultReader,
{
    let result = get_result(store, result_id).await?;
    answers_for(store, &result).await
}

/// Per-answer breakdown of a result the caller has already loaded.
///
/// A stored result always has answers, so an empty answer set is reported as
/// not found as well, with its own message.
pub async fn answers_for<S>(store: &mut S, result: &QuizResultSummary) -> AppResult<ResultAnswers>
where
    S: ResultReader,
{
    let result_id = result.id;
    let answers = store.list_answers(result_id).await?;
    if answers.is_empty() {
        tracing::warn!("Quiz result {} has no stored answers", result_id);
        return Err(AppError::NotFound(format!(
            "No answers stored for quiz result {}",
            result_id
        )));
    }

    Ok(ResultAnswers {
        result_id,
        answers: answers.into_iter().map(AnswerDetail::from).collect(),
    })
}
