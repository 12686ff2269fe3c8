// src/catalog.rs

//! Quiz authoring: create, update and guarded deletion.

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::quiz::{
        CreateQuizRequest, PublicQuiz, QuestionType, QuizDefinition, QuizSummary,
        UpdateQuizRequest,
    },
    repositories::{QuizCatalog, QuizReader},
    utils::html::clean_html,
};

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims every field, sanitizes the description and canonicalizes type names.
/// Question text and option values are kept verbatim since they often quote
/// code such as `Vec<T>`.
/// Expects a request that already passed `check()`.
fn normalize(mut request: CreateQuizRequest) -> CreateQuizRequest {
    request.name = request.name.trim().to_string();
    request.category = request.category.trim().to_string();
    request.description = trimmed(request.description).map(|d| clean_html(&d));
    request.level = trimmed(request.level);

    for question in &mut request.questions {
        question.text = question.text.trim().to_string();
        question.code_snippet = trimmed(question.code_snippet.take());
        question.image_url = trimmed(question.image_url.take());
        if let Ok(kind) = question.question_type.parse::<QuestionType>() {
            question.question_type = kind.as_str().to_string();
        }
        for option in &mut question.options {
            option.key = option.key.trim().to_string();
            option.value = option.value.trim().to_string();
        }
        let mut correct: Vec<String> = question
            .correct_answers
            .iter()
            .map(|k| k.trim().to_string())
            .collect();
        correct.sort();
        correct.dedup();
        question.correct_answers = correct;
    }

    request
}

/// Creates a quiz with its questions and options.
///
/// `store` should be a transaction; the quiz and everything it owns are
/// written through it.
pub async fn create_quiz<S>(store: &mut S, request: CreateQuizRequest) -> AppResult<QuizDefinition>
where
    S: QuizCatalog,
{
    request.check().map_err(AppError::ValidationFailure)?;
    let request = normalize(request);

    if store.quiz_name_taken(&request.name, None).await? {
        return Err(AppError::Conflict(format!(
            "Quiz '{}' already exists",
            request.name
        )));
    }

    let definition = store.insert_quiz(&request).await?;
    tracing::info!(
        "Created quiz {} '{}' with {} questions",
        definition.quiz.id,
        definition.quiz.name,
        definition.questions.len()
    );

    Ok(definition)
}

pub async fn list_quizzes<S>(store: &mut S) -> AppResult<Vec<QuizSummary>>
where
    S: QuizCatalog,
{
    store.list_quizzes().await
}

/// Full definition, correct answers included.
pub async fn get_quiz<S>(store: &mut S, quiz_id: i64) -> AppResult<QuizDefinition>
where
    S: QuizReader,
{
    store
        .find_quiz_definition(quiz_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", quiz_id)))
}

/// What a learner sees before answering.
pub async fn get_public_quiz<S>(store: &mut S, quiz_id: i64) -> AppResult<PublicQuiz>
where
    S: QuizReader,
{
    get_quiz(store, quiz_id).await.map(PublicQuiz::from)
}

/// Updates quiz metadata. Questions are not touched, so stored results keep
/// grading against what they were graded against.
pub async fn update_quiz<S>(
    store: &mut S,
    quiz_id: i64,
    mut patch: UpdateQuizRequest,
) -> AppResult<QuizSummary>
where
    S: QuizCatalog + QuizReader,
{
    patch.validate()?;

    patch.name = patch.name.map(|n| n.trim().to_string());
    patch.category = patch.category.map(|c| c.trim().to_string());
    patch.description = patch.description.map(|d| clean_html(d.trim()));
    patch.level = patch.level.map(|l| l.trim().to_string());

    if patch.name.as_deref() == Some("") {
        return Err(AppError::ValidationFailure("Quiz name is required.".to_string()));
    }
    if patch.category.as_deref() == Some("") {
        return Err(AppError::ValidationFailure("Job category is required.".to_string()));
    }

    if let Some(name) = &patch.name {
        if store.quiz_name_taken(name, Some(quiz_id)).await? {
            return Err(AppError::Conflict(format!("Quiz '{}' already exists", name)));
        }
    }

    if !store.update_quiz(quiz_id, &patch).await? {
        return Err(AppError::NotFound(format!("Quiz {} not found", quiz_id)));
    }

    get_quiz(store, quiz_id).await.map(|d| d.summary())
}

/// Deletes a quiz with its questions and options, unless any of its questions
/// has been answered.
pub async fn delete_quiz<S>(store: &mut S, quiz_id: i64) -> AppResult<()>
where
    S: QuizCatalog,
{
    let answered = store.count_answers_for_quiz(quiz_id).await?;
    if answered > 0 {
        return Err(AppError::IntegrityViolation(format!(
            "Quiz {} cannot be deleted: {} stored answer(s) reference its questions",
            quiz_id, answered
        )));
    }

    if !store.delete_quiz(quiz_id).await? {
        return Err(AppError::NotFound(format!("Quiz {} not found", quiz_id)));
    }

    tracing::info!("Deleted quiz {}", quiz_id);
    Ok(())
}

/// Deletes a question with its options, unless it has been answered.
pub async fn delete_question<S>(store: &mut S, question_id: i64) -> AppResult<()>
where
    S: QuizCatalog,
{
    let answered = store.count_answers_for_question(question_id).await?;
    if answered > 0 {
        return Err(AppError::IntegrityViolation(format!(
            "Question {} cannot be deleted: {} stored answer(s) reference it",
            question_id, answered
        )));
    }

    if !store.delete_question(question_id).await? {
        return Err(AppError::NotFound(format!(
            "Question {} not found",
            question_id
        )));
    }

    tracing::info!("Deleted question {}", question_id);
    Ok(())
}
