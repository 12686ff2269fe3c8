// src/repositories/postgres.rs

//! Postgres implementations of the repository traits.
//!
//! They are implemented on `PgConnection`, so handlers pass either a pooled
//! connection (`&mut *conn`) or an open transaction (`&mut *tx`).

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sqlx::{PgConnection, Postgres, QueryBuilder};

use crate::{
    error::{AppError, AppResult},
    models::{
        quiz::{
            CreateQuizRequest, Question, QuestionRow, Quiz, QuizDefinition, QuizOption,
            QuizSummary, UpdateQuizRequest,
        },
        quiz_result::{Answer, NewQuizResult, QuizResult},
        ranking::ScopedResult,
    },
    repositories::{DisplayNameResolver, QuizCatalog, QuizReader, ResultReader, ResultWriter},
};

const QUIZ_COLUMNS: &str = "id, name, category, description, duration_minutes, level, created_at";
const QUESTION_COLUMNS: &str =
    "id, quiz_id, text, code_snippet, image_url, question_type, marks, correct_answers";
const RESULT_COLUMNS: &str =
    "id, user_id, quiz_id, score, total_marks, submission_time, time_taken";

/// Which side of a foreign key the failing statement was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ForeignKey {
    /// The row being written points at a quiz or question.
    Refers,
    /// The row being deleted is pointed at by stored results.
    Referenced,
}

fn foreign_key_message(what: &str, side: ForeignKey) -> String {
    match side {
        ForeignKey::Refers => format!("{} refers to a quiz or question that no longer exists", what),
        ForeignKey::Referenced => format!("{} is referenced by existing grade history", what),
    }
}

/// Maps write errors, turning constraint violations into domain errors.
fn write_error(err: sqlx::Error, what: &str, side: ForeignKey) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_foreign_key_violation() {
            return AppError::IntegrityViolation(foreign_key_message(what, side));
        }
        if db_err.is_unique_violation() {
            return AppError::Conflict(format!("{} already exists", what));
        }
    }
    tracing::error!("Failed to write {}: {:?}", what, err);
    AppError::PersistenceFailure(err.to_string())
}

fn read_error(err: sqlx::Error, what: &str) -> AppError {
    tracing::error!("Failed to read {}: {:?}", what, err);
    AppError::PersistenceFailure(err.to_string())
}

#[async_trait]
impl QuizReader for PgConnection {
    async fn find_quiz_definition(&mut self, quiz_id: i64) -> AppResult<Option<QuizDefinition>> {
        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {} FROM quizzes WHERE id = $1",
            QUIZ_COLUMNS
        ))
        .bind(quiz_id)
        .fetch_optional(&mut *self)
        .await
        .map_err(|e| read_error(e, "quiz"))?;

        let Some(quiz) = quiz else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, QuestionRow>(&format!(
            "SELECT {} FROM questions WHERE quiz_id = $1 ORDER BY position, id",
            QUESTION_COLUMNS
        ))
        .bind(quiz_id)
        .fetch_all(&mut *self)
        .await
        .map_err(|e| read_error(e, "questions"))?;

        let options = sqlx::query_as::<_, QuizOption>(
            r#"
            SELECT o.id, o.question_id, o.option_key, o.option_value
            FROM question_options o
            JOIN questions q ON q.id = o.question_id
            WHERE q.quiz_id = $1
            ORDER BY o.question_id, o.id
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&mut *self)
        .await
        .map_err(|e| read_error(e, "question options"))?;

        let mut by_question: HashMap<i64, Vec<QuizOption>> = HashMap::new();
        for option in options {
            by_question.entry(option.question_id).or_default().push(option);
        }

        let questions = rows
            .into_iter()
            .map(|row| {
                let options = by_question.remove(&row.id).unwrap_or_default();
                Question::from_row(row, options)
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(AppError::PersistenceFailure)?;

        Ok(Some(QuizDefinition { quiz, questions }))
    }
}

#[async_trait]
impl ResultWriter for PgConnection {
    async fn insert_result(&mut self, result: &NewQuizResult) -> AppResult<QuizResult> {
        let stored = sqlx::query_as::<_, QuizResult>(&format!(
            r#"
            INSERT INTO quiz_results (user_id, quiz_id, score, total_marks, time_taken)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            RESULT_COLUMNS
        ))
        .bind(&result.user_id)
        .bind(result.quiz_id)
        .bind(result.score)
        .bind(result.total_marks)
        .bind(result.time_taken)
        .fetch_one(&mut *self)
        .await
        .map_err(|e| write_error(e, "quiz result", ForeignKey::Refers))?;

        for answer in &result.answers {
            let answer_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO answers (quiz_result_id, question_id, is_correct, marks_obtained)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(stored.id)
            .bind(answer.question_id)
            .bind(answer.is_correct)
            .bind(answer.marks_obtained)
            .fetch_one(&mut *self)
            .await
            .map_err(|e| write_error(e, "answer", ForeignKey::Refers))?;

            if answer.selected_options.is_empty() {
                continue;
            }

            let mut builder = QueryBuilder::<Postgres>::new(
                "INSERT INTO answer_selected_options (answer_id, option_key) ",
            );
            builder.push_values(&answer.selected_options, |mut row, key| {
                row.push_bind(answer_id).push_bind(key);
            });
            builder
                .build()
                .execute(&mut *self)
                .await
                .map_err(|e| write_error(e, "selected options", ForeignKey::Refers))?;
        }

        Ok(stored)
    }
}

#[async_trait]
impl ResultReader for PgConnection {
    async fn list_scoped_results(
        &mut self,
        category: Option<&str>,
    ) -> AppResult<Vec<ScopedResult>> {
        sqlx::query_as::<_, ScopedResult>(
            r#"
            SELECT
                r.id AS result_id,
                r.user_id,
                r.quiz_id,
                q.name AS quiz_name,
                q.category,
                r.score,
                r.total_marks,
                r.time_taken,
                r.submission_time
            FROM quiz_results r
            JOIN quizzes q ON q.id = r.quiz_id
            WHERE ($1::TEXT IS NULL OR q.category = $1)
            ORDER BY r.id
            "#,
        )
        .bind(category)
        .fetch_all(&mut *self)
        .await
        .map_err(|e| read_error(e, "quiz results"))
    }

    async fn find_result(&mut self, result_id: i64) -> AppResult<Option<QuizResult>> {
        sqlx::query_as::<_, QuizResult>(&format!(
            "SELECT {} FROM quiz_results WHERE id = $1",
            RESULT_COLUMNS
        ))
        .bind(result_id)
        .fetch_optional(&mut *self)
        .await
        .map_err(|e| read_error(e, "quiz result"))
    }

    async fn list_results_for_user(&mut self, user_id: &str) -> AppResult<Vec<QuizResult>> {
        sqlx::query_as::<_, QuizResult>(&format!(
            "SELECT {} FROM quiz_results WHERE user_id = $1 ORDER BY submission_time DESC, id DESC",
            RESULT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&mut *self)
        .await
        .map_err(|e| read_error(e, "quiz results"))
    }

    async fn list_all_results(&mut self) -> AppResult<Vec<QuizResult>> {
        sqlx::query_as::<_, QuizResult>(&format!(
            "SELECT {} FROM quiz_results ORDER BY submission_time DESC, id DESC",
            RESULT_COLUMNS
        ))
        .fetch_all(&mut *self)
        .await
        .map_err(|e| read_error(e, "quiz results"))
    }

    async fn list_answers(&mut self, result_id: i64) -> AppResult<Vec<Answer>> {
        sqlx::query_as::<_, Answer>(
            r#"
            SELECT
                a.id,
                a.quiz_result_id,
                a.question_id,
                a.is_correct,
                a.marks_obtained,
                COALESCE(
                    array_agg(s.option_key::TEXT ORDER BY s.option_key)
                        FILTER (WHERE s.option_key IS NOT NULL),
                    '{}'::TEXT[]
                ) AS selected_options
            FROM answers a
            LEFT JOIN answer_selected_options s ON s.answer_id = a.id
            WHERE a.quiz_result_id = $1
            GROUP BY a.id
            ORDER BY a.id
            "#,
        )
        .bind(result_id)
        .fetch_all(&mut *self)
        .await
        .map_err(|e| read_error(e, "answers"))
    }

    async fn list_categories(&mut self) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT DISTINCT category FROM quizzes ORDER BY category")
            .fetch_all(&mut *self)
            .await
            .map_err(|e| read_error(e, "categories"))
    }
}

#[async_trait]
impl DisplayNameResolver for PgConnection {
    async fn display_names(&mut self, user_ids: &[String]) -> AppResult<HashMap<String, String>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let unique: Vec<String> = user_ids
            .iter()
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT id::TEXT, username FROM users WHERE id::TEXT = ANY($1)",
        )
        .bind(&unique)
        .fetch_all(&mut *self)
        .await
        .map_err(|e| read_error(e, "user names"))?;

        Ok(rows.into_iter().collect())
    }
}

#[async_trait]
impl QuizCatalog for PgConnection {
    async fn quiz_name_taken(&mut self, name: &str, except_id: Option<i64>) -> AppResult<bool> {
        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM quizzes WHERE name = $1 AND ($2::BIGINT IS NULL OR id <> $2)",
        )
        .bind(name)
        .bind(except_id)
        .fetch_optional(&mut *self)
        .await
        .map_err(|e| read_error(e, "quiz name"))?;

        Ok(existing.is_some())
    }

    async fn insert_quiz(&mut self, request: &CreateQuizRequest) -> AppResult<QuizDefinition> {
        let quiz = sqlx::query_as::<_, Quiz>(&format!(
            r#"
            INSERT INTO quizzes (name, category, description, duration_minutes, level)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            QUIZ_COLUMNS
        ))
        .bind(&request.name)
        .bind(&request.category)
        .bind(&request.description)
        .bind(request.duration_minutes)
        .bind(&request.level)
        .fetch_one(&mut *self)
        .await
        .map_err(|e| write_error(e, &format!("Quiz '{}'", request.name), ForeignKey::Refers))?;

        let mut questions = Vec::with_capacity(request.questions.len());
        for (position, question) in request.questions.iter().enumerate() {
            let row = sqlx::query_as::<_, QuestionRow>(&format!(
                r#"
                INSERT INTO questions
                    (quiz_id, position, text, code_snippet, image_url, question_type, marks, correct_answers)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING {}
                "#,
                QUESTION_COLUMNS
            ))
            .bind(quiz.id)
            .bind(position as i32)
            .bind(&question.text)
            .bind(&question.code_snippet)
            .bind(&question.image_url)
            .bind(&question.question_type)
            .bind(question.marks)
            .bind(&question.correct_answers)
            .fetch_one(&mut *self)
            .await
            .map_err(|e| write_error(e, "question", ForeignKey::Refers))?;

            let mut builder = QueryBuilder::<Postgres>::new(
                "INSERT INTO question_options (question_id, option_key, option_value) ",
            );
            builder.push_values(&question.options, |mut b, option| {
                b.push_bind(row.id)
                    .push_bind(&option.key)
                    .push_bind(&option.value);
            });
            builder.push(" RETURNING id, question_id, option_key, option_value");

            let options: Vec<QuizOption> = builder
                .build_query_as()
                .fetch_all(&mut *self)
                .await
                .map_err(|e| write_error(e, "question options", ForeignKey::Refers))?;

            questions.push(Question::from_row(row, options).map_err(AppError::PersistenceFailure)?);
        }

        Ok(QuizDefinition { quiz, questions })
    }

    async fn list_quizzes(&mut self) -> AppResult<Vec<QuizSummary>> {
        sqlx::query_as::<_, QuizSummary>(
            r#"
            SELECT
                q.id, q.name, q.category, q.description, q.duration_minutes, q.level, q.created_at,
                COUNT(qs.id) AS question_count
            FROM quizzes q
            LEFT JOIN questions qs ON qs.quiz_id = q.id
            GROUP BY q.id
            ORDER BY q.id DESC
            "#,
        )
        .fetch_all(&mut *self)
        .await
        .map_err(|e| read_error(e, "quizzes"))
    }

    async fn update_quiz(&mut self, quiz_id: i64, patch: &UpdateQuizRequest) -> AppResult<bool> {
        if patch.is_empty() {
            let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM quizzes WHERE id = $1")
                .bind(quiz_id)
                .fetch_optional(&mut *self)
                .await
                .map_err(|e| read_error(e, "quiz"))?;
            return Ok(exists.is_some());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE quizzes SET ");
        let mut separated = builder.separated(", ");

        if let Some(name) = &patch.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
        }
        if let Some(category) = &patch.category {
            separated.push("category = ");
            separated.push_bind_unseparated(category);
        }
        if let Some(description) = &patch.description {
            separated.push("description = ");
            separated.push_bind_unseparated(description);
        }
        if let Some(duration) = patch.duration_minutes {
            separated.push("duration_minutes = ");
            separated.push_bind_unseparated(duration);
        }
        if let Some(level) = &patch.level {
            separated.push("level = ");
            separated.push_bind_unseparated(level);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(quiz_id);

        let result = builder
            .build()
            .execute(&mut *self)
            .await
            .map_err(|e| write_error(e, "Quiz name", ForeignKey::Refers))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_answers_for_quiz(&mut self, quiz_id: i64) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM answers a
            JOIN questions q ON q.id = a.question_id
            WHERE q.quiz_id = $1
            "#,
        )
        .bind(quiz_id)
        .fetch_one(&mut *self)
        .await
        .map_err(|e| read_error(e, "answer count"))
    }

    async fn count_answers_for_question(&mut self, question_id: i64) -> AppResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM answers WHERE question_id = $1")
            .bind(question_id)
            .fetch_one(&mut *self)
            .await
            .map_err(|e| read_error(e, "answer count"))
    }

    async fn delete_quiz(&mut self, quiz_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM quizzes WHERE id = $1")
            .bind(quiz_id)
            .execute(&mut *self)
            .await
            .map_err(|e| write_error(e, &format!("Quiz {}", quiz_id), ForeignKey::Referenced))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_question(&mut self, question_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(question_id)
            .execute(&mut *self)
            .await
            .map_err(|e| write_error(e, &format!("Question {}", question_id), ForeignKey::Referenced))?;

        Ok(result.rows_affected() > 0)
    }
}
