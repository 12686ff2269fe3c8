// src/test_utils.rs

//! In-memory store and fixtures for unit tests of the scoring core.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;

use crate::{
    error::{AppError, AppResult},
    models::{
        quiz::{
            CreateQuizRequest, Question, QuestionRow, QuestionType, Quiz, QuizDefinition,
            QuizOption, QuizSummary, UpdateQuizRequest,
        },
        quiz_result::{Answer, NewQuizResult, QuizResult},
        ranking::ScopedResult,
    },
    repositories::{DisplayNameResolver, QuizCatalog, QuizReader, ResultReader, ResultWriter},
};

/// Behaves like the Postgres store closely enough for service tests.
#[derive(Default)]
pub struct MemoryStore {
    quizzes: Vec<QuizDefinition>,
    results: Vec<QuizResult>,
    answers: Vec<Answer>,
    users: HashMap<String, String>,
    next_id: i64,
    result_lookups: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: 1000,
            ..Default::default()
        }
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn add_quiz(&mut self, definition: QuizDefinition) {
        self.quizzes.push(definition);
    }

    pub fn add_user(&mut self, id: &str, username: &str) {
        self.users.insert(id.to_string(), username.to_string());
    }

    /// Stores a result without answers, graded against the quiz's current total.
    pub fn add_graded_result(&mut self, user_id: &str, quiz_id: i64, score: i32, time_taken: i32) -> i64 {
        let total_marks = self
            .quizzes
            .iter()
            .find(|d| d.quiz.id == quiz_id)
            .and_then(|d| d.total_marks())
            .unwrap_or_default();
        let id = self.next_id();
        self.results.push(QuizResult {
            id,
            user_id: user_id.to_string(),
            quiz_id,
            score,
            total_marks,
            submission_time: chrono::Utc::now(),
            time_taken,
        });
        id
    }

    pub fn set_question_marks(&mut self, question_id: i64, marks: i32) {
        for question in self.quizzes.iter_mut().flat_map(|d| d.questions.iter_mut()) {
            if question.id == question_id {
                question.marks = marks;
            }
        }
    }

    pub fn result(&self, id: i64) -> Option<QuizResult> {
        self.results.iter().find(|r| r.id == id).cloned()
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    pub fn answer_count(&self) -> usize {
        self.answers.len()
    }

    /// How many times `find_result` was called.
    pub fn result_lookups(&self) -> usize {
        self.result_lookups
    }

    fn answered_questions(&self) -> BTreeSet<i64> {
        self.answers.iter().map(|a| a.question_id).collect()
    }
}

#[async_trait]
impl QuizReader for MemoryStore {
    async fn find_quiz_definition(&mut self, quiz_id: i64) -> AppResult<Option<QuizDefinition>> {
        Ok(self.quizzes.iter().find(|d| d.quiz.id == quiz_id).cloned())
    }
}

#[async_trait]
impl ResultWriter for MemoryStore {
    async fn insert_result(&mut self, result: &NewQuizResult) -> AppResult<QuizResult> {
        if !self.quizzes.iter().any(|d| d.quiz.id == result.quiz_id) {
            return Err(AppError::IntegrityViolation(format!(
                "Quiz {} does not exist",
                result.quiz_id
            )));
        }

        let stored = QuizResult {
            id: self.next_id(),
            user_id: result.user_id.clone(),
            quiz_id: result.quiz_id,
            score: result.score,
            total_marks: result.total_marks,
            submission_time: chrono::Utc::now(),
            time_taken: result.time_taken,
        };

        for answer in &result.answers {
            let id = self.next_id();
            self.answers.push(Answer {
                id,
                quiz_result_id: stored.id,
                question_id: answer.question_id,
                selected_options: answer.selected_options.iter().cloned().collect(),
                is_correct: answer.is_correct,
                marks_obtained: answer.marks_obtained,
            });
        }
        self.results.push(stored.clone());

        Ok(stored)
    }
}

#[async_trait]
impl ResultReader for MemoryStore {
    async fn list_scoped_results(&mut self, category: Option<&str>) -> AppResult<Vec<ScopedResult>> {
        let scoped = self
            .results
            .iter()
            .filter_map(|r| {
                let quiz = &self.quizzes.iter().find(|d| d.quiz.id == r.quiz_id)?.quiz;
                if category.is_some_and(|c| c != quiz.category) {
                    return None;
                }
                Some(ScopedResult {
                    result_id: r.id,
                    user_id: r.user_id.clone(),
                    quiz_id: r.quiz_id,
                    quiz_name: quiz.name.clone(),
                    category: quiz.category.clone(),
                    score: r.score,
                    total_marks: r.total_marks,
                    time_taken: r.time_taken,
                    submission_time: r.submission_time,
                })
            })
            .collect();
        Ok(scoped)
    }

    async fn find_result(&mut self, result_id: i64) -> AppResult<Option<QuizResult>> {
        self.result_lookups += 1;
        Ok(self.result(result_id))
    }

    async fn list_results_for_user(&mut self, user_id: &str) -> AppResult<Vec<QuizResult>> {
        let mut results: Vec<QuizResult> = self
            .results
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| b.submission_time.cmp(&a.submission_time).then(b.id.cmp(&a.id)));
        Ok(results)
    }

    async fn list_all_results(&mut self) -> AppResult<Vec<QuizResult>> {
        let mut results = self.results.clone();
        results.sort_by(|a, b| b.submission_time.cmp(&a.submission_time).then(b.id.cmp(&a.id)));
        Ok(results)
    }

    async fn list_answers(&mut self, result_id: i64) -> AppResult<Vec<Answer>> {
        Ok(self
            .answers
            .iter()
            .filter(|a| a.quiz_result_id == result_id)
            .cloned()
            .collect())
    }

    async fn list_categories(&mut self) -> AppResult<Vec<String>> {
        let categories: BTreeSet<String> =
            self.quizzes.iter().map(|d| d.quiz.category.clone()).collect();
        Ok(categories.into_iter().collect())
    }
}

#[async_trait]
impl DisplayNameResolver for MemoryStore {
    async fn display_names(&mut self, user_ids: &[String]) -> AppResult<HashMap<String, String>> {
        Ok(user_ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|name| (id.clone(), name.clone())))
            .collect())
    }
}

#[async_trait]
impl QuizCatalog for MemoryStore {
    async fn quiz_name_taken(&mut self, name: &str, except_id: Option<i64>) -> AppResult<bool> {
        Ok(self
            .quizzes
            .iter()
            .any(|d| d.quiz.name == name && Some(d.quiz.id) != except_id))
    }

    async fn insert_quiz(&mut self, request: &CreateQuizRequest) -> AppResult<QuizDefinition> {
        let quiz_id = self.next_id();
        let mut questions = Vec::with_capacity(request.questions.len());

        for q in &request.questions {
            let question_id = self.next_id();
            let mut options = Vec::with_capacity(q.options.len());
            for o in &q.options {
                options.push(QuizOption {
                    id: self.next_id(),
                    question_id,
                    key: o.key.clone(),
                    value: o.value.clone(),
                });
            }
            let row = QuestionRow {
                id: question_id,
                quiz_id,
                text: q.text.clone(),
                code_snippet: q.code_snippet.clone(),
                image_url: q.image_url.clone(),
                question_type: q.question_type.clone(),
                marks: q.marks,
                correct_answers: q.correct_answers.clone(),
            };
            questions.push(Question::from_row(row, options).map_err(AppError::PersistenceFailure)?);
        }

        let definition = QuizDefinition {
            quiz: Quiz {
                id: quiz_id,
                name: request.name.clone(),
                category: request.category.clone(),
                description: request.description.clone(),
                duration_minutes: request.duration_minutes,
                level: request.level.clone(),
                created_at: chrono::Utc::now(),
            },
            questions,
        };
        self.quizzes.push(definition.clone());
        Ok(definition)
    }

    async fn list_quizzes(&mut self) -> AppResult<Vec<QuizSummary>> {
        Ok(self.quizzes.iter().map(QuizDefinition::summary).collect())
    }

    async fn update_quiz(&mut self, quiz_id: i64, patch: &UpdateQuizRequest) -> AppResult<bool> {
        let Some(definition) = self.quizzes.iter_mut().find(|d| d.quiz.id == quiz_id) else {
            return Ok(false);
        };
        let quiz = &mut definition.quiz;
        if let Some(name) = &patch.name {
            quiz.name = name.clone();
        }
        if let Some(category) = &patch.category {
            quiz.category = category.clone();
        }
        if let Some(description) = &patch.description {
            quiz.description = Some(description.clone());
        }
        if let Some(duration) = patch.duration_minutes {
            quiz.duration_minutes = duration;
        }
        if let Some(level) = &patch.level {
            quiz.level = Some(level.clone());
        }
        Ok(true)
    }

    async fn count_answers_for_quiz(&mut self, quiz_id: i64) -> AppResult<i64> {
        let question_ids: BTreeSet<i64> = self
            .quizzes
            .iter()
            .filter(|d| d.quiz.id == quiz_id)
            .flat_map(|d| d.questions.iter().map(|q| q.id))
            .collect();
        Ok(self
            .answers
            .iter()
            .filter(|a| question_ids.contains(&a.question_id))
            .count() as i64)
    }

    async fn count_answers_for_question(&mut self, question_id: i64) -> AppResult<i64> {
        Ok(self.answers.iter().filter(|a| a.question_id == question_id).count() as i64)
    }

    async fn delete_quiz(&mut self, quiz_id: i64) -> AppResult<bool> {
        if self.results.iter().any(|r| r.quiz_id == quiz_id) {
            return Err(AppError::IntegrityViolation(format!(
                "Quiz {} is referenced by stored results",
                quiz_id
            )));
        }
        let before = self.quizzes.len();
        self.quizzes.retain(|d| d.quiz.id != quiz_id);
        Ok(self.quizzes.len() != before)
    }

    async fn delete_question(&mut self, question_id: i64) -> AppResult<bool> {
        if self.answered_questions().contains(&question_id) {
            return Err(AppError::IntegrityViolation(format!(
                "Question {} is referenced by stored answers",
                question_id
            )));
        }
        for definition in &mut self.quizzes {
            let before = definition.questions.len();
            definition.questions.retain(|q| q.id != question_id);
            if definition.questions.len() != before {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

pub mod fixtures {
    use super::*;

    fn options(question_id: i64) -> Vec<QuizOption> {
        ["A", "B", "C", "D"]
            .iter()
            .enumerate()
            .map(|(i, key)| QuizOption {
                id: question_id * 10 + i as i64,
                question_id,
                key: key.to_string(),
                value: format!("Option {}", key),
            })
            .collect()
    }

    fn question(
        quiz_id: i64,
        id: i64,
        question_type: QuestionType,
        marks: i32,
        correct: &[&str],
    ) -> Question {
        Question {
            id,
            quiz_id,
            text: format!("Question {}", id),
            code_snippet: None,
            image_url: None,
            question_type,
            marks,
            correct_answers: correct.iter().map(|k| k.to_string()).collect(),
            options: options(id),
        }
    }

    fn quiz(id: i64, name: &str, questions: Vec<Question>) -> QuizDefinition {
        QuizDefinition {
            quiz: Quiz {
                id,
                name: name.to_string(),
                category: "Backend".to_string(),
                description: None,
                duration_minutes: 20,
                level: Some("junior".to_string()),
                created_at: chrono::Utc::now(),
            },
            questions,
        }
    }

    /// Two questions worth 5 marks: `id*10+1` (3 marks, {A}) and
    /// `id*10+2` (2 marks, {B, C}).
    pub fn go_basics(quiz_id: i64) -> QuizDefinition {
        quiz(
            quiz_id,
            "Go Basics",
            vec![
                question(quiz_id, quiz_id * 10 + 1, QuestionType::SingleChoice, 3, &["A"]),
                question(quiz_id, quiz_id * 10 + 2, QuestionType::MultipleChoice, 2, &["B", "C"]),
            ],
        )
    }

    /// Five single-choice questions, 1 mark each, all answered by A.
    pub fn five_question_quiz(quiz_id: i64) -> QuizDefinition {
        quiz(
            quiz_id,
            "Five Questions",
            (1..=5)
                .map(|n| question(quiz_id, quiz_id * 10 + n, QuestionType::SingleChoice, 1, &["A"]))
                .collect(),
        )
    }
}
