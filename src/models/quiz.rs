// src/models/quiz.rs

use std::{collections::BTreeSet, fmt, str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use url::Url;
use validator::Validate;

/// Option keys are short tokens such as "A" or "B2".
static OPTION_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]{1,10}$").expect("option key pattern is valid")
});

/// Upper bound for the marks of one question.
pub const MAX_QUESTION_MARKS: i32 = 1000;

/// Kind of question. Every supported kind is answered by picking option keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
    #[serde(alias = "SingleChoice", alias = "single")]
    SingleChoice,
    #[serde(alias = "MultipleChoice", alias = "multiple")]
    MultipleChoice,
    #[serde(alias = "ImageBased")]
    ImageBased,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "single-choice",
            QuestionType::MultipleChoice => "multiple-choice",
            QuestionType::ImageBased => "image-based",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "single-choice" | "SingleChoice" | "single" => Ok(QuestionType::SingleChoice),
            "multiple-choice" | "MultipleChoice" | "multiple" => Ok(QuestionType::MultipleChoice),
            "image-based" | "ImageBased" => Ok(QuestionType::ImageBased),
            other => Err(format!("unknown question type '{}'", other)),
        }
    }
}

/// Represents the 'quizzes' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,

    /// Unique across all quizzes.
    pub name: String,

    /// Job category; the scope results are ranked in.
    pub category: String,

    pub description: Option<String>,

    pub duration_minutes: i32,

    /// Difficulty level, free text ("junior", "senior", ...).
    pub level: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Represents the 'question_options' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOption {
    pub id: i64,
    pub question_id: i64,
    #[sqlx(rename = "option_key")]
    pub key: String,
    #[sqlx(rename = "option_value")]
    pub value: String,
}

/// Raw 'questions' row; options are attached when the definition is assembled.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub quiz_id: i64,
    pub text: String,
    pub code_snippet: Option<String>,
    pub image_url: Option<String>,
    pub question_type: String,
    pub marks: i32,
    pub correct_answers: Vec<String>,
}

/// A question together with the options it owns.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub text: String,
    pub code_snippet: Option<String>,
    pub image_url: Option<String>,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub marks: i32,
    pub correct_answers: BTreeSet<String>,
    pub options: Vec<QuizOption>,
}

impl Question {
    pub fn from_row(row: QuestionRow, options: Vec<QuizOption>) -> Result<Self, String> {
        let question_type = row
            .question_type
            .parse::<QuestionType>()
            .map_err(|e| format!("question {}: {}", row.id, e))?;

        Ok(Self {
            id: row.id,
            quiz_id: row.quiz_id,
            text: row.text,
            code_snippet: row.code_snippet,
            image_url: row.image_url,
            question_type,
            marks: row.marks,
            correct_answers: row.correct_answers.into_iter().collect(),
            options,
        })
    }

    pub fn has_option(&self, key: &str) -> bool {
        self.options.iter().any(|o| o.key == key)
    }
}

/// A quiz with its questions in authored order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDefinition {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<Question>,
}

impl QuizDefinition {
    /// Sum of the marks of every question, answered or not.
    /// `None` if the sum does not fit in an `i32`.
    pub fn total_marks(&self) -> Option<i32> {
        self.questions
            .iter()
            .try_fold(0i32, |total, q| total.checked_add(q.marks))
    }

    pub fn question(&self, id: i64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn summary(&self) -> QuizSummary {
        QuizSummary {
            id: self.quiz.id,
            name: self.quiz.name.clone(),
            category: self.quiz.category.clone(),
            description: self.quiz.description.clone(),
            duration_minutes: self.quiz.duration_minutes,
            level: self.quiz.level.clone(),
            question_count: self.questions.len() as i64,
            created_at: self.quiz.created_at,
        }
    }
}

/// Quiz listing entry.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizSummary {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub level: Option<String>,
    pub question_count: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for sending a quiz to a learner (excludes correct answers).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuiz {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub duration_minutes: i32,
    pub level: Option<String>,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: i64,
    pub text: String,
    pub code_snippet: Option<String>,
    pub image_url: Option<String>,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub marks: i32,
    pub options: Vec<PublicOption>,
}

#[derive(Debug, Serialize)]
pub struct PublicOption {
    pub key: String,
    pub value: String,
}

impl From<QuizDefinition> for PublicQuiz {
    fn from(definition: QuizDefinition) -> Self {
        let QuizDefinition { quiz, questions } = definition;
        Self {
            id: quiz.id,
            name: quiz.name,
            category: quiz.category,
            description: quiz.description,
            duration_minutes: quiz.duration_minutes,
            level: quiz.level,
            questions: questions
                .into_iter()
                .map(|q| PublicQuestion {
                    id: q.id,
                    text: q.text,
                    code_snippet: q.code_snippet,
                    image_url: q.image_url,
                    question_type: q.question_type,
                    marks: q.marks,
                    options: q
                        .options
                        .into_iter()
                        .map(|o| PublicOption {
                            key: o.key,
                            value: o.value,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// DTO for creating a quiz with its questions and options.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    #[validate(length(min = 1, max = 200, message = "Quiz name is required (max 200 chars)."))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Job category is required (max 100 chars)."))]
    pub category: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Quiz duration must be greater than 0."))]
    pub duration_minutes: i32,
    #[validate(length(max = 50))]
    pub level: Option<String>,
    #[validate(length(min = 1, message = "At least one question is required."))]
    #[serde(default)]
    pub questions: Vec<CreateQuestionRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    pub text: String,
    pub code_snippet: Option<String>,
    pub image_url: Option<String>,
    #[serde(rename = "type")]
    pub question_type: String,
    pub marks: i32,
    #[serde(default)]
    pub options: Vec<CreateOptionRequest>,
    #[serde(default)]
    pub correct_answers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOptionRequest {
    pub key: String,
    pub value: String,
}

impl CreateQuizRequest {
    /// Field checks plus the per-question rules the derive cannot express.
    pub fn check(&self) -> Result<(), String> {
        self.validate().map_err(|e| e.to_string())?;
        if self.name.trim().is_empty() {
            return Err("Quiz name is required.".to_string());
        }
        if self.category.trim().is_empty() {
            return Err("Job category is required.".to_string());
        }
        for (i, question) in self.questions.iter().enumerate() {
            question.check(i + 1)?;
        }
        Ok(())
    }
}

impl CreateQuestionRequest {
    /// `position` is 1-based, used only in messages.
    pub fn check(&self, position: usize) -> Result<(), String> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(format!("Question text is required for question {}.", position));
        }
        if text.chars().count() > 2000 {
            return Err(format!("Question text is too long for question {}.", position));
        }
        if !(1..=MAX_QUESTION_MARKS).contains(&self.marks) {
            return Err(format!(
                "Question marks must be between 1 and {} for question {}.",
                MAX_QUESTION_MARKS, position
            ));
        }
        if self.question_type.trim().is_empty() {
            return Err(format!("Question type is required for question {}.", position));
        }
        let question_type = self
            .question_type
            .parse::<QuestionType>()
            .map_err(|e| format!("Question {}: {}.", position, e))?;

        if let Some(image_url) = self.image_url.as_deref().filter(|u| !u.trim().is_empty()) {
            Url::parse(image_url.trim())
                .map_err(|_| format!("Invalid image URL for question {}.", position))?;
        }
        if question_type == QuestionType::ImageBased
            && self.image_url.as_deref().is_none_or(|u| u.trim().is_empty())
        {
            return Err(format!("Image URL is required for question {}.", position));
        }

        if self.options.is_empty() {
            return Err(format!(
                "Options are required for {} question {}.",
                question_type, position
            ));
        }

        let mut keys = BTreeSet::new();
        for option in &self.options {
            let key = option.key.trim();
            if !OPTION_KEY.is_match(key) {
                return Err(format!(
                    "Invalid option key '{}' for question {}.",
                    option.key, position
                ));
            }
            if option.value.trim().is_empty() || option.value.chars().count() > 500 {
                return Err(format!(
                    "Option '{}' needs a value of 1-500 chars for question {}.",
                    key, position
                ));
            }
            if !keys.insert(key) {
                return Err(format!(
                    "Duplicate option key '{}' for question {}.",
                    key, position
                ));
            }
        }

        let correct: BTreeSet<&str> = self.correct_answers.iter().map(|k| k.trim()).collect();
        if correct.is_empty() {
            return Err(format!(
                "Correct answers are required for question {}.",
                position
            ));
        }
        let invalid: Vec<&str> = correct.difference(&keys).copied().collect();
        if !invalid.is_empty() {
            return Err(format!(
                "Invalid correct answers for question {}: {}",
                position,
                invalid.join(", ")
            ));
        }
        if question_type == QuestionType::SingleChoice && correct.len() != 1 {
            return Err(format!(
                "Single-choice question {} must have exactly one correct answer.",
                position
            ));
        }

        Ok(())
    }
}

/// DTO for updating quiz metadata. Fields are optional.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuizRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(range(min = 1, message = "Quiz duration must be greater than 0."))]
    pub duration_minutes: Option<i32>,
    #[validate(length(max = 50))]
    pub level: Option<String>,
}

impl UpdateQuizRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.duration_minutes.is_none()
            && self.level.is_none()
    }
}
