// src/scoring/grader.rs

use std::collections::BTreeSet;

use crate::{error::AppError, models::quiz::Question};

/// Outcome of grading one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grade {
    pub is_correct: bool,
    pub marks_obtained: i32,
}

/// Turns raw submitted keys into a set. Order and duplicates do not matter.
pub fn normalize_keys<S: AsRef<str>>(keys: &[S]) -> BTreeSet<String> {
    keys.iter()
        .map(|k| k.as_ref().trim().to_string())
        .collect()
}

/// Grades one answer against its question.
///
/// The answer is correct only when the selected keys equal the correct keys
/// exactly; a subset or superset earns nothing. Keys that are not options of
/// the question make the whole answer invalid.
pub fn grade(question: &Question, selected: &BTreeSet<String>) -> Result<Grade, AppError> {
    let invalid: Vec<&str> = selected
        .iter()
        .filter(|key| !question.has_option(key))
        .map(String::as_str)
        .collect();

    if !invalid.is_empty() {
        return Err(AppError::InvalidSubmission(format!(
            "Question {} has no option(s): {}",
            question.id,
            invalid.join(", ")
        )));
    }

    let is_correct = *selected == question.correct_answers;

    Ok(Grade {
        is_correct,
        marks_obtained: if is_correct { question.marks } else { 0 },
    })
}
