// src/models/ranking.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A stored result joined with the quiz it belongs to.
/// Input of the ranking aggregator.
#[derive(Debug, Clone, FromRow)]
pub struct ScopedResult {
    pub result_id: i64,
    pub user_id: String,
    pub quiz_id: i64,
    pub quiz_name: String,
    /// Job category of the quiz; results are only compared within one.
    pub category: String,
    pub score: i32,
    pub total_marks: i32,
    pub time_taken: i32,
    pub submission_time: chrono::DateTime<chrono::Utc>,
}

/// One leaderboard row. Recomputed on every request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub rank: u32,
    pub name: String,
    pub marks: i32,
    pub total_marks: i32,
    pub percentage: f64,
    pub time_taken: i32,
    pub category: String,
    pub job_role: String,
    pub quiz_name: String,
}

/// Aggregates for one comparison scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeStatistics {
    /// Distinct users with at least one result in the scope.
    pub participants: usize,
    /// Mean percentage, 2 decimal places.
    pub average_score: f64,
    /// Mean seconds taken, 2 decimal places.
    pub average_time: f64,
    /// Best percentage, 2 decimal places.
    pub top_score: f64,
    pub total_marks: i32,
    pub quiz_name: String,
}

impl ScopeStatistics {
    /// Shape returned for a scope nobody has taken yet.
    pub fn empty() -> Self {
        Self {
            participants: 0,
            average_score: 0.0,
            average_time: 0.0,
            top_score: 0.0,
            total_marks: 0,
            quiz_name: "No Quiz Available".to_string(),
        }
    }
}

/// Aggregates across every scope plus the per-scope breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingStatistics {
    pub total_participants: usize,
    pub average_score: f64,
    pub average_time: f64,
    pub top_score: f64,
    pub categories: Vec<String>,
    pub category_stats: BTreeMap<String, ScopeStatistics>,
}

impl RankingStatistics {
    pub fn empty() -> Self {
        Self {
            total_participants: 0,
            average_score: 0.0,
            average_time: 0.0,
            top_score: 0.0,
            categories: Vec::new(),
            category_stats: BTreeMap::new(),
        }
    }
}
