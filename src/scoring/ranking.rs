// src/scoring/ranking.rs

//! Leaderboards and statistics, always computed per comparison scope
//! (the quiz's job category). Results from different scopes are never
//! ranked against each other.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::{
    error::{AppError, AppResult},
    models::ranking::{Ranking, RankingStatistics, ScopeStatistics, ScopedResult},
    repositories::{DisplayNameResolver, ResultReader},
    scoring::{percentage, round2},
};

/// Ranks the results of a single scope.
///
/// Order: marks descending, then time taken ascending. An entry that ties its
/// predecessor on both marks and time shares its rank; any other entry gets
/// its 1-based position, so `[(10,20),(10,20),(10,25),(8,5)]` ranks `[1,1,3,4]`.
pub fn rank_within_scope(
    scope: &str,
    mut results: Vec<ScopedResult>,
    names: &HashMap<String, String>,
) -> Vec<Ranking> {
    results.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.time_taken.cmp(&b.time_taken))
            .then(a.result_id.cmp(&b.result_id))
    });

    let mut rankings: Vec<Ranking> = Vec::with_capacity(results.len());
    for (i, result) in results.into_iter().enumerate() {
        let rank = match rankings.last() {
            Some(prev) if prev.marks == result.score && prev.time_taken == result.time_taken => {
                prev.rank
            }
            _ => i as u32 + 1,
        };

        let name = names
            .get(&result.user_id)
            .cloned()
            .unwrap_or_else(|| result.user_id.clone());

        rankings.push(Ranking {
            rank,
            name,
            marks: result.score,
            total_marks: result.total_marks,
            percentage: percentage(result.score, result.total_marks),
            time_taken: result.time_taken,
            category: scope.to_string(),
            job_role: scope.to_string(),
            quiz_name: result.quiz_name,
        });
    }

    rankings
}

/// Ranks every scope independently; output is ordered by scope name, then rank.
pub fn rank_results(results: Vec<ScopedResult>, names: &HashMap<String, String>) -> Vec<Ranking> {
    group_by_scope(results)
        .into_iter()
        .flat_map(|(scope, group)| rank_within_scope(&scope, group, names))
        .collect()
}

fn group_by_scope(results: Vec<ScopedResult>) -> BTreeMap<String, Vec<ScopedResult>> {
    let mut groups: BTreeMap<String, Vec<ScopedResult>> = BTreeMap::new();
    for result in results {
        groups.entry(result.category.clone()).or_default().push(result);
    }
    groups
}

/// Statistics for the results of one scope.
pub fn compute_scope_statistics(results: &[ScopedResult]) -> ScopeStatistics {
    // Earliest stored result stands for the scope.
    let Some(representative) = results.iter().min_by_key(|r| r.result_id) else {
        return ScopeStatistics::empty();
    };

    let summary = Aggregate::of(results);

    ScopeStatistics {
        participants: summary.participants,
        average_score: summary.average_score,
        average_time: summary.average_time,
        top_score: summary.top_score,
        total_marks: representative.total_marks,
        quiz_name: representative.quiz_name.clone(),
    }
}

/// Statistics across all scopes. `categories` is the list of available scopes.
pub fn compute_statistics(
    results: Vec<ScopedResult>,
    categories: Vec<String>,
) -> RankingStatistics {
    if results.is_empty() {
        return RankingStatistics::empty();
    }

    let overall = Aggregate::of(&results);

    let category_stats = group_by_scope(results)
        .into_iter()
        .map(|(scope, group)| (scope, compute_scope_statistics(&group)))
        .collect();

    RankingStatistics {
        total_participants: overall.participants,
        average_score: overall.average_score,
        average_time: overall.average_time,
        top_score: overall.top_score,
        categories,
        category_stats,
    }
}

struct Aggregate {
    participants: usize,
    average_score: f64,
    average_time: f64,
    top_score: f64,
}

impl Aggregate {
    fn of(results: &[ScopedResult]) -> Self {
        if results.is_empty() {
            return Self {
                participants: 0,
                average_score: 0.0,
                average_time: 0.0,
                top_score: 0.0,
            };
        }

        let count = results.len() as f64;
        let participants = results
            .iter()
            .map(|r| r.user_id.as_str())
            .collect::<HashSet<_>>()
            .len();
        let percentages: Vec<f64> = results
            .iter()
            .map(|r| percentage(r.score, r.total_marks))
            .collect();
        let total_time: f64 = results.iter().map(|r| f64::from(r.time_taken)).sum();
        let top = percentages.iter().copied().fold(0.0_f64, f64::max);

        Self {
            participants,
            average_score: round2(percentages.iter().sum::<f64>() / count),
            average_time: round2(total_time / count),
            top_score: round2(top),
        }
    }
}

fn normalize_scope(scope: &str) -> AppResult<&str> {
    let scope = scope.trim();
    if scope.is_empty() {
        return Err(AppError::ValidationFailure("Category is required.".to_string()));
    }
    Ok(scope)
}

async fn resolve_names<S>(store: &mut S, results: &[ScopedResult]) -> AppResult<HashMap<String, String>>
where
    S: DisplayNameResolver,
{
    let user_ids: Vec<String> = results.iter().map(|r| r.user_id.clone()).collect();
    store.display_names(&user_ids).await
}

/// Leaderboard over all scopes.
pub async fn rank_all<S>(store: &mut S) -> AppResult<Vec<Ranking>>
where
    S: ResultReader + DisplayNameResolver,
{
    let results = store.list_scoped_results(None).await?;
    let names = resolve_names(store, &results).await?;
    Ok(rank_results(results, &names))
}

/// Leaderboard of one scope. An unknown scope yields an empty list.
pub async fn rank_by_scope<S>(store: &mut S, scope: &str) -> AppResult<Vec<Ranking>>
where
    S: ResultReader + DisplayNameResolver,
{
    let scope = normalize_scope(scope)?;
    let mut results = store.list_scoped_results(Some(scope)).await?;
    results.retain(|r| r.category == scope);

    let names = resolve_names(store, &results).await?;
    Ok(rank_within_scope(scope, results, &names))
}

pub async fn statistics<S>(store: &mut S) -> AppResult<RankingStatistics>
where
    S: ResultReader,
{
    let results = store.list_scoped_results(None).await?;
    if results.is_empty() {
        return Ok(RankingStatistics::empty());
    }
    let categories = store.list_categories().await?;
    Ok(compute_statistics(results, categories))
}

/// Statistics of one scope, or the empty shape when it has no results.
pub async fn scope_statistics<S>(store: &mut S, scope: &str) -> AppResult<ScopeStatistics>
where
    S: ResultReader,
{
    let scope = normalize_scope(scope)?;
    let mut results = store.list_scoped_results(Some(scope)).await?;
    results.retain(|r| r.category == scope);
    Ok(compute_scope_statistics(&results))
}

pub async fn available_scopes<S>(store: &mut S) -> AppResult<Vec<String>>
where
    S: ResultReader,
{
    store.list_categories().await
}
