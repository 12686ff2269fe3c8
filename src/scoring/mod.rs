// src/scoring/mod.rs

//! Grading, result persistence and leaderboards.

pub mod grader;
pub mod ranking;
pub mod results;
pub mod submission;

/// `score / total_marks * 100`, or 0 when there is nothing to score against.
pub fn percentage(score: i32, total_marks: i32) -> f64 {
    if total_marks <= 0 {
        return 0.0;
    }
    f64::from(score) / f64::from(total_marks) * 100.0
}

/// Rounds half away from zero to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(5, 5), 100.0);
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(percentage(0, 5), 0.0);
    }

    #[test]
    fn test_percentage_without_marks_is_zero() {
        let p = percentage(3, 0);
        assert_eq!(p, 0.0);
        assert!(!p.is_nan());
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(33.333_333), 33.33);
        assert_eq!(round2(12.0), 12.0);
    }
}
