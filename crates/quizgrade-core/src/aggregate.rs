//! Submission-level score aggregation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::results::GradingResult;

/// Totals over a set of per-question results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    /// Weighted points earned across graded results.
    pub total_score: f64,
    /// Weighted maximum across every result, pending ones included.
    pub max_score: f64,
    /// Weighted maximum across graded results only.
    pub graded_max_score: f64,
    /// Results still waiting on manual review or the test runner.
    pub pending_count: usize,
    /// `total_score / graded_max_score` as a percentage (0 when nothing is graded).
    pub percentage: f64,
    /// The final percentage, available once nothing is pending.
    pub final_percentage: Option<f64>,
}

impl ScoreSummary {
    pub fn is_final(&self) -> bool {
        self.pending_count == 0
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregateError {
    #[error("expected {expected} weights, got {actual}")]
    WeightCountMismatch { expected: usize, actual: usize },

    #[error("weight {value} at position {index} must be a finite, non-negative number")]
    InvalidWeight { index: usize, value: f64 },
}

/// Sum results into a [`ScoreSummary`].
///
/// An empty `weights` slice weighs every result 1.0; otherwise there must
/// be exactly one weight per result.
pub fn aggregate(
    results: &[GradingResult],
    weights: &[f64],
) -> Result<ScoreSummary, AggregateError> {
    if !weights.is_empty() && weights.len() != results.len() {
        return Err(AggregateError::WeightCountMismatch {
            expected: results.len(),
            actual: weights.len(),
        });
    }
    if let Some((index, &value)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(AggregateError::InvalidWeight { index, value });
    }

    let mut summary = ScoreSummary::default();
    for (i, result) in results.iter().enumerate() {
        let weight = weights.get(i).copied().unwrap_or(1.0);
        summary.max_score += result.max_points * weight;
        if result.is_pending() {
            summary.pending_count += 1;
        } else {
            summary.total_score += result.points_earned * weight;
            summary.graded_max_score += result.max_points * weight;
        }
    }

    summary.percentage = percentage(summary.total_score, summary.graded_max_score);
    summary.final_percentage = summary.is_final().then_some(summary.percentage);
    Ok(summary)
}

fn percentage(score: f64, max: f64) -> f64 {
    if max > 0.0 {
        score / max * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::GradeStatus;

    fn result(earned: f64, max: f64, status: GradeStatus) -> GradingResult {
        GradingResult {
            question_id: "q".into(),
            status,
            is_correct: (status == GradeStatus::Graded).then_some(earned >= max),
            points_earned: earned,
            max_points: max,
            feedback: None,
            test_outcomes: vec![],
        }
    }

    #[test]
    fn unweighted_sum() {
        let results = vec![
            result(1.0, 1.0, GradeStatus::Graded),
            result(0.5, 2.0, GradeStatus::Graded),
            result(0.0, 1.0, GradeStatus::Graded),
        ];
        let s = aggregate(&results, &[]).unwrap();
        assert_eq!(s.total_score, 1.5);
        assert_eq!(s.max_score, 4.0);
        assert_eq!(s.percentage, 37.5);
        assert_eq!(s.final_percentage, Some(37.5));
    }

    #[test]
    fn weights_scale_points() {
        let results = vec![
            result(1.0, 1.0, GradeStatus::Graded),
            result(0.0, 1.0, GradeStatus::Graded),
        ];
        let s = aggregate(&results, &[3.0, 1.0]).unwrap();
        assert_eq!(s.total_score, 3.0);
        assert_eq!(s.max_score, 4.0);
        assert_eq!(s.percentage, 75.0);
    }

    #[test]
    fn pending_results_hold_back_final_percentage() {
        let results = vec![
            result(2.0, 2.0, GradeStatus::Graded),
            result(0.0, 5.0, GradeStatus::PendingManualReview),
            result(0.0, 3.0, GradeStatus::AwaitingExecution),
        ];
        let s = aggregate(&results, &[]).unwrap();
        assert_eq!(s.max_score, 10.0);
        assert_eq!(s.graded_max_score, 2.0);
        assert_eq!(s.pending_count, 2);
        assert_eq!(s.percentage, 100.0);
        assert_eq!(s.final_percentage, None);
        assert!(!s.is_final());
    }

    #[test]
    fn order_independent() {
        let mut results = vec![
            result(1.0, 4.0, GradeStatus::Graded),
            result(3.0, 3.0, GradeStatus::Graded),
            result(0.0, 2.0, GradeStatus::PendingManualReview),
        ];
        let forward = aggregate(&results, &[1.0, 2.0, 0.5]).unwrap();
        results.reverse();
        let backward = aggregate(&results, &[0.5, 2.0, 1.0]).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn empty_results() {
        let s = aggregate(&[], &[]).unwrap();
        assert_eq!(s.percentage, 0.0);
        assert_eq!(s.final_percentage, Some(0.0));
    }

    #[test]
    fn invalid_weights_rejected() {
        let results = vec![result(1.0, 1.0, GradeStatus::Graded)];
        assert_eq!(
            aggregate(&results, &[1.0, 1.0]),
            Err(AggregateError::WeightCountMismatch {
                expected: 1,
                actual: 2
            })
        );
        assert!(matches!(
            aggregate(&results, &[-1.0]),
            Err(AggregateError::InvalidWeight { index: 0, .. })
        ));
    }
}
