//! Binary classification metrics. The positive class is
//! [`Label::FalsePositive`].

use serde::Serialize;

use crate::error::{Result, SieveError};
use crate::models::Label;

/// Counts of gold vs predicted labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    pub total: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub confusion: ConfusionMatrix,
    /// Gold examples per class.
    pub support_genuine: usize,
    pub support_false_positive: usize,
}

impl EvaluationReport {
    pub fn from_predictions(gold: &[Label], predicted: &[Label]) -> Result<Self> {
        if gold.len() != predicted.len() {
            return Err(SieveError::InputShape {
                texts: predicted.len(),
                labels: gold.len(),
            });
        }

        let mut confusion = ConfusionMatrix::default();
        for (g, p) in gold.iter().zip(predicted) {
            match (g, p) {
                (Label::FalsePositive, Label::FalsePositive) => confusion.true_positive += 1,
                (Label::Genuine, Label::FalsePositive) => confusion.false_positive += 1,
                (Label::Genuine, Label::Genuine) => confusion.true_negative += 1,
                (Label::FalsePositive, Label::Genuine) => confusion.false_negative += 1,
            }
        }

        let total = gold.len();
        let tp = confusion.true_positive as f64;
        let precision = ratio(tp, tp + confusion.false_positive as f64);
        let recall = ratio(tp, tp + confusion.false_negative as f64);

        Ok(Self {
            total,
            accuracy: ratio(
                (confusion.true_positive + confusion.true_negative) as f64,
                total as f64,
            ),
            precision,
            recall,
            f1: ratio(2.0 * precision * recall, precision + recall),
            confusion,
            support_genuine: confusion.true_negative + confusion.false_positive,
            support_false_positive: confusion.true_positive + confusion.false_negative,
        })
    }
}

/// Zero when the denominator is zero.
fn ratio(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Label::{FalsePositive as Fp, Genuine as G};

    #[test]
    fn test_perfect_predictions() {
        let gold = [Fp, G, G, Fp];
        let report = EvaluationReport::from_predictions(&gold, &gold).unwrap();
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.precision, 1.0);
        assert_eq!(report.recall, 1.0);
        assert_eq!(report.f1, 1.0);
        assert_eq!(report.support_genuine, 2);
        assert_eq!(report.support_false_positive, 2);
    }

    #[test]
    fn test_mixed_predictions() {
        let gold = [Fp, Fp, G, G];
        let predicted = [Fp, G, Fp, G];
        let report = EvaluationReport::from_predictions(&gold, &predicted).unwrap();
        assert_eq!(
            report.confusion,
            ConfusionMatrix {
                true_positive: 1,
                false_positive: 1,
                true_negative: 1,
                false_negative: 1,
            }
        );
        assert_eq!(report.accuracy, 0.5);
        assert_eq!(report.precision, 0.5);
        assert_eq!(report.recall, 0.5);
        assert_eq!(report.f1, 0.5);
    }

    #[test]
    fn test_no_positive_predictions() {
        let report = EvaluationReport::from_predictions(&[G, Fp], &[G, G]).unwrap();
        assert_eq!(report.precision, 0.0);
        assert_eq!(report.recall, 0.0);
        assert_eq!(report.f1, 0.0);
        assert_eq!(report.accuracy, 0.5);
    }

    #[test]
    fn test_empty_and_mismatched() {
        let report = EvaluationReport::from_predictions(&[], &[]).unwrap();
        assert_eq!(report.total, 0);
        assert_eq!(report.accuracy, 0.0);
        assert!(EvaluationReport::from_predictions(&[G], &[]).is_err());
    }
}
