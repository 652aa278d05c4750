//! Binary false-positive classifier.
//!
//! - [`Classifier`] — the `{fit, predict}` capability the agent depends on.
//! - [`logistic`] — L2-regularized logistic regression, the backend compiled
//!   in as [`ActiveClassifier`].

pub mod logistic;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SieveError};
use crate::features::FeatureVector;
use crate::models::Label;

pub use logistic::{LogisticParams, LogisticRegression};

/// Backend used by the agent. Swapping it is a build-time change.
pub type ActiveClassifier = LogisticRegression;

/// Parameters the active backend persists.
pub type ActiveParams = <ActiveClassifier as Classifier>::Params;

pub trait Classifier {
    /// Fitted state, owned by the trained model.
    type Params;

    /// Fit on parallel feature/label sequences. Both classes must be present.
    fn fit(&self, features: &[FeatureVector], labels: &[Label]) -> Result<Self::Params>;

    /// One label per input vector, in input order.
    fn predict(&self, features: &[FeatureVector], params: &Self::Params) -> Vec<Label>;
}

/// Hyper-parameters for [`LogisticRegression`], the `[training]` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Full passes of gradient descent over the training set.
    pub epochs: usize,
    pub learning_rate: f64,
    /// L2 penalty on the weights (not the bias).
    pub l2: f64,
    /// Reweight examples so both classes contribute equally to the loss.
    pub class_balance: bool,
    /// Probability at or above which a notice is labelled a false positive.
    pub threshold: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 300,
            learning_rate: 1.0,
            l2: 1e-4,
            class_balance: true,
            threshold: 0.5,
        }
    }
}

/// Per-class counts of a validated training set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    pub genuine: usize,
    pub false_positive: usize,
}

impl ClassCounts {
    pub fn of(labels: &[Label]) -> Self {
        let false_positive = labels.iter().filter(|l| l.is_false_positive()).count();
        Self {
            genuine: labels.len() - false_positive,
            false_positive,
        }
    }

    pub fn total(&self) -> usize {
        self.genuine + self.false_positive
    }
}

/// Check the shape and class coverage of a training set.
pub fn validate_training(features: &[FeatureVector], labels: &[Label]) -> Result<ClassCounts> {
    if features.len() != labels.len() {
        return Err(SieveError::InputShape {
            texts: features.len(),
            labels: labels.len(),
        });
    }
    if labels.is_empty() {
        return Err(SieveError::training("training set is empty"));
    }

    let counts = ClassCounts::of(labels);

    if counts.genuine == 0 || counts.false_positive == 0 {
        return Err(SieveError::training(format!(
            "need examples of both classes, got {} genuine and {} false-positive",
            counts.genuine, counts.false_positive
        )));
    }

    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{FeatureConfig, FittedVocabulary};
    use crate::models::NormalizedNotice;

    fn vectors(n: usize) -> Vec<FeatureVector> {
        let vocab = FittedVocabulary::fit(&[], &FeatureConfig::default());
        (0..n).map(|_| vocab.transform(&NormalizedNotice::default())).collect()
    }

    #[test]
    fn test_validate_shape_mismatch() {
        let err = validate_training(&vectors(2), &[Label::Genuine]).unwrap_err();
        assert!(matches!(err, SieveError::InputShape { texts: 2, labels: 1 }));
    }

    #[test]
    fn test_validate_empty() {
        let err = validate_training(&[], &[]).unwrap_err();
        assert!(matches!(err, SieveError::TrainingData(_)));
    }

    #[test]
    fn test_validate_single_class() {
        let err = validate_training(&vectors(3), &[Label::Genuine; 3]).unwrap_err();
        assert!(matches!(err, SieveError::TrainingData(_)));
    }

    #[test]
    fn test_validate_counts() {
        let counts = validate_training(
            &vectors(3),
            &[Label::Genuine, Label::FalsePositive, Label::FalsePositive],
        )
        .unwrap();
        assert_eq!(counts.genuine, 1);
        assert_eq!(counts.false_positive, 2);
        assert_eq!(counts.total(), 3);
    }
}
