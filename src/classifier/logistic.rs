use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{validate_training, Classifier, TrainingConfig};
use crate::error::Result;
use crate::features::FeatureVector;
use crate::models::Label;

/// Logistic regression trained by full-batch gradient descent.
///
/// No shuffling and no random initialisation: the same data and config
/// always produce the same parameters.
#[derive(Debug, Clone, Default)]
pub struct LogisticRegression {
    config: TrainingConfig,
}

/// Fitted weights. The positive class is [`Label::FalsePositive`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    pub weights: Vec<f64>,
    pub bias: f64,
    pub threshold: f64,
}

impl LogisticParams {
    /// Probability that `x` is a false positive.
    pub fn probability(&self, x: &FeatureVector) -> f64 {
        sigmoid(x.dot(&self.weights) + self.bias)
    }

    pub fn label(&self, x: &FeatureVector) -> Label {
        if self.probability(x) >= self.threshold {
            Label::FalsePositive
        } else {
            Label::Genuine
        }
    }
}

impl LogisticRegression {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// False-positive probabilities, in input order.
    pub fn predict_proba(&self, features: &[FeatureVector], params: &LogisticParams) -> Vec<f64> {
        features.iter().map(|x| params.probability(x)).collect()
    }
}

impl Classifier for LogisticRegression {
    type Params = LogisticParams;

    fn fit(&self, features: &[FeatureVector], labels: &[Label]) -> Result<LogisticParams> {
        let counts = validate_training(features, labels)?;
        let dim = features.iter().map(FeatureVector::dim).max().unwrap_or(0);
        let n = counts.total() as f64;

        let (w_genuine, w_false_positive) = if self.config.class_balance {
            (
                n / (2.0 * counts.genuine as f64),
                n / (2.0 * counts.false_positive as f64),
            )
        } else {
            (1.0, 1.0)
        };

        let mut weights = vec![0.0; dim];
        let mut bias = 0.0;
        let mut grad = vec![0.0; dim];

        for epoch in 0..self.config.epochs {
            grad.iter_mut().for_each(|g| *g = 0.0);
            let mut grad_bias = 0.0;
            let mut loss = 0.0;

            for (x, label) in features.iter().zip(labels) {
                let (y, sample_weight) = match label {
                    Label::FalsePositive => (1.0, w_false_positive),
                    Label::Genuine => (0.0, w_genuine),
                };
                let p = sigmoid(x.dot(&weights) + bias);
                let g = (p - y) * sample_weight;
                for &(i, v) in x.entries() {
                    grad[i] += g * v;
                }
                grad_bias += g;
                loss -= sample_weight * (y * p.max(1e-12).ln() + (1.0 - y) * (1.0 - p).max(1e-12).ln());
            }

            let lr = self.config.learning_rate;
            for (w, g) in weights.iter_mut().zip(&grad) {
                *w -= lr * (g / n + self.config.l2 * *w);
            }
            bias -= lr * grad_bias / n;

            if epoch % 100 == 0 {
                debug!(epoch, loss = loss / n, "logistic regression step");
            }
        }

        info!(
            examples = counts.total(),
            genuine = counts.genuine,
            false_positive = counts.false_positive,
            dim,
            epochs = self.config.epochs,
            "fitted logistic regression"
        );

        Ok(LogisticParams {
            weights,
            bias,
            threshold: self.config.threshold,
        })
    }

    fn predict(&self, features: &[FeatureVector], params: &LogisticParams) -> Vec<Label> {
        features.iter().map(|x| params.label(x)).collect()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
