//! The [`Agent`] ties normalization, extraction, features and the classifier
//! together and owns the one active [`TrainedModel`].
//!
//! - [`store`] — versioned on-disk layout of a trained model.

pub mod store;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classifier::{ActiveClassifier, ActiveParams, ClassCounts, Classifier};
use crate::config::{Config, LabelEncoding};
use crate::declutter::Extractor;
use crate::error::{Result, SieveError};
use crate::features::{FeatureVector, FittedVocabulary};
use crate::metrics::EvaluationReport;
use crate::models::{ExtractionResult, Label, NormalizedNotice};
use crate::normalize::{NormalizationModel, Normalizer};

/// Labelled notices compiled into the binary; the bundled default model is
/// trained from them on first use.
const SEED_CORPUS: &str = include_str!("../../data/seed_corpus.jsonl");

/// Fitted feature pipeline and classifier parameters, persisted as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    normalization_model: NormalizationModel,
    vocabulary: FittedVocabulary,
    params: ActiveParams,
    counts: ClassCounts,
    trained_at: DateTime<Utc>,
}

impl TrainedModel {
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            normalization_model: self.normalization_model,
            dimensions: self.vocabulary.dim(),
            examples: self.counts.total(),
            genuine: self.counts.genuine,
            false_positive: self.counts.false_positive,
            trained_at: self.trained_at,
        }
    }

    pub fn normalization_model(&self) -> NormalizationModel {
        self.normalization_model
    }

    /// A usable vocabulary with one weight per column; anything else is a
    /// corrupt artifact.
    fn is_consistent(&self) -> bool {
        self.vocabulary.is_consistent()
            && self.params.weights.len() == self.vocabulary.dim()
            && self.params.weights.iter().all(|w| w.is_finite())
            && self.params.bias.is_finite()
    }
}

/// Provenance of the active model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub normalization_model: NormalizationModel,
    pub dimensions: usize,
    pub examples: usize,
    pub genuine: usize,
    pub false_positive: usize,
    pub trained_at: DateTime<Utc>,
}

/// Where an agent resolves its model from. Exactly one source per agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Train on the bundled seed corpus.
    Bundled,
    /// Load a model saved with [`Agent::save`].
    Directory(PathBuf),
    /// Start without a model; `predict` fails until one is trained or loaded.
    None,
}

impl ModelSource {
    /// `[model].dir` wins over the bundled model when both are configured.
    pub fn from_config(config: &Config) -> Self {
        match (&config.model.dir, config.model.bundled) {
            (Some(dir), _) => ModelSource::Directory(dir.clone()),
            (None, true) => ModelSource::Bundled,
            (None, false) => ModelSource::None,
        }
    }
}

enum ModelSlot {
    /// Not resolved yet; resolved on first use.
    Pending(ModelSource),
    Active(Box<TrainedModel>),
    Empty,
}

/// Orchestrates preprocessing, decluttering, training and prediction.
///
/// Operations that can replace the active model take `&mut self`, so a
/// single agent never predicts while it is being retrained. Use two agents
/// to keep serving during retraining.
pub struct Agent {
    config: Config,
    normalizer: Normalizer,
    extractor: Extractor,
    classifier: ActiveClassifier,
    slot: ModelSlot,
}

impl Agent {
    pub fn new(config: Config, source: ModelSource) -> Result<Self> {
        config.label_encoding.validate()?;
        debug!(model = %config.normalization_model, source = ?source, "creating agent");
        Ok(Self {
            normalizer: Normalizer::new(config.normalization_model)?,
            extractor: Extractor::new()?,
            classifier: ActiveClassifier::new(config.training.clone()),
            slot: match source {
                ModelSource::None => ModelSlot::Empty,
                other => ModelSlot::Pending(other),
            },
            config,
        })
    }

    /// Agent whose model source comes from `config.model`.
    pub fn from_config(config: Config) -> Result<Self> {
        let source = ModelSource::from_config(&config);
        Self::new(config, source)
    }

    pub fn label_encoding(&self) -> &LabelEncoding {
        &self.config.label_encoding
    }

    /// Normalize each text. Same length and order as `texts`.
    pub fn preprocess_data<S: AsRef<str>>(&self, texts: &[S]) -> Vec<NormalizedNotice> {
        self.normalizer.normalize_batch(texts)
    }

    /// Extract structured copyright and license fields from each text.
    ///
    /// `hints` carries an optional per-row label and is not consulted by the
    /// extraction rules. It must be empty or parallel to `texts`.
    pub fn declutter<S: AsRef<str>>(
        &self,
        texts: &[S],
        hints: &[Label],
    ) -> Result<Vec<ExtractionResult>> {
        if !hints.is_empty() && hints.len() != texts.len() {
            return Err(SieveError::InputShape {
                texts: texts.len(),
                labels: hints.len(),
            });
        }
        Ok(self.extractor.declutter_batch(texts))
    }

    /// Train from boundary label tokens decoded through the configured
    /// [`LabelEncoding`].
    pub fn train_false_positive_detector_model<S, L>(&mut self, texts: &[S], labels: &[L]) -> Result<()>
    where
        S: AsRef<str>,
        L: AsRef<str>,
    {
        if texts.len() != labels.len() {
            return Err(SieveError::InputShape {
                texts: texts.len(),
                labels: labels.len(),
            });
        }
        let labels = self.config.label_encoding.decode_all(labels)?;
        self.train_labeled(texts, &labels)
    }

    /// Train from already-decoded labels. The active model is replaced only
    /// when both the feature pipeline and the classifier fit.
    pub fn train_labeled<S: AsRef<str>>(&mut self, texts: &[S], labels: &[Label]) -> Result<()> {
        let model = self.fit_model(texts, labels)?;
        info!(
            examples = model.counts.total(),
            dimensions = model.vocabulary.dim(),
            "trained false-positive detector"
        );
        self.slot = ModelSlot::Active(Box::new(model));
        Ok(())
    }

    /// Label each text. Empty input returns immediately without resolving a model.
    pub fn predict<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<Vec<Label>> {
        self.score(texts, |classifier, features, params| classifier.predict(features, params))
    }

    /// [`predict`](Self::predict), encoded back to canonical boundary tokens.
    pub fn predict_tokens<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<Vec<String>> {
        let labels = self.predict(texts)?;
        Ok(labels
            .into_iter()
            .map(|l| self.config.label_encoding.encode(l).to_string())
            .collect())
    }

    /// False-positive probability per text.
    pub fn predict_proba<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<Vec<f64>> {
        self.score(texts, |classifier, features, params| {
            classifier.predict_proba(features, params)
        })
    }

    /// Predict and score against gold label tokens.
    pub fn evaluate<S, L>(&mut self, texts: &[S], labels: &[L]) -> Result<EvaluationReport>
    where
        S: AsRef<str>,
        L: AsRef<str>,
    {
        if texts.len() != labels.len() {
            return Err(SieveError::InputShape {
                texts: texts.len(),
                labels: labels.len(),
            });
        }
        let gold = self.config.label_encoding.decode_all(labels)?;
        let predicted = self.predict(texts)?;
        EvaluationReport::from_predictions(&gold, &predicted)
    }

    /// Persist the active model to `path`, replacing whatever is there.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.resolve_model()?;
        let model = self.model()?;
        store::save(model, path.as_ref())?;
        info!(path = %path.as_ref().display(), "saved model");
        Ok(())
    }

    /// Load a model saved with [`save`](Self::save) into the active slot.
    /// On failure the previous model stays active.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let model = store::load(path.as_ref(), self.normalizer.model())?;
        info!(path = %path.as_ref().display(), examples = model.counts.total(), "loaded model");
        self.slot = ModelSlot::Active(Box::new(model));
        Ok(())
    }

    /// Provenance of the active model, resolving it if needed.
    pub fn model_info(&mut self) -> Result<ModelInfo> {
        self.resolve_model()?;
        Ok(self.model()?.info())
    }

    /// Whether a model is active without resolving a pending source.
    pub fn has_active_model(&self) -> bool {
        matches!(self.slot, ModelSlot::Active(_))
    }

    /// Normalize and vectorize `texts` with the active model, then run `f`.
    fn score<S, T, F>(&mut self, texts: &[S], f: F) -> Result<Vec<T>>
    where
        S: AsRef<str>,
        F: FnOnce(&ActiveClassifier, &[FeatureVector], &ActiveParams) -> Vec<T>,
    {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.resolve_model()?;
        let model = self.model()?;
        let corpus = self.normalizer.normalize_batch(texts);
        let features = model.vocabulary.transform_batch(&corpus);
        Ok(f(&self.classifier, &features, &model.params))
    }

    fn model(&self) -> Result<&TrainedModel> {
        match &self.slot {
            ModelSlot::Active(model) => Ok(&**model),
            _ => Err(SieveError::ModelNotLoaded),
        }
    }

    /// Turn a pending source into the active model. A failed resolution
    /// leaves the source pending.
    fn resolve_model(&mut self) -> Result<()> {
        let source = match &self.slot {
            ModelSlot::Pending(source) => source.clone(),
            ModelSlot::Active(_) => return Ok(()),
            ModelSlot::Empty => return Err(SieveError::ModelNotLoaded),
        };

        let model = match source {
            ModelSource::Bundled => self.fit_bundled()?,
            ModelSource::Directory(dir) => store::load(&dir, self.normalizer.model())?,
            ModelSource::None => {
                self.slot = ModelSlot::Empty;
                return Err(SieveError::ModelNotLoaded);
            }
        };
        self.slot = ModelSlot::Active(Box::new(model));
        Ok(())
    }

    fn fit_model<S: AsRef<str>>(&self, texts: &[S], labels: &[Label]) -> Result<TrainedModel> {
        if texts.len() != labels.len() {
            return Err(SieveError::InputShape {
                texts: texts.len(),
                labels: labels.len(),
            });
        }
        let corpus = self.normalizer.normalize_batch(texts);
        let vocabulary = FittedVocabulary::fit(&corpus, &self.config.features);
        let features = vocabulary.transform_batch(&corpus);
        let params = self.classifier.fit(&features, labels)?;

        Ok(TrainedModel {
            normalization_model: self.normalizer.model(),
            vocabulary,
            params,
            counts: ClassCounts::of(labels),
            trained_at: Utc::now(),
        })
    }

    fn fit_bundled(&self) -> Result<TrainedModel> {
        let (texts, labels) = seed_corpus()?;
        debug!(examples = texts.len(), "training bundled model from seed corpus");
        self.fit_model(&texts, &labels)
    }
}

#[derive(Deserialize)]
struct SeedExample {
    text: String,
    false_positive: bool,
}

fn seed_corpus() -> Result<(Vec<String>, Vec<Label>)> {
    let mut texts = Vec::new();
    let mut labels = Vec::new();
    for (line_no, line) in SEED_CORPUS.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let example: SeedExample = serde_json::from_str(line).map_err(|e| {
            SieveError::model_load("<bundled>", format!("seed corpus line {}: {}", line_no + 1, e))
        })?;
        texts.push(example.text);
        labels.push(if example.false_positive {
            Label::FalsePositive
        } else {
            Label::Genuine
        });
    }
    Ok((texts, labels))
}
