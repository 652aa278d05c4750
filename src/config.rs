use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::classifier::TrainingConfig;
use crate::error::SieveError;
use crate::features::FeatureConfig;
use crate::models::Label;
use crate::normalize::NormalizationModel;

/// Root configuration structure, deserialized from `.copyright-sieve/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tokenizer/lemmatizer every notice goes through.
    pub normalization_model: NormalizationModel,
    /// Boundary tokens for the two label classes.
    pub label_encoding: LabelEncoding,
    pub features: FeatureConfig,
    pub training: TrainingConfig,
    pub model: ModelConfig,
    pub input: InputConfig,
}

/// Mapping between caller-defined label tokens and [`Label`].
///
/// The first token of each list is the canonical one used for output.
/// Matching is case-insensitive after trimming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoding {
    pub false_positive: Vec<String>,
    pub genuine: Vec<String>,
}

impl Default for LabelEncoding {
    fn default() -> Self {
        Self {
            false_positive: vec!["t".into(), "true".into(), "1".into()],
            genuine: vec!["f".into(), "false".into(), "0".into()],
        }
    }
}

impl LabelEncoding {
    /// Both token lists must be non-empty and share no token.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.false_positive.is_empty() || self.genuine.is_empty() {
            return Err(SieveError::Config(
                "label_encoding needs at least one token per class".into(),
            ));
        }
        for token in &self.false_positive {
            let token = token.trim();
            if self.genuine.iter().any(|g| g.trim().eq_ignore_ascii_case(token)) {
                return Err(SieveError::Config(format!(
                    "label token {:?} is mapped to both classes",
                    token
                )));
            }
        }
        Ok(())
    }

    pub fn decode(&self, token: &str) -> crate::error::Result<Label> {
        let token = token.trim();
        let matches = |list: &[String]| list.iter().any(|t| t.trim().eq_ignore_ascii_case(token));
        if matches(&self.false_positive) {
            Ok(Label::FalsePositive)
        } else if matches(&self.genuine) {
            Ok(Label::Genuine)
        } else {
            Err(SieveError::InvalidLabel(token.to_string()))
        }
    }

    pub fn decode_all<S: AsRef<str>>(&self, tokens: &[S]) -> crate::error::Result<Vec<Label>> {
        tokens.iter().map(|t| self.decode(t.as_ref())).collect()
    }

    /// Canonical token for `label`.
    pub fn encode(&self, label: Label) -> &str {
        let list = match label {
            Label::FalsePositive => &self.false_positive,
            Label::Genuine => &self.genuine,
        };
        list.first().map(|s| s.trim()).unwrap_or_default()
    }
}

/// Where an agent gets its model from, the `[model]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Trained model directory. Takes precedence over the bundled model.
    pub dir: Option<PathBuf>,
    /// Fall back to the model trained from the bundled seed corpus.
    pub bundled: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            dir: None,
            bundled: true,
        }
    }
}

/// Record field names, the `[input]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Text field of labelled records (train / evaluate).
    pub text_field: String,
    /// Label field of labelled records.
    pub label_field: String,
    /// Text field of unlabelled records (preprocess / declutter / predict).
    pub content_field: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            text_field: "copyright".into(),
            label_field: "falsePositive".into(),
            content_field: "original_content".into(),
        }
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<project_path>/.copyright-sieve/config.toml`
/// 3. `~/.config/copyright-sieve/config.toml`
/// 4. Built-in [`Config::default`]
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    if let Some(path) = config_override {
        return read_config(path);
    }

    let project_config = project_path.join(".copyright-sieve").join("config.toml");
    if project_config.exists() {
        return read_config(&project_config);
    }

    if let Some(home) = dirs::home_dir() {
        let home_config = home
            .join(".config")
            .join("copyright-sieve")
            .join("config.toml");
        if home_config.exists() {
            return read_config(&home_config);
        }
    }

    Ok(Config::default())
}

fn read_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: Config =
        toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))?;
    config.label_encoding.validate()?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_label_encoding() {
        let enc = LabelEncoding::default();
        assert_eq!(enc.decode("t").unwrap(), Label::FalsePositive);
        assert_eq!(enc.decode(" TRUE ").unwrap(), Label::FalsePositive);
        assert_eq!(enc.decode("f").unwrap(), Label::Genuine);
        assert_eq!(enc.decode("0").unwrap(), Label::Genuine);
        assert!(matches!(enc.decode("maybe"), Err(SieveError::InvalidLabel(_))));
    }

    #[test]
    fn test_label_encoding_round_trip() {
        let enc = LabelEncoding::default();
        for label in Label::ALL {
            assert_eq!(enc.decode(enc.encode(label)).unwrap(), label);
        }
        assert_eq!(enc.encode(Label::FalsePositive), "t");
        assert_eq!(enc.encode(Label::Genuine), "f");
    }

    #[test]
    fn test_label_encoding_rejects_overlap() {
        let enc = LabelEncoding {
            false_positive: vec!["yes".into(), "x".into()],
            genuine: vec!["no".into(), "X".into()],
        };
        assert!(matches!(enc.validate(), Err(SieveError::Config(_))));

        let enc = LabelEncoding {
            false_positive: vec![],
            genuine: vec!["no".into()],
        };
        assert!(matches!(enc.validate(), Err(SieveError::Config(_))));
    }

    #[test]
    fn test_parse_partial_config() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
normalization_model = "en-rules-v1"

[label_encoding]
false_positive = ["fp"]
genuine = ["ok"]

[training]
epochs = 50

[model]
dir = "models/current"
"#
        )
        .unwrap();

        let config = load_config(Path::new("."), Some(f.path())).unwrap();
        assert_eq!(config.normalization_model, NormalizationModel::EnRulesV1);
        assert_eq!(config.label_encoding.encode(Label::Genuine), "ok");
        assert_eq!(config.training.epochs, 50);
        assert_eq!(config.training.learning_rate, TrainingConfig::default().learning_rate);
        assert_eq!(config.features, FeatureConfig::default());
        assert_eq!(config.model.dir, Some(PathBuf::from("models/current")));
        assert!(config.model.bundled);
        assert_eq!(config.input.text_field, "copyright");
    }

    #[test]
    fn test_unknown_normalization_model_rejected() {
        let mut f = NamedTempFile::new().unwrap();
        writeln!(f, r#"normalization_model = "de-rules-v9""#).unwrap();
        assert!(load_config(Path::new("."), Some(f.path())).is_err());
    }

    #[test]
    fn test_project_config_discovered() {
        let dir = TempDir::new().unwrap();
        let cfg_dir = dir.path().join(".copyright-sieve");
        std::fs::create_dir_all(&cfg_dir).unwrap();
        std::fs::write(cfg_dir.join("config.toml"), "[input]\ntext_field = \"text\"\n").unwrap();

        let config = load_config(dir.path(), None).unwrap();
        assert_eq!(config.input.text_field, "text");
        assert_eq!(config.input.label_field, "falsePositive");
    }
}
