//! Deterministic text canonicalization ahead of feature extraction.
//!
//! - [`lemma`] — versioned lemmatizer and stopword tables.
//! - [`Normalizer`] — entity decoding, Unicode folding, placeholder
//!   substitution, tokenization, lemmatization, stopword removal.

pub mod lemma;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::error::Result;
use crate::models::NormalizedNotice;

/// The tokenizer/lemmatizer a [`Normalizer`] is built with.
///
/// Persisted with every trained model; a model only loads into an agent
/// configured with the same normalization model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NormalizationModel {
    /// English, rule-based lemmatizer, first revision.
    #[default]
    #[serde(rename = "en-rules-v1")]
    EnRulesV1,
}

impl NormalizationModel {
    pub fn id(&self) -> &'static str {
        match self {
            NormalizationModel::EnRulesV1 => "en-rules-v1",
        }
    }
}

impl std::fmt::Display for NormalizationModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

pub const EMAIL_PLACEHOLDER: &str = "__email__";
pub const URL_PLACEHOLDER: &str = "__url__";
pub const YEAR_PLACEHOLDER: &str = "__year__";

/// Named HTML entities seen in scanner output. `&amp;` comes last so that
/// escaped entities are decoded exactly once.
const NAMED_ENTITIES: &[(&str, &str)] = &[
    ("&copy;", "©"),
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&amp;", "&"),
];

pub struct Normalizer {
    model: NormalizationModel,
    numeric_entity: Regex,
    url: Regex,
    email: Regex,
    year: Regex,
    token: Regex,
}

impl Normalizer {
    pub fn new(model: NormalizationModel) -> Result<Self> {
        Ok(Self {
            model,
            numeric_entity: Regex::new(r"(?i)&#(x[0-9a-f]{1,6}|[0-9]{1,7});")?,
            url: Regex::new(r"(?:(?:https?|ftp)://|www\.)[^\s<>()]+")?,
            email: Regex::new(r"[\w.+\-]+@[\w\-]+(?:\.[\w\-]+)+")?,
            year: Regex::new(r"\b(?:19|20)[0-9]{2}\b")?,
            token: Regex::new(r"©|[\p{L}\p{M}\p{N}_]+(?:['\-][\p{L}\p{M}\p{N}_]+)*")?,
        })
    }

    pub fn model(&self) -> NormalizationModel {
        self.model
    }

    /// Normalize one raw notice. Pure: equal inputs give equal outputs.
    pub fn normalize(&self, text: &str) -> NormalizedNotice {
        let canonical = self.canonicalize(text);

        let tokens = self
            .token
            .find_iter(&canonical)
            .map(|m| lemma::lemmatize(m.as_str()))
            .filter(|t| !lemma::is_stopword(t))
            .collect();

        NormalizedNotice::new(tokens)
    }

    /// Normalize a batch. The output has the same length and order as the
    /// input; an empty or all-punctuation notice becomes an empty
    /// [`NormalizedNotice`] rather than being dropped.
    pub fn normalize_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<NormalizedNotice> {
        let out: Vec<NormalizedNotice> = texts.iter().map(|t| self.normalize(t.as_ref())).collect();
        debug!(
            model = %self.model,
            notices = out.len(),
            empty = out.iter().filter(|n| n.is_empty()).count(),
            "normalized batch"
        );
        out
    }

    /// Entity decoding, NFKC, case and punctuation folding, placeholders.
    fn canonicalize(&self, text: &str) -> String {
        let decoded = self.decode_entities(text);
        let folded: String = decoded
            .nfkc()
            .flat_map(char::to_lowercase)
            .map(fold_punctuation)
            .collect();
        let folded = folded.replace("(c)", " © ");

        let s = self.url.replace_all(&folded, format!(" {} ", URL_PLACEHOLDER));
        let s = self.email.replace_all(&s, format!(" {} ", EMAIL_PLACEHOLDER));
        let s = self.year.replace_all(&s, format!(" {} ", YEAR_PLACEHOLDER));
        s.into_owned()
    }

    fn decode_entities(&self, text: &str) -> String {
        let numeric = self.numeric_entity.replace_all(text, |caps: &Captures| {
            let body = &caps[1];
            let code = match body.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => body.parse::<u32>().ok(),
            };
            code.and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        });

        NAMED_ENTITIES
            .iter()
            .fold(numeric.into_owned(), |acc, (entity, replacement)| {
                acc.replace(entity, replacement)
            })
    }
}

/// Fold quote and dash variants onto their ASCII forms.
fn fold_punctuation(c: char) -> char {
    match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' | '`' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{00AB}' | '\u{00BB}' => '"',
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
        | '\u{2212}' => '-',
        other => other,
    }
}
