use serde::{Deserialize, Serialize};

/// The two semantic classes a scanned notice can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Label {
    Genuine,
    FalsePositive,
}

impl Label {
    /// Both classes, in the order used for reports.
    pub const ALL: [Label; 2] = [Label::Genuine, Label::FalsePositive];

    pub fn is_false_positive(self) -> bool {
        self == Label::FalsePositive
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Genuine => write!(f, "genuine"),
            Label::FalsePositive => write!(f, "false-positive"),
        }
    }
}

/// One `{year, holder}` pair recovered from a copyright marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyrightEntry {
    #[serde(rename = "year")]
    pub year_span: String,
    pub holder: String,
}

/// Structured output of the extractor for one raw notice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub copyrights: Vec<CopyrightEntry>,
    pub licenses: Vec<String>,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.copyrights.is_empty() && self.licenses.is_empty()
    }
}

impl std::fmt::Display for ExtractionResult {
    /// Human-readable single-line form, e.g. `© 1998 ACME Corp; license: MIT`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts: Vec<String> = self
            .copyrights
            .iter()
            .map(|c| format!("© {} {}", c.year_span, c.holder))
            .collect();
        parts.extend(self.licenses.iter().map(|l| format!("license: {}", l)));
        write!(f, "{}", parts.join("; "))
    }
}

/// Canonical token/lemma sequence derived from a raw notice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedNotice {
    tokens: Vec<String>,
}

impl NormalizedNotice {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens joined by single spaces. Normalizing this text again yields the
    /// same notice.
    pub fn to_text(&self) -> String {
        self.tokens.join(" ")
    }
}

impl std::fmt::Display for NormalizedNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_result_json_shape() {
        let result = ExtractionResult {
            copyrights: vec![CopyrightEntry {
                year_span: "1998".to_string(),
                holder: "ACME Corp".to_string(),
            }],
            licenses: vec!["MIT".to_string()],
        };
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(
            json,
            r#"{"copyrights":[{"year":"1998","holder":"ACME Corp"}],"licenses":["MIT"]}"#
        );
    }

    #[test]
    fn test_extraction_result_display() {
        let result = ExtractionResult {
            copyrights: vec![CopyrightEntry {
                year_span: "2001-2004".to_string(),
                holder: "Jane Doe".to_string(),
            }],
            licenses: vec!["Apache 2.0".to_string()],
        };
        assert_eq!(result.to_string(), "© 2001-2004 Jane Doe; license: Apache 2.0");
        assert_eq!(ExtractionResult::default().to_string(), "");
    }

    #[test]
    fn test_label_display() {
        assert_eq!(Label::Genuine.to_string(), "genuine");
        assert_eq!(Label::FalsePositive.to_string(), "false-positive");
        assert!(Label::FalsePositive.is_false_positive());
    }
}
