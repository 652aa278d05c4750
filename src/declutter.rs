//! Pattern-based extraction of `{year, holder}` pairs and license clauses
//! from noisy copyright text.
//!
//! Extraction is best-effort and never fails. A marker without both a year
//! span and a holder yields no entry.

use regex::Regex;
use tracing::debug;

use crate::error::Result;
use crate::models::{CopyrightEntry, ExtractionResult};

/// One or more adjacent markers (`©`, `(c)`, `copyright`), a year span, an
/// optional `by`, and the holder up to `.`, `,` or a newline. A marker with
/// no year right after it does not match, so scanning resumes behind it.
const COPYRIGHT_PATTERN: &str = concat!(
    r"(?i)(?:(?:©|\(c\)|\bcopyright\b)[\s:]*)+",
    r"(?P<years>[0-9]{4}\b(?:\s*[-–]\s*(?:[0-9]{4}\b|present\b))?(?:\s*,\s*[0-9]{4}\b(?:\s*[-–]\s*(?:[0-9]{4}\b|present\b))?)*)[\s,]*",
    r"(?:by\b[\s:]*)?",
    r"(?P<holder>[^\n,.©]+)?",
);

/// `licensed under the <name>[ license].` where the final period ends a
/// sentence, so dotted versions such as `2.0` stay inside the name.
const LICENSE_PATTERN: &str =
    r"(?i)licensed\s+under\s+the\s+(?P<license>[\w\s.\-]{1,80}?)(?:\s+license)?\.(?:\s|$)";

const STOP_PHRASE_PATTERN: &str = r"(?i)\b(?:all\s+)?rights\s+reserved\b";

/// Markers that can start the next notice inside a holder (`©` never gets
/// into one).
const MARKER_PATTERN: &str = r"(?i)\(c\)|\bcopyright\b";

pub struct Extractor {
    copyright: Regex,
    license: Regex,
    stop_phrase: Regex,
    marker: Regex,
}

impl Extractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            copyright: Regex::new(COPYRIGHT_PATTERN)?,
            license: Regex::new(LICENSE_PATTERN)?,
            stop_phrase: Regex::new(STOP_PHRASE_PATTERN)?,
            marker: Regex::new(MARKER_PATTERN)?,
        })
    }

    /// Extract every copyright entry and license clause, left to right.
    pub fn declutter(&self, text: &str) -> ExtractionResult {
        let text = prepare(text);
        let mut result = ExtractionResult::default();

        let mut pos = 0;
        while let Some(caps) = self.copyright.captures_at(&text, pos) {
            let Some(whole) = caps.get(0) else { break };
            pos = whole.end();

            let years = caps.name("years").map(|m| clean(m.as_str())).unwrap_or_default();
            let holder = match caps.name("holder") {
                Some(m) => {
                    let raw = m.as_str();
                    // a later marker starts the next notice; rescan from there
                    if let Some(next) = self.marker.find(raw) {
                        pos = m.start() + next.start();
                    }
                    let raw = self.cut_holder(raw);
                    clean(raw)
                }
                None => String::new(),
            };

            if years.is_empty() || holder.is_empty() {
                continue;
            }
            result.copyrights.push(CopyrightEntry {
                year_span: years,
                holder,
            });
        }

        for caps in self.license.captures_iter(&text) {
            if let Some(name) = caps.name("license") {
                let name = clean(name.as_str());
                if !name.is_empty() {
                    result.licenses.push(name);
                }
            }
        }

        result
    }

    /// Declutter a batch, preserving length and order.
    pub fn declutter_batch<S: AsRef<str>>(&self, texts: &[S]) -> Vec<ExtractionResult> {
        let out: Vec<ExtractionResult> = texts.iter().map(|t| self.declutter(t.as_ref())).collect();
        debug!(
            notices = out.len(),
            with_entries = out.iter().filter(|r| !r.is_empty()).count(),
            "decluttered batch"
        );
        out
    }

    /// Holder text before the first stop phrase or the next marker.
    fn cut_holder<'a>(&self, holder: &'a str) -> &'a str {
        let end = [self.stop_phrase.find(holder), self.marker.find(holder)]
            .into_iter()
            .flatten()
            .map(|m| m.start())
            .min()
            .unwrap_or(holder.len());
        &holder[..end]
    }
}

/// Fold HTML copyright entities and curly double quotes.
fn prepare(text: &str) -> String {
    text.replace("&copy;", "©")
        .replace("&#169;", "©")
        .replace("&#xa9;", "©")
        .replace("&#xA9;", "©")
        .replace(['\u{201C}', '\u{201D}'], "\"")
}

fn clean(s: &str) -> String {
    s.trim_matches(|c: char| c.is_whitespace() || c == ',' || c == '.')
        .to_string()
}
