//! Rule-based English lemmatizer and stopword list backing
//! [`NormalizationModel::EnRulesV1`](super::NormalizationModel::EnRulesV1).
//!
//! Changing any table here changes the feature space of trained models, so
//! edits must come with a new model version.

/// Irregular forms that suffix rules cannot reach. Values must be fixed
/// points of [`lemmatize`].
const IRREGULAR: &[(&str, &str)] = &[
    ("am", "be"),
    ("are", "be"),
    ("is", "be"),
    ("was", "be"),
    ("were", "be"),
    ("been", "be"),
    ("being", "be"),
    ("has", "have"),
    ("had", "have"),
    ("having", "have"),
    ("does", "do"),
    ("did", "do"),
    ("done", "do"),
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("people", "person"),
    ("data", "datum"),
    ("written", "write"),
    ("wrote", "write"),
    ("writing", "write"),
    ("copyrighted", "copyright"),
    ("copyrighting", "copyright"),
    ("reserved", "reserve"),
    ("reserving", "reserve"),
    ("licensed", "license"),
    ("licencing", "licence"),
    ("licensing", "license"),
    ("licenced", "licence"),
    ("distributed", "distribute"),
    ("distributing", "distribute"),
    ("modified", "modify"),
    ("modifying", "modify"),
    ("granted", "grant"),
    ("provided", "provide"),
    ("providing", "provide"),
    ("permitted", "permit"),
    ("released", "release"),
    ("owned", "own"),
    ("authored", "author"),
    ("contributed", "contribute"),
    ("generated", "generate"),
    ("included", "include"),
    ("including", "include"),
    ("used", "use"),
    ("using", "use"),
    ("following", "follow"),
    ("made", "make"),
    ("making", "make"),
];

/// Reduce `token` to its lemma.
///
/// Tokens containing digits or underscores (years, placeholders, version
/// strings) are returned unchanged.
pub fn lemmatize(token: &str) -> String {
    if token
        .chars()
        .any(|c| c.is_ascii_digit() || c == '_' || c == '©')
    {
        return token.to_string();
    }

    // Every rule shortens the token or lands on a fixed point, so this ends.
    let mut current = token.to_string();
    while let Some(next) = step(&current) {
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Apply the first matching rule, or `None` when `token` is already a lemma.
fn step(token: &str) -> Option<String> {
    if let Some(stem) = token.strip_suffix("'s") {
        if !stem.is_empty() {
            return Some(stem.to_string());
        }
    }

    if let Some((_, lemma)) = IRREGULAR.iter().find(|(form, _)| *form == token) {
        return Some((*lemma).to_string());
    }

    let len = token.len();

    if len >= 5 {
        if let Some(stem) = token.strip_suffix("ies") {
            return Some(format!("{}y", stem));
        }
        if token.ends_with("sses")
            || token.ends_with("xes")
            || token.ends_with("zes")
            || token.ends_with("ches")
            || token.ends_with("shes")
        {
            return Some(token[..len - 2].to_string());
        }
    }

    if len >= 4
        && token.ends_with('s')
        && !(token.ends_with("ss") || token.ends_with("us") || token.ends_with("is"))
    {
        return Some(token[..len - 1].to_string());
    }

    None
}

/// Function words dropped after lemmatization.
///
/// Domain words that separate genuine notices from noise (`by`, `all`,
/// `copyright`, `right`, `reserve`) are deliberately absent.
pub fn is_stopword(lemma: &str) -> bool {
    matches!(
        lemma,
        "a" | "an"
            | "the"
            | "and"
            | "or"
            | "but"
            | "if"
            | "of"
            | "to"
            | "in"
            | "on"
            | "at"
            | "for"
            | "from"
            | "with"
            | "as"
            | "be"
            | "it"
            | "its"
            | "this"
            | "that"
            | "these"
            | "those"
            | "which"
            | "who"
            | "whom"
            | "whose"
            | "what"
            | "there"
            | "here"
            | "than"
            | "then"
            | "so"
            | "such"
            | "not"
            | "no"
            | "nor"
            | "can"
            | "could"
            | "may"
            | "might"
            | "shall"
            | "should"
            | "will"
            | "would"
            | "do"
            | "have"
            | "i"
            | "me"
            | "my"
            | "we"
            | "our"
            | "you"
            | "your"
            | "he"
            | "him"
            | "his"
            | "she"
            | "her"
            | "they"
            | "them"
            | "their"
            | "any"
            | "each"
            | "other"
            | "some"
            | "same"
            | "too"
            | "very"
            | "just"
            | "into"
            | "over"
            | "under"
            | "again"
            | "once"
            | "only"
            | "also"
            | "per"
            | "via"
            | "upon"
            | "about"
            | "above"
            | "below"
            | "between"
            | "through"
            | "during"
            | "before"
            | "after"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_rules() {
        assert_eq!(lemmatize("licenses"), "license");
        assert_eq!(lemmatize("copies"), "copy");
        assert_eq!(lemmatize("libraries"), "library");
        assert_eq!(lemmatize("classes"), "class");
        assert_eq!(lemmatize("boxes"), "box");
        assert_eq!(lemmatize("rights"), "right");
        assert_eq!(lemmatize("author's"), "author");
    }

    #[test]
    fn test_long_possessive_chains_reach_the_lemma() {
        assert_eq!(lemmatize("a's's's's's's's's's's"), "a");
        assert_eq!(lemmatize("holder's's's's's's's's's's"), "holder");
    }

    #[test]
    fn test_protected_endings() {
        assert_eq!(lemmatize("class"), "class");
        assert_eq!(lemmatize("status"), "status");
        assert_eq!(lemmatize("analysis"), "analysis");
        assert_eq!(lemmatize("yes"), "yes");
    }

    #[test]
    fn test_irregular_forms() {
        assert_eq!(lemmatize("reserved"), "reserve");
        assert_eq!(lemmatize("was"), "be");
        assert_eq!(lemmatize("children"), "child");
        assert_eq!(lemmatize("copyrighted"), "copyright");
    }

    #[test]
    fn test_tokens_with_digits_untouched() {
        assert_eq!(lemmatize("__year__"), "__year__");
        assert_eq!(lemmatize("gpl-2s"), "gpl-2s");
        assert_eq!(lemmatize("©"), "©");
    }

    #[test]
    fn test_irregular_values_are_fixed_points() {
        for (form, lemma) in IRREGULAR {
            assert_eq!(step(lemma), None, "{} -> {} is not a fixed point", form, lemma);
        }
    }

    #[test]
    fn test_lemmatize_is_idempotent() {
        for word in [
            "licenses", "copies", "childrens", "analyses", "reserved", "caches", "authors'",
            "distributions", "hosts", "gnus", "a's's's's's's's's's's", "foo's's's's's's's's's's's",
        ] {
            let once = lemmatize(word);
            assert_eq!(lemmatize(&once), once, "not idempotent for {}", word);
        }
    }

    #[test]
    fn test_domain_words_are_not_stopwords() {
        assert!(!is_stopword("by"));
        assert!(!is_stopword("all"));
        assert!(!is_stopword("copyright"));
        assert!(is_stopword("the"));
        assert!(is_stopword("be"));
    }
}
