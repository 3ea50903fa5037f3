//! Word-boundary keyword matching over recognized utterances.
//!
//! Words are maximal runs of ASCII letters, digits and `_`; everything else
//! is a boundary. Multi-word keywords match consecutive words.

/// Split text into words.
pub fn words(text: &str) -> Vec<&str> {
    text.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .collect()
}

/// True if any keyword (single word or phrase) occurs as whole words.
pub fn contains_any(words: &[&str], keywords: &[&str]) -> bool {
    keywords.iter().any(|k| contains_phrase(words, k))
}

fn contains_phrase(words: &[&str], phrase: &str) -> bool {
    let parts: Vec<&str> = phrase.split_whitespace().collect();
    if parts.is_empty() || parts.len() > words.len() {
        return false;
    }
    words.windows(parts.len()).any(|w| w == parts.as_slice())
}

/// True if the text contains a run of at least `min_run` uppercase ASCII letters.
pub fn has_capital_run(text: &str, min_run: usize) -> bool {
    let mut run = 0;
    for c in text.chars() {
        if c.is_ascii_uppercase() {
            run += 1;
            if run >= min_run {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_split_on_punctuation() {
        assert_eq!(words("go, back-now!"), vec!["go", "back", "now"]);
        assert!(words("  ?! ").is_empty());
    }

    #[test]
    fn test_whole_word_only() {
        let w = words("stopping the car");
        assert!(!contains_any(&w, &["stop"]));
        assert!(contains_any(&w, &["car"]));
    }

    #[test]
    fn test_phrase_match() {
        let w = words("please turn left now");
        assert!(contains_any(&w, &["turn left"]));
        assert!(!contains_any(&w, &["turn right"]));
        assert!(!contains_any(&words("left"), &["turn left"]));
    }

    #[test]
    fn test_capital_run() {
        assert!(has_capital_run("GO FORWARD", 4));
        assert!(!has_capital_run("GO NOW ABC", 4));
        assert!(!has_capital_run("", 4));
    }
}
