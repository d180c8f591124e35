//! Keyword scoring
//!
//! An entry is scored field by field. Within a field the whole query
//! phrase appearing as a substring is worth 100; each query word present is
//! worth 10 plus a repetition bonus of 2 per extra occurrence, capped at
//! 10. Field scores are weighted (title doubled, tags at 1.5) and a
//! category substring match adds a flat 20. Priority adjusts the summed
//! score last and only when something matched at all.

use crate::memory::{IndexEntry, Priority};

/// A query lowered and split once, reused across every entry.
#[derive(Debug, Clone)]
pub struct QueryTerms {
    phrase: String,
    words: Vec<String>,
}

impl QueryTerms {
    /// Normalize a raw query. Empty or whitespace-only input yields no
    /// terms, and no terms score zero against everything.
    pub fn parse(query: &str) -> Self {
        let phrase = query.trim().to_lowercase();
        let words = phrase.split_whitespace().map(str::to_string).collect();
        Self { phrase, words }
    }

    pub fn is_empty(&self) -> bool {
        self.phrase.is_empty()
    }
}

/// Score an index entry against parsed query terms. Zero means no match.
pub fn score_entry(entry: &IndexEntry, query: &QueryTerms) -> f64 {
    if query.is_empty() {
        return 0.0;
    }

    let mut raw = 2.0 * field_score(&entry.title, query);
    raw += field_score(&entry.snippet, query);
    raw += 1.5 * field_score(&entry.tags.join(" "), query);
    if entry.category.to_lowercase().contains(&query.phrase) {
        raw += 20.0;
    }

    if raw <= 0.0 {
        return 0.0;
    }
    match entry.priority {
        Priority::High => raw * 1.5 + 50.0,
        Priority::Normal => raw,
        Priority::Low => raw * 0.7,
    }
}

fn field_score(text: &str, query: &QueryTerms) -> f64 {
    let text = text.to_lowercase();
    let mut score = 0.0;
    if text.contains(&query.phrase) {
        score += 100.0;
    }
    for word in &query.words {
        let occurrences = text.matches(word.as_str()).count();
        if occurrences > 0 {
            score += 10.0 + 2.0 * (occurrences - 1).min(5) as f64;
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Memory;

    fn entry(title_line: &str, body: &str, tags: &[&str]) -> IndexEntry {
        let content = format!("{title_line}\n{body}");
        let memory = Memory::new(
            "decision",
            &content,
            tags.iter().map(|t| t.to_string()).collect(),
        );
        memory.index_entry("memories/decision/2026-01-01-x.md")
    }

    #[test]
    fn test_phrase_match_in_title_outranks_word_matches_in_snippet() {
        let terms = QueryTerms::parse("use postgres");
        let title_hit = entry("Use Postgres", "for the storage layer", &[]);
        let snippet_hit = entry("Storage decision", "postgres is one option to use", &[]);

        let title_score = score_entry(&title_hit, &terms);
        let snippet_score = score_entry(&snippet_hit, &terms);
        assert!(
            title_score > snippet_score,
            "title phrase {title_score} should beat snippet words {snippet_score}"
        );
    }

    #[test]
    fn test_word_score_and_repetition_bonus() {
        // Two words so the whole-phrase bonus stays out of the way; only
        // "retry" appears. One occurrence: 10. Three: 10 + 2*2 = 14.
        let terms = QueryTerms::parse("retry backoff");
        let once = entry("Notes", "retry behaviour", &[]);
        let thrice = entry("Notes", "retry, retry, then retry again", &[]);

        assert_eq!(score_entry(&once, &terms), 10.0);
        assert_eq!(score_entry(&thrice, &terms), 14.0);
    }

    #[test]
    fn test_single_word_query_also_earns_the_phrase_bonus() {
        let terms = QueryTerms::parse("retry");
        // The word is the phrase: 100 + 10, snippet weight 1
        let hit = entry("Notes", "retry behaviour", &[]);
        assert_eq!(score_entry(&hit, &terms), 110.0);
    }

    #[test]
    fn test_repetition_bonus_caps_at_ten() {
        let terms = QueryTerms::parse("x z");
        let many = entry("Notes", &"x ".repeat(40), &[]);
        // 10 for presence + capped bonus of 10; "z" never matches
        assert_eq!(score_entry(&many, &terms), 20.0);
    }

    #[test]
    fn test_field_weights() {
        let terms = QueryTerms::parse("kafka");
        // Word in title only: (100 phrase + 10 word) * 2 = 220
        let in_title = entry("kafka", "body text", &[]);
        // Word in tags only: (100 + 10) * 1.5 = 165
        let in_tags = entry("Queue notes", "body text", &["kafka"]);
        // Word in snippet only: 100 + 10 = 110
        let in_snippet = entry("Queue notes", "kafka fits here", &[]);

        assert_eq!(score_entry(&in_title, &terms), 220.0);
        assert_eq!(score_entry(&in_tags, &terms), 165.0);
        assert_eq!(score_entry(&in_snippet, &terms), 110.0);
    }

    #[test]
    fn test_category_substring_adds_flat_twenty() {
        let terms = QueryTerms::parse("decision");
        let no_text_match = entry("Unrelated title", "unrelated body", &[]);
        // Only the category ("decision") matches
        assert_eq!(score_entry(&no_text_match, &terms), 20.0);
    }

    #[test]
    fn test_priority_adjustment() {
        let terms = QueryTerms::parse("retry");
        let mut high = entry("Notes", "retry behaviour", &[]);
        let mut low = entry("Notes", "retry behaviour", &[]);
        high.priority = Priority::High;
        low.priority = Priority::Low;
        let normal = entry("Notes", "retry behaviour", &[]);

        // Raw snippet score is 110 (phrase + word)
        assert_eq!(score_entry(&normal, &terms), 110.0);
        assert_eq!(score_entry(&high, &terms), 110.0 * 1.5 + 50.0);
        assert_eq!(score_entry(&low, &terms), 110.0 * 0.7);
    }

    #[test]
    fn test_high_priority_does_not_rescue_non_matches() {
        let terms = QueryTerms::parse("nothing matches this");
        let mut miss = entry("Title", "body", &[]);
        miss.priority = Priority::High;
        assert_eq!(score_entry(&miss, &terms), 0.0);
    }

    #[test]
    fn test_empty_query_scores_zero() {
        let terms = QueryTerms::parse("   ");
        assert!(terms.is_empty());
        let any = entry("Title", "body", &["tag"]);
        assert_eq!(score_entry(&any, &terms), 0.0);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let terms = QueryTerms::parse("POSTGRES");
        let hit = entry("Use postgres", "", &[]);
        assert!(score_entry(&hit, &terms) > 0.0);
    }
}
