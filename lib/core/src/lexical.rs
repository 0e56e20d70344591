//! Text-only similarity between a query and catalog fields.
//!
//! A query scores 1.0 against any target that contains it after
//! normalization. Otherwise the score blends word overlap (70%) with a
//! character-level block-matching ratio (30%).

use crate::catalog::{ContentType, MediaRecord};
use crate::matcher::sequence_ratio;
use ahash::AHashSet;

const WORD_WEIGHT: f64 = 0.7;
const SEQUENCE_WEIGHT: f64 = 0.3;
/// Category matches count for half of a title match
const META_WEIGHT: f64 = 0.5;

/// Lowercase, map `-` and `_` to spaces, collapse whitespace
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A query normalized once and reused against many targets
#[derive(Debug, Clone)]
pub struct LexicalQuery {
    normalized: String,
    chars: Vec<char>,
    words: AHashSet<String>,
}

impl LexicalQuery {
    pub fn new(query: &str) -> Self {
        let normalized = normalize(query);
        let chars = normalized.chars().collect();
        let words = normalized
            .split(' ')
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            normalized,
            chars,
            words,
        }
    }

    #[inline]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Similarity against one target string, in [0, 1]
    pub fn score(&self, target: &str) -> f64 {
        let target = normalize(target);

        if target.contains(self.normalized.as_str()) {
            return 1.0;
        }

        if self.words.is_empty() {
            return 0.0;
        }

        let common = target
            .split(' ')
            .filter(|w| !w.is_empty())
            .collect::<AHashSet<&str>>()
            .into_iter()
            .filter(|w| self.words.contains(*w))
            .count();
        let word_overlap = common as f64 / self.words.len() as f64;

        let target_chars: Vec<char> = target.chars().collect();
        let sequence = sequence_ratio(&self.chars, &target_chars);

        WORD_WEIGHT * word_overlap + SEQUENCE_WEIGHT * sequence
    }
}

/// One-shot similarity between two strings
pub fn score(query: &str, target: &str) -> f64 {
    LexicalQuery::new(query).score(target)
}

/// Scores whole records against a query
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalScorer;

impl LexicalScorer {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Best of title, description and (images only) the weighted category match
    pub fn score_record(&self, query: &LexicalQuery, record: &MediaRecord) -> f64 {
        let title = query.score(&record.title);
        let description = query.score(&record.description);

        let meta = match (&record.content_type, &record.meta) {
            (ContentType::Image, Some(meta)) => {
                META_WEIGHT * query.score(&meta.category).max(query.score(&meta.sub_category))
            }
            _ => 0.0,
        };

        title.max(description).max(meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MediaMeta;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  T-Shirt_having   Collar "), "t shirt having collar");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("--__"), "");
    }

    #[test]
    fn test_substring_short_circuit() {
        assert_eq!(score("red-shoe", "A Red Shoe for kids"), 1.0);
        assert_eq!(score("", "anything"), 1.0);
    }

    #[test]
    fn test_blank_query_contained_everywhere() {
        assert_eq!(score("   ", "abc"), 1.0);
        assert_eq!(score("-_-", ""), 1.0);
        assert_eq!(score("x", ""), 0.0);
    }

    #[test]
    fn test_blended_score() {
        // word overlap 1/2; blocks " hat" and "e" give 2*5/15
        let s = score("blue hat", "red hat");
        let expected = 0.7 * 0.5 + 0.3 * (10.0 / 15.0);
        assert!((s - expected).abs() < 1e-12, "got {}", s);
    }

    #[test]
    fn test_meta_bonus_only_for_images() {
        let meta = Some(MediaMeta {
            category: "footwear".to_string(),
            sub_category: "sneakers".to_string(),
        });
        let scorer = LexicalScorer::new();
        let query = LexicalQuery::new("sneakers");

        let image = MediaRecord::new(ContentType::Image, "zzz", "zzz", "l", meta.clone());
        assert!((scorer.score_record(&query, &image) - 0.5).abs() < 1e-12);

        let video = MediaRecord::new(ContentType::Video, "zzz", "zzz", "l", meta);
        assert_eq!(scorer.score_record(&query, &video), 0.0);
    }
}
