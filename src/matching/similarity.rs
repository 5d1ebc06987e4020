//! Trigram similarity with the same tokenization as PostgreSQL's pg_trgm:
//! lowercase, split on non-alphanumerics, pad each word with two leading
//! and one trailing space, compare the trigram sets with Jaccard.

use std::collections::HashSet;

pub fn trigrams(s: &str) -> HashSet<[char; 3]> {
    let lowered = s.to_lowercase();
    let mut set = HashSet::new();
    for word in lowered.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let padded: Vec<char> = "  ".chars().chain(word.chars()).chain(" ".chars()).collect();
        for window in padded.windows(3) {
            set.insert([window[0], window[1], window[2]]);
        }
    }
    set
}

/// Shared trigrams over the union of both sets, in `[0, 1]`.
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(&right).count();
    shared as f64 / (left.len() + right.len() - shared) as f64
}

/// Case-insensitive containment in either direction.
pub fn overlaps(a: &str, b: &str) -> bool {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_words_score_one() {
        assert_eq!(trigram_similarity("Volkswagen", "volkswagen"), 1.0);
        assert_eq!(trigram_similarity("land-rover", "Land Rover"), 1.0);
    }

    #[test]
    fn word_padding_matches_pg_trgm() {
        // "cat" -> {"  c", " ca", "cat", "at "}
        assert_eq!(trigrams("cat").len(), 4);
        assert_eq!(trigrams("a").len(), 2);
    }

    #[test]
    fn partial_overlap() {
        let sim = trigram_similarity("Essence", "Essence Hybrid");
        assert!(sim > 0.4 && sim < 1.0, "got {}", sim);
        assert!(trigram_similarity("Diesel", "Essence") < 0.4);
        assert_eq!(trigram_similarity("", "Golf"), 0.0);
    }

    #[test]
    fn containment_either_way() {
        assert!(overlaps("Golf", "Golf VII"));
        assert!(overlaps("golf vii", "GOLF"));
        assert!(!overlaps("Polo", "Golf"));
        assert!(!overlaps("", "Golf"));
    }
}
