//! Token based string similarity on a 0-100 scale.
//!
//! `weighted_ratio` is the scorer used for country name matching. It combines
//! a plain indel ratio with token sort / token set alignment and, for strings
//! of very different length, their partial (best window) variants.

use std::collections::BTreeSet;

const UNBASE_SCALE: f64 = 0.95;

/// Lowercase, turn every non alphanumeric character into a space and trim.
/// Non-ASCII characters are dropped.
fn full_process(s: &str) -> String {
    s.chars()
        .filter(char::is_ascii)
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { ' ' })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Best of the plain, token and partial measures, weighted by how different
/// the two strings are in length. Both inputs go through `full_process`.
pub fn weighted_ratio(a: &str, b: &str) -> u8 {
    let p1 = full_process(a);
    let p2 = full_process(b);
    if p1.is_empty() || p2.is_empty() {
        return 0;
    }

    let base = raw_ratio(&p1, &p2);

    let (len1, len2) = (p1.chars().count() as f64, p2.chars().count() as f64);
    let len_ratio = len1.max(len2) / len1.min(len2);

    if len_ratio < 1.5 {
        let tsor = raw_token_sort(&p1, &p2, raw_ratio) * UNBASE_SCALE;
        let tser = raw_token_set(&p1, &p2, raw_ratio) * UNBASE_SCALE;
        return to_score(base.max(tsor).max(tser));
    }

    let partial_scale = if len_ratio > 8.0 { 0.6 } else { 0.9 };
    let partial = raw_partial_ratio(&p1, &p2) * partial_scale;
    let ptsor = raw_token_sort(&p1, &p2, raw_partial_ratio) * UNBASE_SCALE * partial_scale;
    let ptser = raw_token_set(&p1, &p2, raw_partial_ratio) * UNBASE_SCALE * partial_scale;

    to_score(base.max(partial).max(ptsor).max(ptser))
}

fn to_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

fn raw_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    indel_similarity(&a, &b)
}

fn indel_similarity(a: &[char], b: &[char]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let common = lcs_len(a, b);
    200.0 * common as f64 / (a.len() + b.len()) as f64
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

fn raw_partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (shorter, longer) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    if shorter.is_empty() {
        return 0.0;
    }
    if shorter.len() == longer.len() {
        return indel_similarity(shorter, longer);
    }

    let mut best = 0.0f64;
    for window in longer.windows(shorter.len()) {
        best = best.max(indel_similarity(shorter, window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn raw_token_sort(a: &str, b: &str, scorer: fn(&str, &str) -> f64) -> f64 {
    scorer(&sorted_tokens(a), &sorted_tokens(b))
}

fn raw_token_set(a: &str, b: &str, scorer: fn(&str, &str) -> f64) -> f64 {
    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    let intersection = join(tokens_a.intersection(&tokens_b));
    let only_a = join(tokens_a.difference(&tokens_b));
    let only_b = join(tokens_b.difference(&tokens_a));

    let combined_a = format!("{} {}", intersection, only_a).trim().to_string();
    let combined_b = format!("{} {}", intersection, only_b).trim().to_string();

    scorer(&intersection, &combined_a)
        .max(scorer(&intersection, &combined_b))
        .max(scorer(&combined_a, &combined_b))
}

fn join<'a, 'b: 'a>(tokens: impl Iterator<Item = &'a &'b str>) -> String {
    tokens.copied().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(a: &str, b: &str) -> u8 {
        to_score(raw_ratio(a, b))
    }

    fn partial_ratio(a: &str, b: &str) -> u8 {
        to_score(raw_partial_ratio(a, b))
    }

    fn token_sort_ratio(a: &str, b: &str) -> u8 {
        to_score(raw_token_sort(a, b, raw_ratio))
    }

    fn token_set_ratio(a: &str, b: &str) -> u8 {
        to_score(raw_token_set(a, b, raw_ratio))
    }

    #[test]
    fn process_lowercases_and_drops_symbols() {
        assert_eq!(full_process("  Côte d'Ivoire! "), "cte d ivoire");
        assert_eq!(full_process("Korea, Republic of"), "korea  republic of");
        assert_eq!(full_process("!!!"), "");
    }

    #[test]
    fn plain_ratio() {
        assert_eq!(ratio("abc", "abc"), 100);
        assert_eq!(ratio("abcd", "abce"), 75);
        assert_eq!(ratio("", "abc"), 0);
        assert_eq!(ratio("abc", "xyz"), 0);
    }

    #[test]
    fn partial_ratio_finds_best_window() {
        assert_eq!(partial_ratio("yankees", "new york yankees"), 100);
        assert_eq!(partial_ratio("new york yankees", "yankees"), 100);
    }

    #[test]
    fn token_measures_ignore_word_order() {
        assert_eq!(token_sort_ratio("new york mets", "mets new york"), 100);
        assert_eq!(token_set_ratio("korea republic of", "republic of korea south"), 100);
    }

    #[test]
    fn weighted_ratio_handles_stripped_punctuation() {
        assert_eq!(weighted_ratio("Cte dIvoire", "Côte d'Ivoire"), 96);
    }

    #[test]
    fn weighted_ratio_of_unrelated_names_is_low() {
        assert_eq!(weighted_ratio("zzqx", "Iraq"), 25);
        assert_eq!(weighted_ratio("", "Iraq"), 0);
    }

    #[test]
    fn weighted_ratio_uses_partial_measures_for_short_queries() {
        // "ab" vs "abc": base 80, partial window 100 scaled by 0.9
        assert_eq!(weighted_ratio("Ab", "Abc"), 90);
    }
}
