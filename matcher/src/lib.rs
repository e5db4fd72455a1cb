//! Subsequence fuzzy matching tuned for path-like candidates.
//!
//! The scoring here is deliberately simple and fully specified so that
//! result ordering stays predictable across releases: every finder surface
//! in the editor ranks with the same function.

/// Scanning stops once this many matches have been accumulated, bounding
/// the cost of ranking very large collections.
const MATCH_SCAN_CUTOFF: usize = 500;

const CONSECUTIVE_BONUS: f64 = 10.0;
const SEGMENT_START_BONUS: f64 = 15.0;
const FILENAME_BONUS: f64 = 5.0;
const LENGTH_PENALTY: f64 = 0.1;

/// Score `candidate` against `pattern`.
///
/// Returns `None` unless every character of `pattern` appears in
/// `candidate` in order (case-insensitive). An empty pattern matches
/// everything with a score of zero. Higher scores are better matches:
/// consecutive characters earn an escalating run bonus, matches at the
/// start of a `/`-, `_`- or `-`-delimited segment earn a flat bonus, and
/// matches inside the final path segment earn a smaller flat bonus. A
/// length penalty biases toward shorter candidates, so a net-negative
/// score is possible for long candidates with scattered matches.
pub fn score(candidate: &str, pattern: &str) -> Option<f64> {
    if pattern.is_empty() {
        return Some(0.0);
    }

    let candidate_chars: Vec<char> = candidate.chars().collect();
    let pattern_lower: Vec<char> = pattern
        .chars()
        .flat_map(char::to_lowercase)
        .collect();

    let last_slash = candidate_chars.iter().rposition(|&c| c == '/');

    let mut total = 0.0;
    let mut pattern_idx = 0;
    let mut prev_match: Option<usize> = None;
    let mut run = 0u32;

    for (idx, &c) in candidate_chars.iter().enumerate() {
        if pattern_idx >= pattern_lower.len() {
            break;
        }
        let matched = c
            .to_lowercase()
            .eq(std::iter::once(pattern_lower[pattern_idx]));
        if !matched {
            continue;
        }

        total += 1.0;

        if prev_match == Some(idx.wrapping_sub(1)) && idx > 0 {
            run += 1;
            total += f64::from(run) * CONSECUTIVE_BONUS;
        } else {
            run = 0;
        }

        let at_segment_start = idx == 0
            || matches!(candidate_chars.get(idx - 1), Some('/' | '_' | '-'));
        if at_segment_start {
            total += SEGMENT_START_BONUS;
        }

        if last_slash.is_none_or(|slash| idx > slash) {
            total += FILENAME_BONUS;
        }

        prev_match = Some(idx);
        pattern_idx += 1;
    }

    if pattern_idx < pattern_lower.len() {
        return None;
    }

    Some(total - LENGTH_PENALTY * candidate_chars.len() as f64)
}

/// Rank `labels` against `query`, returning indices into `labels`.
///
/// An empty or whitespace-only query returns the first
/// `min(max_results, labels.len())` indices in original order without
/// scoring. Otherwise only labels with a strictly positive score are kept,
/// sorted by score descending; equal scores order by ascending original
/// index so ranking is deterministic. Scanning stops once 500 matches have
/// been found.
pub fn rank<S: AsRef<str>>(labels: &[S], query: &str, max_results: usize) -> Vec<usize> {
    let query = query.trim();
    if query.is_empty() {
        return (0..labels.len().min(max_results)).collect();
    }

    let mut matches: Vec<(usize, f64)> = Vec::new();
    for (idx, label) in labels.iter().enumerate() {
        if let Some(s) = score(label.as_ref(), query)
            && s > 0.0
        {
            matches.push((idx, s));
            if matches.len() >= MATCH_SCAN_CUTOFF {
                break;
            }
        }
    }

    matches.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    matches.truncate(max_results);
    matches.into_iter().map(|(idx, _)| idx).collect()
}
