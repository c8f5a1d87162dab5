// 🔍 Fuzzy City Matcher - Reconcile free-text city names against the gazetteer
// Exact match first, then a composite weighted ratio over strsim primitives

use log::{debug, warn};

/// Minimum similarity score (0-100 scale) for a fuzzy match.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 85.0;

// ============================================================================
// SCORING
// ============================================================================

fn ratio(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b) * 100.0
}

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Best alignment of the shorter string against a same-length window of
/// the longer one. Catches "SALVADOR BA" vs "SALVADOR" style near-misses.
fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };

    let short_len = short.chars().count();
    if short_len == 0 {
        return 0.0;
    }

    let long_chars: Vec<char> = long.chars().collect();
    if short_len == long_chars.len() {
        return ratio(short, long);
    }

    let mut best = 0.0f64;
    for start in 0..=(long_chars.len() - short_len) {
        let window: String = long_chars[start..start + short_len].iter().collect();
        let score = ratio(short, &window);
        if score > best {
            best = score;
        }
    }

    best
}

/// Composite similarity score on a 0-100 scale.
///
/// Takes the best of the full ratio, the token-sort ratio (word-order
/// tolerant, scaled 0.95) and the partial-window ratio (substring
/// tolerant, scaled 0.9). The scaling keeps full-string agreement ahead
/// of partial overlaps at equal raw similarity.
pub fn weighted_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let full = ratio(a, b);
    let token_sort = ratio(&sort_tokens(a), &sort_tokens(b)) * 0.95;
    let partial = partial_ratio(a, b) * 0.9;

    full.max(token_sort).max(partial)
}

// ============================================================================
// FUZZY MATCHER
// ============================================================================

pub struct FuzzyMatcher {
    /// Minimum score (0-100) for an approximate match to be accepted
    pub threshold: f64,
}

impl FuzzyMatcher {
    pub fn new() -> Self {
        FuzzyMatcher {
            threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }

    pub fn with_threshold(threshold: f64) -> Self {
        FuzzyMatcher { threshold }
    }

    /// Find the best candidate for a query name, or None.
    ///
    /// An exact hit returns immediately and is never overridden by a
    /// near-miss. Otherwise every candidate is scored and the single
    /// highest-scoring one wins if it clears the threshold. Candidates
    /// are scanned in slice order and only a strictly greater score
    /// displaces the current best, so ties resolve to the earliest
    /// candidate and results are deterministic for identical inputs.
    pub fn best_match<'a>(&self, query: &str, candidates: &'a [String]) -> Option<&'a str> {
        if query.is_empty() || candidates.is_empty() {
            return None;
        }

        if let Some(exact) = candidates.iter().find(|c| c.as_str() == query) {
            return Some(exact);
        }

        let mut best: Option<(&str, f64)> = None;

        for candidate in candidates {
            let score = weighted_ratio(query, candidate);

            if !score.is_finite() {
                warn!("non-finite score for '{}' vs '{}'", query, candidate);
                continue;
            }

            if best.map_or(true, |(_, s)| score > s) {
                best = Some((candidate, score));
            }
        }

        match best {
            Some((candidate, score)) if score >= self.threshold => Some(candidate),
            Some((candidate, score)) => {
                debug!(
                    "no match for '{}': best candidate '{}' scored {:.1} < {:.1}",
                    query, candidate, score, self.threshold
                );
                None
            }
            None => None,
        }
    }
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================
