//! Fuzzy brand-name matching.
//!
//! The ratio is the classic sequence-matcher measure `2·M / T`, where `M` is
//! the number of characters in all matching blocks and `T` the combined
//! length of both strings. Matching blocks are found by repeatedly taking the
//! longest common block and recursing on either side of it.

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Case-insensitive similarity in `[0.0, 1.0]`.
///
/// Symmetric in its arguments. Two empty strings are identical (`1.0`).
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    // Block search prefers the earliest block in the first string, so fix the
    // argument order to make the ratio independent of call order.
    let (first, second) = if (a.len(), &a) <= (b.len(), &b) {
        (&a, &b)
    } else {
        (&b, &a)
    };

    let matched = matched_chars(first, second);
    (2 * matched) as f64 / total as f64
}

/// Total length of all matching blocks between `a` and `b`.
fn matched_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            pending.push((i + size, ahi, j + size, bhi));
        }
    }

    matched
}

/// Longest common block of `a[alo..ahi]` and `b[blo..bhi]` as `(i, j, size)`.
///
/// Among equally long blocks, the one starting earliest in `a` wins, then
/// earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let mut best = (alo, blo, 0);
    // cur[j + 1] is the length of the common run ending at (i, j); prev is the row above.
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            cur[j + 1] = if a[i] == b[j] { prev[j] + 1 } else { 0 };
            let size = cur[j + 1];
            if size > best.2 {
                best = (i + 1 - size, j + 1 - size, size);
            }
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    best
}

/// Decides whether a target brand appears in a provider's name list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrandMatcher {
    threshold: f64,
}

impl Default for BrandMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl BrandMatcher {
    /// `threshold` is clamped to `[0.0, 1.0]`.
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// First candidate, in the given order, whose similarity to `target`
    /// reaches the threshold. A blank target never matches.
    #[must_use]
    pub fn first_match<'c>(&self, target: &str, candidates: &'c [String]) -> Option<&'c str> {
        let target = target.trim();
        if target.is_empty() {
            return None;
        }
        candidates
            .iter()
            .map(String::as_str)
            .find(|candidate| similarity(target, candidate) >= self.threshold)
    }

    #[must_use]
    pub fn is_visible(&self, target: &str, candidates: &[String]) -> bool {
        self.first_match(target, candidates).is_some()
    }
}
