// Longest-matching-block similarity (Ratcliff/Obershelp)
use ahash::AHashMap;

/// Targets at least this long get the popular-character heuristic
const POPULARITY_MIN_LEN: usize = 200;

/// Similarity of two character sequences in [0, 1].
///
/// `2 * M / (len(a) + len(b))` where `M` is the number of characters covered by
/// the matching blocks found by repeatedly taking the longest common block
/// and recursing on both sides of it. Two empty sequences are identical.
pub fn sequence_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = BlockMatcher::new(a, b).matched_len();
    2.0 * matched as f64 / total as f64
}

struct BlockMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// char -> ascending positions in `b`, popular chars removed
    b2j: AHashMap<char, Vec<usize>>,
}

impl<'a> BlockMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: AHashMap<char, Vec<usize>> = AHashMap::new();
        for (j, c) in b.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }

        // Very frequent characters in long targets do not seed matches
        if b.len() >= POPULARITY_MIN_LEN {
            let threshold = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= threshold);
        }

        Self { a, b, b2j }
    }

    /// Longest block `a[i..i+k] == b[j..j+k]` inside the given ranges.
    /// Earliest `i` wins, then earliest `j`.
    fn longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
        let (a, b) = (self.a, self.b);
        let mut best_i = alo;
        let mut best_j = blo;
        let mut best_size = 0;

        // j -> length of the match ending at a[i-1], b[j]
        let mut j2len: AHashMap<usize, usize> = AHashMap::new();
        for i in alo..ahi {
            let mut next: AHashMap<usize, usize> = AHashMap::new();
            if let Some(positions) = self.b2j.get(&a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = next;
        }

        // Popular characters never seed a block but may still extend one
        while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && a[best_i + best_size] == b[best_j + best_size]
        {
            best_size += 1;
        }

        (best_i, best_j, best_size)
    }

    /// Total size of all matching blocks
    fn matched_len(&self) -> usize {
        let mut total = 0;
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, k) = self.longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            total += k;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                pending.push((i + k, ahi, j + k, bhi));
            }
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_identical_and_disjoint() {
        assert_eq!(sequence_ratio(&chars("shoe"), &chars("shoe")), 1.0);
        assert_eq!(sequence_ratio(&chars("abc"), &chars("xyz")), 0.0);
        assert_eq!(sequence_ratio(&[], &[]), 1.0);
        assert_eq!(sequence_ratio(&chars("abc"), &[]), 0.0);
    }

    #[test]
    fn test_known_ratios() {
        // "abcd" vs "bcde": one block "bcd"
        let r = sequence_ratio(&chars("abcd"), &chars("bcde"));
        assert!((r - 0.75).abs() < 1e-12);

        // "shoe" vs "green hat": only "h" matches
        let r = sequence_ratio(&chars("shoe"), &chars("green hat"));
        assert!((r - 2.0 / 13.0).abs() < 1e-12);

        // blocks "ab" then "d" on the right side
        let r = sequence_ratio(&chars("abxd"), &chars("abyd"));
        assert!((r - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_popular_characters_do_not_seed() {
        // every char of the long target is popular, so nothing can seed a block
        let target: Vec<char> = "ab".repeat(150).chars().collect();
        assert_eq!(sequence_ratio(&chars("ab"), &target), 0.0);
    }

    #[test]
    fn test_popular_characters_extend_blocks() {
        // 'x' is popular, 'q' is not; the block seeded at 'q' grows over 'x'
        let mut target = "x".repeat(250);
        target.push_str("qx");
        let r = sequence_ratio(&chars("xqx"), &chars(&target));
        let expected = 2.0 * 3.0 / (3.0 + 252.0);
        assert!((r - expected).abs() < 1e-12);
    }
}
