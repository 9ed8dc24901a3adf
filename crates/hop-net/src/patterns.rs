use hop_core::errors::{ErrorInfo, HopError};
use rand::Rng;

/// Maps a stored bit onto a spin in `{-1, +1}`.
#[inline]
pub fn spin(bit: bool) -> i64 {
    if bit {
        1
    } else {
        -1
    }
}

/// Parses a pattern written as a string of `0`/`1` characters. Whitespace is ignored.
pub fn parse_pattern(text: &str) -> Result<Vec<bool>, HopError> {
    text.chars()
        .filter(|ch| !ch.is_whitespace())
        .enumerate()
        .map(|(position, ch)| match ch {
            '0' => Ok(false),
            '1' => Ok(true),
            other => Err(HopError::InvalidInput(
                ErrorInfo::new("pattern-token", "patterns may only contain 0 and 1")
                    .with_context("position", position)
                    .with_context("token", other),
            )),
        })
        .collect()
}

/// Renders a pattern in the form accepted by [`parse_pattern`].
pub fn format_pattern(pattern: &[bool]) -> String {
    pattern.iter().map(|&bit| if bit { '1' } else { '0' }).collect()
}

/// Draws a state with every node independently up with probability one half.
pub fn random_state<R: Rng + ?Sized>(nodes: usize, rng: &mut R) -> Vec<bool> {
    (0..nodes).map(|_| rng.gen::<f64>() < 0.5).collect()
}

/// Draws `count` independent random patterns of `nodes` bits.
pub fn random_patterns<R: Rng + ?Sized>(nodes: usize, count: usize, rng: &mut R) -> Vec<Vec<bool>> {
    (0..count).map(|_| random_state(nodes, rng)).collect()
}

/// Copy of `state` with `node` flipped.
pub fn flipped(state: &[bool], node: usize) -> Vec<bool> {
    let mut next = state.to_vec();
    next[node] = !next[node];
    next
}

/// Number of positions at which two equal-length states differ.
pub fn hamming_distance(a: &[bool], b: &[bool]) -> usize {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).filter(|(x, y)| x != y).count()
}

/// Distance from `state` to the nearest stored pattern.
///
/// A state and its global spin inverse have the same energy, so each pattern is matched up to
/// inversion: the distance to a pattern is `min(d, nodes - d)`.
pub fn pattern_distance(state: &[bool], patterns: &[Vec<bool>]) -> usize {
    let nodes = state.len();
    patterns
        .iter()
        .map(|pattern| {
            let distance = hamming_distance(state, pattern);
            distance.min(nodes - distance)
        })
        .min()
        .unwrap_or(0)
}

pub(crate) fn validate_patterns(patterns: &[Vec<bool>]) -> Result<usize, HopError> {
    let Some(first) = patterns.first() else {
        return Err(HopError::InvalidInput(
            ErrorInfo::new("empty-patterns", "at least one pattern is required")
                .with_hint("supply one or more binary patterns of equal length"),
        ));
    };
    let nodes = first.len();
    if let Some((index, pattern)) = patterns
        .iter()
        .enumerate()
        .find(|(_, pattern)| pattern.len() != nodes)
    {
        return Err(HopError::InvalidInput(
            ErrorInfo::new("ragged-patterns", "patterns must all have the same length")
                .with_context("expected", nodes)
                .with_context("pattern", index)
                .with_context("found", pattern.len()),
        ));
    }
    if nodes < 2 {
        return Err(HopError::InvalidInput(
            ErrorInfo::new("degenerate-patterns", "patterns need at least two nodes to interact")
                .with_context("nodes", nodes),
        ));
    }
    Ok(nodes)
}
