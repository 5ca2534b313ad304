//! Text encoding for pgvector `vector` literals.

use anyhow::{anyhow, Context, Result};

/// Fractional digits written per component.
pub const PRECISION: usize = 8;

/// Formats an embedding as `[x, y, ...]` with fixed precision so it can be
/// bound as text and cast with `CAST($1 AS vector)`.
pub fn encode(vector: &[f32]) -> String {
    let mut out = String::with_capacity(vector.len() * (PRECISION + 5) + 2);
    out.push('[');
    for (idx, value) in vector.iter().enumerate() {
        if idx > 0 {
            out.push_str(", ");
        }
        // f32 -> f64 widening is exact, so the rounding happens only once.
        out.push_str(&format!("{:.*}", PRECISION, f64::from(*value)));
    }
    out.push(']');
    out
}

/// Parses a literal produced by [`encode`] (or by Postgres itself).
pub fn parse(literal: &str) -> Result<Vec<f64>> {
    let inner = literal
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| anyhow!("vector literal must be wrapped in brackets"))?;
    if inner.trim().is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split(',')
        .enumerate()
        .map(|(idx, part)| {
            part.trim()
                .parse::<f64>()
                .with_context(|| format!("invalid vector component {idx}: {part:?}"))
        })
        .collect()
}
