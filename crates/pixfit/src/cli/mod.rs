//! Command implementations and shared argument helpers.

pub mod config;
pub mod plan;
pub mod shrink;

/// Parse a human-friendly size string into bytes.
///
/// Accepts a plain byte count (`123456`) or a number with a decimal unit
/// suffix: `KB`, `MB`, or `GB` (case-insensitive, fractional values allowed,
/// e.g. `1.5MB`).
pub fn parse_size(input: &str) -> anyhow::Result<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        anyhow::bail!("empty size");
    }

    let (number, multiplier) = match trimmed.to_ascii_uppercase() {
        s if s.ends_with("GB") => (trimmed[..trimmed.len() - 2].trim_end(), 1_000_000_000u64),
        s if s.ends_with("MB") => (trimmed[..trimmed.len() - 2].trim_end(), 1_000_000u64),
        s if s.ends_with("KB") => (trimmed[..trimmed.len() - 2].trim_end(), 1_000u64),
        s if s.ends_with('B') => (trimmed[..trimmed.len() - 1].trim_end(), 1u64),
        _ => (trimmed, 1u64),
    };

    let value: f64 = number
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid size: {input}"))?;
    if !value.is_finite() || value < 0.0 {
        anyhow::bail!("invalid size: {input}");
    }

    let bytes = (value * multiplier as f64).round();
    if bytes == 0.0 {
        anyhow::bail!("size must be greater than zero: {input}");
    }
    Ok(bytes as u64)
}
