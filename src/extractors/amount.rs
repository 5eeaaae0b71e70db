// src/extractors/amount.rs
//! Amount normalization.
//!
//! Raw substrings come straight from the `monetary_amount` recognizer and are
//! turned into signed values in the document's native unit, scaled by any
//! scale word. Nothing here converts currency or unit.

const SCALE_WORDS: [(&str, f64); 3] = [("billion", 1e9), ("million", 1e6), ("thousand", 1e3)];

/// Normalizes a raw amount such as `"+21"`, `"(1,500-)"` or `"$2.5 million"`.
///
/// The value is negative whenever a literal `-` appears anywhere in the input,
/// since the source forms mark decreases with leading or trailing minus signs.
/// Returns `None` for anything that does not reduce to a finite number.
pub fn normalize_amount(raw: &str) -> Option<f64> {
    let lowered = raw.to_ascii_lowercase();
    let multiplier = SCALE_WORDS
        .iter()
        .find(|(word, _)| lowered.contains(word))
        .map(|(_, scale)| *scale)
        .unwrap_or(1.0);

    let numeric: String = strip_scale(&lowered)
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if numeric.is_empty() || !numeric.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let magnitude: f64 = numeric.parse().ok()?;
    let value = magnitude * multiplier;
    if !value.is_finite() {
        tracing::trace!("Amount {:?} overflowed", raw);
        return None;
    }
    Some(if raw.contains('-') { -value } else { value })
}

/// Removes scale words, leaving sign, digits and separators untouched.
pub fn strip_scale(raw: &str) -> String {
    let mut out = raw.to_string();
    for (word, _) in SCALE_WORDS.iter() {
        loop {
            let lowered = out.to_ascii_lowercase();
            let Some(pos) = lowered.find(word) else { break };
            out.replace_range(pos..pos + word.len(), "");
        }
    }
    out.trim().to_string()
}
