// src/extractors/mod.rs
pub mod dates;
pub mod emissions;
pub mod energy;
pub mod scopes;
pub mod sourcing;
pub mod utilities;

use crate::utils::error::StructuralError;

/// Bounds-checked access into a section's token stream for extractors that
/// address fixed offsets.
pub(crate) fn token_at<'a>(
    tokens: &'a [String],
    index: usize,
    context: &'static str,
) -> Result<&'a str, StructuralError> {
    tokens
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| StructuralError::Inconsistent {
            context,
            detail: format!("missing token at offset {}", index),
        })
}

/// Lenient numeric parse: surrounding whitespace is ignored, anything else
/// non-numeric is `None`.
pub(crate) fn parse_float(value: &str) -> Option<f64> {
    value.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_float_trims_but_rejects_prose() {
        assert_eq!(parse_float(" 1234.5 "), Some(1234.5));
        assert_eq!(parse_float("2e3"), Some(2000.0));
        assert_eq!(parse_float("Question not applicable"), None);
        assert_eq!(parse_float(""), None);
    }
}
