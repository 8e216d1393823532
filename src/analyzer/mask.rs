//! Masking helper for sensitive values.

use rand::Rng;
use rand::distr::Alphanumeric;

/// Produce a random alphanumeric string with the same character count as `value`.
pub fn mask_string(value: &str) -> String {
    let len = value.chars().count();
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_preserves_length() {
        let masked = mask_string("kube-system");
        assert_eq!(masked.len(), "kube-system".len());
        assert!(masked.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_mask_empty() {
        assert!(mask_string("").is_empty());
    }
}
