use serde::{Deserialize, Serialize};

/// How bare local numbers are turned into international ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberPolicy {
    /// Country calling code without the leading `+`.
    pub default_country_code: String,
    /// Length of a national number that gets the country code prepended.
    pub national_length: usize,
}

impl Default for NumberPolicy {
    fn default() -> Self {
        Self {
            default_country_code: "91".to_string(),
            national_length: 10,
        }
    }
}

/// Normalizes a raw phone number into `+<digits>` form.
///
/// Returns `None` for input that cannot be given a country code.
pub fn normalize(raw: &str, policy: &NumberPolicy) -> Option<String> {
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    let normalized = if compact.starts_with('+') {
        compact
    } else if let Some(rest) = compact.strip_prefix('0') {
        format!("+{}{}", policy.default_country_code, rest)
    } else if compact.len() == policy.national_length {
        format!("+{}{}", policy.default_country_code, compact)
    } else {
        return None;
    };

    let digits = &normalized[1..];
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(normalized)
}

#[cfg(test)]
mod tests {
    use super::{normalize, NumberPolicy};

    #[test]
    fn strips_separators_and_keeps_international_numbers() {
        let policy = NumberPolicy::default();
        assert_eq!(
            normalize("+1 555-123 4567", &policy).as_deref(),
            Some("+15551234567")
        );
    }

    #[test]
    fn prefixes_national_numbers() {
        let policy = NumberPolicy::default();
        assert_eq!(normalize("98765 43210", &policy).as_deref(), Some("+919876543210"));
        assert_eq!(normalize("09876543210", &policy).as_deref(), Some("+919876543210"));
    }

    #[test]
    fn rejects_unrecognizable_input() {
        let policy = NumberPolicy::default();
        assert_eq!(normalize("12345", &policy), None);
        assert_eq!(normalize("+", &policy), None);
        assert_eq!(normalize("+44 abc", &policy), None);
        assert_eq!(normalize("   ", &policy), None);
    }

    #[test]
    fn honors_custom_country_code() {
        let policy = NumberPolicy {
            default_country_code: "44".to_string(),
            national_length: 10,
        };
        assert_eq!(normalize("07700900123", &policy).as_deref(), Some("+447700900123"));
    }
}
