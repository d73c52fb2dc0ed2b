use crate::error::AppError;

/// Country code every canonical identity is stored under.
pub const COUNTRY_PREFIX: &str = "+263";

/// Canonicalizes raw phone input to the stored identity format.
///
/// Strips everything that is not a digit, drops an existing `263` country
/// prefix and a single trunk `0`, and requires 8 or 9 remaining digits.
/// Idempotent on its own output: `normalize("+263771234567")` yields
/// `+263771234567` again.
pub fn normalize(raw: &str) -> Result<String, AppError> {
    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.starts_with("263") && digits.len() > 9 {
        digits.drain(..3);
    }
    if digits.starts_with('0') && digits.len() > 8 {
        digits.remove(0);
    }

    if digits.len() < 8 || digits.len() > 9 {
        return Err(AppError::InvalidPhone);
    }

    Ok(format!("{COUNTRY_PREFIX}{digits}"))
}

/// Strips the country prefix for display in response bodies. Display only,
/// never a lookup key.
pub fn display(canonical: &str) -> String {
    canonical
        .strip_prefix(COUNTRY_PREFIX)
        .unwrap_or(canonical)
        .to_string()
}

/// Checks that a phone is already in full canonical form: `+263` followed
/// by exactly nine digits. Used by send-otp, which takes no raw input.
pub fn is_canonical(phone: &str) -> bool {
    match phone.strip_prefix(COUNTRY_PREFIX) {
        Some(rest) => rest.len() == 9 && rest.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_local_numbers() {
        assert_eq!(normalize("0771234567").unwrap(), "+263771234567");
        assert_eq!(normalize("771234567").unwrap(), "+263771234567");
        assert_eq!(normalize("077 123 4567").unwrap(), "+263771234567");
        assert_eq!(normalize("(077) 123-4567").unwrap(), "+263771234567");
    }

    #[test]
    fn accepts_eight_digit_numbers() {
        assert_eq!(normalize("24123456").unwrap(), "+26324123456");
    }

    #[test]
    fn idempotent_on_canonical_form() {
        let canonical = normalize("0771234567").unwrap();
        assert_eq!(normalize(&canonical).unwrap(), canonical);
    }

    #[test]
    fn rejects_out_of_range_lengths() {
        assert!(normalize("1234567").is_err());
        assert!(normalize("01234567890").is_err());
        assert!(normalize("").is_err());
        assert!(normalize("abc").is_err());
    }

    #[test]
    fn display_strips_prefix_only() {
        assert_eq!(display("+263771234567"), "771234567");
        assert_eq!(display("771234567"), "771234567");
    }

    #[test]
    fn canonical_check_requires_full_form() {
        assert!(is_canonical("+263771234567"));
        assert!(!is_canonical("+26377123456"));
        assert!(!is_canonical("771234567"));
        assert!(!is_canonical("+26377123456a"));
    }
}
