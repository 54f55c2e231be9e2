//! Input validation functions
//!
//! Hand-written checks for inputs that do not arrive as a derived
//! `validator::Validate` struct: multipart form fields and query strings.

/// Reject empty text fields
pub fn validate_required(field: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{}: Expected string length greater or equal to 1", field));
    }
    Ok(())
}

/// Parse a form-encoded boolean. Only the literals `true` and `false` are accepted.
pub fn parse_availability(value: &str) -> Result<bool, String> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err("availability: Expected string to match '^(true|false)$'".to_string()),
    }
}

/// Parse a query parameter made only of decimal digits
pub fn parse_digits(field: &str, value: &str) -> Result<u64, String> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("{}: Expected string to match '^[0-9]+$'", field));
    }
    // All digits; only overflow can fail here
    value
        .parse::<u64>()
        .map_err(|_| format!("{}: Number too large", field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn test_validate_required() {
        assert!(validate_required("title", "Spec").is_ok());
        assert_eq!(
            validate_required("title", "").unwrap_err(),
            "title: Expected string length greater or equal to 1"
        );
    }

    #[rstest]
    #[case("true", Ok(true))]
    #[case("false", Ok(false))]
    #[case("TRUE", Err(()))]
    #[case("1", Err(()))]
    #[case("", Err(()))]
    fn test_parse_availability(#[case] input: &str, #[case] expected: Result<bool, ()>) {
        assert_eq!(parse_availability(input).map_err(|_| ()), expected);
    }

    #[rstest]
    #[case("1", Some(1))]
    #[case("0", Some(0))]
    #[case("0042", Some(42))]
    #[case("-1", None)]
    #[case("1.5", None)]
    #[case("abc", None)]
    #[case("", None)]
    #[case("99999999999999999999999", None)]
    fn test_parse_digits(#[case] input: &str, #[case] expected: Option<u64>) {
        assert_eq!(parse_digits("page", input).ok(), expected);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_parse_digits_accepts_any_u32(n in any::<u32>()) {
            prop_assert_eq!(parse_digits("limit", &n.to_string()), Ok(n as u64));
        }

        #[test]
        fn prop_parse_digits_rejects_non_digits(s in "[0-9]*[a-zA-Z .-][0-9a-zA-Z]*") {
            prop_assert!(parse_digits("limit", &s).is_err());
        }
    }
}
