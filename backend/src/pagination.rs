//! Offset pagination for list endpoints

use crate::error::ApiError;
use docvault_shared::{validation::parse_digits, PaginationMeta};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Normalized page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Clamp raw values: page to at least 1, limit into `1..=100`
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// Parse optional query-string values. Non-digit input is a 400.
    pub fn from_query(page: Option<&str>, limit: Option<&str>) -> Result<Self, ApiError> {
        let parse = |field: &str, raw: Option<&str>, default: u64| match raw {
            None | Some("") => Ok(default),
            Some(value) => parse_digits(field, value)
                .map_err(|msg| ApiError::Validation(format!("Validation failed: {}", msg))),
        };

        Ok(Self::new(
            parse("page", page, DEFAULT_PAGE)?,
            parse("limit", limit, DEFAULT_LIMIT)?,
        ))
    }

    /// Never exceeds `i64::MAX`, so it always fits a SQL BIGINT
    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.limit)
            .min(i64::MAX as u64)
    }

    pub fn meta(&self, total: u64) -> PaginationMeta {
        let total_pages = total.div_ceil(self.limit);
        PaginationMeta {
            total,
            total_pages,
            current_page: self.page,
            per_page: self.limit,
            has_next_page: self.page < total_pages,
            has_prev_page: self.page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, None, 1, 10)]
    #[case(Some("3"), Some("25"), 3, 25)]
    #[case(Some("0"), Some("0"), 1, 1)]
    #[case(Some("2"), Some("1000"), 2, 100)]
    #[case(Some(""), Some(""), 1, 10)]
    fn test_from_query(
        #[case] page: Option<&str>,
        #[case] limit: Option<&str>,
        #[case] expected_page: u64,
        #[case] expected_limit: u64,
    ) {
        let request = PageRequest::from_query(page, limit).unwrap();
        assert_eq!(request, PageRequest::new(expected_page, expected_limit));
    }

    #[rstest]
    #[case(Some("-1"), None)]
    #[case(None, Some("ten"))]
    #[case(Some("1.5"), None)]
    fn test_from_query_rejects_non_digits(#[case] page: Option<&str>, #[case] limit: Option<&str>) {
        let err = PageRequest::from_query(page, limit).unwrap_err();
        assert!(matches!(err, ApiError::Validation(msg) if msg.starts_with("Validation failed: ")));
    }

    #[rstest]
    #[case("1", "10", 0)]
    #[case("3", "25", 50)]
    #[case("1000000000000000000", "100", i64::MAX as u64)]
    #[case("18446744073709551615", "100", i64::MAX as u64)]
    fn test_offset(#[case] page: &str, #[case] limit: &str, #[case] expected: u64) {
        let request = PageRequest::from_query(Some(page), Some(limit)).unwrap();
        assert_eq!(request.offset(), expected);
    }

    #[test]
    fn test_meta() {
        let meta = PageRequest::new(2, 10).meta(25);
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.current_page, 2);
        assert_eq!(meta.per_page, 10);
        assert!(meta.has_next_page);
        assert!(meta.has_prev_page);

        let empty = PageRequest::default().meta(0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next_page);
        assert!(!empty.has_prev_page);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_clamping_keeps_bounds(page in any::<u64>(), limit in any::<u64>()) {
            let request = PageRequest::new(page, limit);
            prop_assert!(request.page >= 1);
            prop_assert!((1..=MAX_LIMIT).contains(&request.limit));
        }

        #[test]
        fn prop_meta_pages_cover_total(page in 1u64..1000, limit in 1u64..=100, total in 0u64..100_000) {
            let meta = PageRequest::new(page, limit).meta(total);
            prop_assert!(meta.total_pages * limit >= total);
            prop_assert!(meta.total_pages == 0 || (meta.total_pages - 1) * limit < total);
            prop_assert_eq!(meta.has_next_page, page < meta.total_pages);
        }
    }
}
