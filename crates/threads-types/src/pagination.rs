//! Page-number pagination shared by every listing endpoint.
//!
//! Pages are 1-indexed and always [`PAGE_SIZE`] items long. A missing or
//! unparsable `page` parameter falls back to the first page instead of
//! failing the request.

use serde::{Deserialize, Serialize};

pub const PAGE_SIZE: u32 = 10;

/// `?page=` query string. Kept as a raw string so that `?page=abc` does not
/// trip the extractor.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> u32 {
        parse_page(self.page.as_deref())
    }
}

pub fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

pub fn total_pages(total: u64) -> u64 {
    total.div_ceil(u64::from(PAGE_SIZE))
}

/// Rows to skip before the given page.
pub fn offset(page: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(PAGE_SIZE)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32) -> Self {
        Self {
            items,
            total,
            page,
            total_pages: total_pages(total),
        }
    }

    pub fn empty(page: u32) -> Self {
        Self::new(Vec::new(), 0, page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_to_one() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("")), 1);
        assert_eq!(parse_page(Some("abc")), 1);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("-4")), 1);
        assert_eq!(parse_page(Some("2.5")), 1);
    }

    #[test]
    fn page_parses_valid_numbers() {
        assert_eq!(parse_page(Some("1")), 1);
        assert_eq!(parse_page(Some(" 7 ")), 7);
        assert_eq!(PageQuery { page: Some("3".into()) }.page(), 3);
        assert_eq!(PageQuery::default().page(), 1);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(10), 1);
        assert_eq!(total_pages(11), 2);
        assert_eq!(total_pages(95), 10);
    }

    #[test]
    fn offset_skips_previous_pages() {
        assert_eq!(offset(1), 0);
        assert_eq!(offset(2), 10);
        assert_eq!(offset(5), 40);
    }

    #[test]
    fn empty_page_serializes_camel_case() {
        let page: Paginated<u8> = Paginated::empty(1);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "items": [], "total": 0, "page": 1, "totalPages": 0 })
        );
    }
}
