//! Search filters and the parameter sets they turn into

use super::params::{Endpoint, QueryParams};
use crate::error::{Result, TourError};

/// Category value that routes a search to the festival/event operation
pub const FESTIVAL_CATEGORY: &str = "C01";

/// Rows per page used by list searches
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// List sort order: by modification time
pub const DEFAULT_ARRANGE: &str = "C";

/// Client identification the festival search always sends, in place of
/// the configured `MobileOS` / `MobileApp`
pub const FESTIVAL_MOBILE_OS: &str = "ETC";
pub const FESTIVAL_MOBILE_APP: &str = "TourismApp";

/// Filters as entered in a search form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilters {
    /// Free-text keyword; blank means "no keyword"
    pub keyword: String,
    pub area_code: Option<String>,
    /// `cat1` category code
    pub category: Option<String>,
    /// `YYYY-MM-DD` or `YYYYMMDD`
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl SearchFilters {
    pub fn is_festival(&self) -> bool {
        self.category.as_deref() == Some(FESTIVAL_CATEGORY)
    }
}

/// Paging for list operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page_no: u32,
    pub num_of_rows: u32,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            page_no: 1,
            num_of_rows: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Paging {
    pub fn page(page_no: u32) -> Self {
        Self {
            page_no: page_no.max(1),
            ..Self::default()
        }
    }
}

/// Parameters accepted by the festival/event search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FestivalParams {
    pub area_code: Option<String>,
    pub paging: Paging,
    /// Required; `YYYY-MM-DD` or `YYYYMMDD`
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl FestivalParams {
    /// Narrow general filters down to what the festival search accepts.
    ///
    /// Keyword and category are dropped.
    pub fn from_filters(filters: &SearchFilters, paging: Paging) -> Self {
        Self {
            area_code: filters.area_code.clone(),
            paging,
            start_date: filters.start_date.clone(),
            end_date: filters.end_date.clone(),
        }
    }

    pub fn to_query(&self) -> Result<QueryParams> {
        let start = self
            .start_date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| {
                TourError::Validation("Festival search requires a start date".to_string())
            })?;

        let end = self
            .end_date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(compact_date)
            .transpose()?;

        Ok(QueryParams::new()
            .with("pageNo", self.paging.page_no)
            .with("numOfRows", self.paging.num_of_rows)
            .with("MobileOS", FESTIVAL_MOBILE_OS)
            .with("MobileApp", FESTIVAL_MOBILE_APP)
            .with_opt("areaCode", self.area_code.as_deref())
            .with("eventStartDate", compact_date(start)?)
            .with_opt("eventEndDate", end))
    }
}

/// Convert `YYYY-MM-DD` to the upstream's `YYYYMMDD`; `YYYYMMDD` passes through
pub fn compact_date(date: &str) -> Result<String> {
    let trimmed = date.trim();
    let dashed = trimmed.len() == 10
        && trimmed.as_bytes()[4] == b'-'
        && trimmed.as_bytes()[7] == b'-';
    let compact: String = if dashed {
        trimmed.chars().filter(|c| *c != '-').collect()
    } else {
        trimmed.to_string()
    };

    if compact.len() == 8 && compact.bytes().all(|b| b.is_ascii_digit()) {
        Ok(compact)
    } else {
        Err(TourError::Validation(format!(
            "Invalid date '{}': expected YYYY-MM-DD",
            date
        )))
    }
}

/// Pick the operation and parameters for a filtered search.
///
/// Festival category → festival search; non-blank keyword → keyword
/// search; otherwise the area-based list.
pub fn plan_search(filters: &SearchFilters, paging: Paging) -> Result<(Endpoint, QueryParams)> {
    if filters.is_festival() {
        let params = FestivalParams::from_filters(filters, paging).to_query()?;
        return Ok((Endpoint::SearchFestival, params));
    }

    let mut params = QueryParams::new()
        .with("pageNo", paging.page_no)
        .with("numOfRows", paging.num_of_rows)
        .with("arrange", DEFAULT_ARRANGE)
        .with_opt("areaCode", filters.area_code.as_deref())
        .with_opt("cat1", filters.category.as_deref());

    let keyword = filters.keyword.trim();
    if keyword.is_empty() {
        Ok((Endpoint::AreaBasedList, params))
    } else {
        params.insert("keyword", keyword);
        Ok((Endpoint::SearchKeyword, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_date() {
        assert_eq!(compact_date("2024-05-01").unwrap(), "20240501");
        assert_eq!(compact_date("20240503").unwrap(), "20240503");
        assert!(compact_date("05/01/2024").is_err());
        assert!(compact_date("2024-5-1").is_err());
    }

    #[test]
    fn test_festival_narrowing_drops_keyword() {
        let filters = SearchFilters {
            keyword: "ignored".to_string(),
            area_code: Some("1".to_string()),
            category: Some(FESTIVAL_CATEGORY.to_string()),
            start_date: Some("2024-05-01".to_string()),
            end_date: Some("2024-05-03".to_string()),
        };

        let (endpoint, params) = plan_search(&filters, Paging::default()).unwrap();
        assert_eq!(endpoint, Endpoint::SearchFestival);
        assert_eq!(params.get_str("eventStartDate"), Some("20240501"));
        assert_eq!(params.get_str("eventEndDate"), Some("20240503"));
        assert_eq!(params.get_str("areaCode"), Some("1"));
        assert!(!params.contains_key("keyword"));
        assert!(!params.contains_key("cat1"));
        assert!(!params.contains_key("arrange"));
    }

    #[test]
    fn test_festival_without_end_date() {
        let params = FestivalParams {
            start_date: Some("2024-05-01".to_string()),
            ..FestivalParams::default()
        }
        .to_query()
        .unwrap();

        assert!(!params.contains_key("eventEndDate"));
        assert_eq!(params.get_str("numOfRows"), Some("12"));
        assert_eq!(params.get_str("MobileOS"), Some(FESTIVAL_MOBILE_OS));
        assert_eq!(params.get_str("MobileApp"), Some(FESTIVAL_MOBILE_APP));
    }

    #[test]
    fn test_festival_requires_start_date() {
        let err = FestivalParams::default().to_query().unwrap_err();
        assert!(matches!(err, TourError::Validation(_)));
    }

    #[test]
    fn test_keyword_search_plan() {
        let filters = SearchFilters {
            keyword: "  palace ".to_string(),
            category: Some("A02".to_string()),
            ..SearchFilters::default()
        };
        let (endpoint, params) = plan_search(&filters, Paging::page(2)).unwrap();
        assert_eq!(endpoint, Endpoint::SearchKeyword);
        assert_eq!(params.get_str("keyword"), Some("palace"));
        assert_eq!(params.get_str("cat1"), Some("A02"));
        assert_eq!(params.get_str("pageNo"), Some("2"));
        assert_eq!(params.get_str("arrange"), Some("C"));
    }

    #[test]
    fn test_area_list_plan() {
        let filters = SearchFilters {
            area_code: Some("39".to_string()),
            ..SearchFilters::default()
        };
        let (endpoint, params) = plan_search(&filters, Paging::page(0)).unwrap();
        assert_eq!(endpoint, Endpoint::AreaBasedList);
        assert_eq!(params.get_str("areaCode"), Some("39"));
        assert_eq!(params.get_str("pageNo"), Some("1"));
        assert!(!params.contains_key("keyword"));
    }
}
