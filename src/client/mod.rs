//! TourAPI client
//!
//! Talks to the edge proxy rather than the upstream directly, so the
//! upstream credential never has to live on the calling side. Responses
//! are validated once, cached in-process, and returned as typed envelopes.
//! Failures come back as [`ApiError`], which carries a message that is safe
//! to show to a user and keeps the underlying [`TourError`] as its source.

mod envelope;
mod locale;
mod params;
mod search;

pub use envelope::{Envelope, Items, ResponseBody, ResponseEnvelope, ResponseHeader, SUCCESS_CODE};
pub use locale::Locale;
pub use params::{Endpoint, ParamValue, QueryParams};
pub use search::{
    compact_date, plan_search, FestivalParams, Paging, SearchFilters, DEFAULT_PAGE_SIZE,
    FESTIVAL_CATEGORY, FESTIVAL_MOBILE_APP, FESTIVAL_MOBILE_OS,
};

use crate::cache::{create_cache, Cache, CacheResult};
use crate::config::ClientConfig;
use crate::error::{Result, TourError};
use crate::fetch::ResilientFetcher;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default search radius for location-based lists, in meters
pub const DEFAULT_RADIUS_M: u32 = 1000;

/// Error returned to callers of [`ApiClient`]
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    /// Human-readable, localized where possible
    pub message: String,

    /// Request URL, when one had been built
    pub url: Option<String>,

    #[source]
    pub cause: TourError,
}

impl ApiError {
    /// Derive the display message for `cause`
    pub fn new(locale: Locale, url: Option<String>, cause: TourError) -> Self {
        let message = match &cause {
            TourError::Timeout(_) => locale.timeout_message().to_string(),
            TourError::Upstream { message, .. } if !message.trim().is_empty() => message.clone(),
            TourError::Validation(message)
            | TourError::Format(message)
            | TourError::Config(message) => message.clone(),
            _ => locale.failure_message().to_string(),
        };
        Self {
            message,
            url,
            cause,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.cause, TourError::Timeout(_))
    }

    /// Machine-readable code of the underlying error
    pub fn code(&self) -> &'static str {
        self.cause.code()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Client for the proxied TourAPI
pub struct ApiClient {
    config: ClientConfig,
    cache: Arc<dyn Cache>,
    fetcher: ResilientFetcher,
}

impl ApiClient {
    /// Client with its own cache and a `reqwest` transport
    pub fn new(config: ClientConfig) -> Result<Self> {
        let fetcher = ResilientFetcher::with_reqwest(config.retry_policy())?;
        let cache = create_cache(config.cache.clone());
        Ok(Self::with_parts(config, cache, fetcher))
    }

    /// Client over an injected cache and fetcher
    pub fn with_parts(config: ClientConfig, cache: Arc<dyn Cache>, fetcher: ResilientFetcher) -> Self {
        Self {
            config,
            cache,
            fetcher,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    fn default_params(&self) -> QueryParams {
        QueryParams::new()
            .with("MobileOS", &self.config.mobile_os)
            .with("MobileApp", &self.config.mobile_app)
            .with("_type", "json")
    }

    /// The request URL, which doubles as the cache key.
    ///
    /// Defaults are merged under `params`; keys are sorted.
    pub fn request_url(&self, locale: Locale, endpoint: Endpoint, params: &QueryParams) -> String {
        let query = params.over_defaults(&self.default_params()).to_query_string();
        format!(
            "{}/{}/{}?{}",
            self.config.proxy_url.trim_end_matches('/'),
            locale.service_name(),
            endpoint.path(),
            query
        )
    }

    /// Call an upstream operation through the proxy
    pub async fn call(
        &self,
        locale: Locale,
        endpoint: Endpoint,
        params: &QueryParams,
    ) -> ApiResult<ResponseEnvelope> {
        let url = self.request_url(locale, endpoint, params);
        self.fetch_envelope(&url)
            .await
            .map_err(|cause| {
                warn!("{} {} failed: {}", locale, endpoint, cause);
                ApiError::new(locale, Some(url.clone()), cause)
            })
    }

    /// Like [`ApiClient::call`], with the locale given as a code.
    ///
    /// An unknown code fails before any network activity.
    pub async fn call_with_code(
        &self,
        locale: &str,
        endpoint: Endpoint,
        params: &QueryParams,
    ) -> ApiResult<ResponseEnvelope> {
        let parsed = locale
            .parse::<Locale>()
            .map_err(|cause| ApiError::new(Locale::Ko, None, cause))?;
        self.call(parsed, endpoint, params).await
    }

    async fn fetch_envelope(&self, url: &str) -> Result<ResponseEnvelope> {
        if let CacheResult::Hit(value) = self.cache.get(url) {
            debug!("Client cache hit: {}", url);
            return Envelope::decode(&value).into_result();
        }

        let response = self.fetcher.fetch(url).await?;
        if !response.is_success() {
            return Err(TourError::http_status(
                response.status,
                format!(
                    "API request failed with status {}: {}",
                    response.status, response.body
                ),
            ));
        }

        let value: Value = serde_json::from_str(&response.body)
            .map_err(|e| TourError::Format(format!("Response is not valid JSON: {}", e)))?;
        let envelope = Envelope::decode(&value).into_result()?;

        self.cache.put(url, value);
        Ok(envelope)
    }

    /// Area-based list (`areaBasedList2`)
    pub async fn search_by_area(&self, locale: Locale, params: &QueryParams) -> ApiResult<ResponseEnvelope> {
        self.call(locale, Endpoint::AreaBasedList, params).await
    }

    /// Keyword search (`searchKeyword2`); `keyword` overrides any keyword in `params`
    pub async fn search_by_keyword(
        &self,
        locale: Locale,
        keyword: &str,
        params: &QueryParams,
    ) -> ApiResult<ResponseEnvelope> {
        let params = params.clone().with("keyword", keyword);
        self.call(locale, Endpoint::SearchKeyword, &params).await
    }

    /// Festival/event search (`searchFestival2`)
    pub async fn search_festival(&self, locale: Locale, params: &FestivalParams) -> ApiResult<ResponseEnvelope> {
        let query = params
            .to_query()
            .map_err(|cause| ApiError::new(locale, None, cause))?;
        self.call(locale, Endpoint::SearchFestival, &query).await
    }

    /// Run a filtered search, routing festival categories to the festival operation
    pub async fn search(
        &self,
        locale: Locale,
        filters: &SearchFilters,
        paging: Paging,
    ) -> ApiResult<ResponseEnvelope> {
        let (endpoint, params) =
            plan_search(filters, paging).map_err(|cause| ApiError::new(locale, None, cause))?;
        self.call(locale, endpoint, &params).await
    }

    /// Accommodation search (`searchStay2`)
    pub async fn search_stay(&self, locale: Locale, params: &QueryParams) -> ApiResult<ResponseEnvelope> {
        self.call(locale, Endpoint::SearchStay, params).await
    }

    /// Common details (`detailCommon2`)
    pub async fn get_detail_common(
        &self,
        locale: Locale,
        content_id: &str,
        content_type_id: Option<&str>,
    ) -> ApiResult<ResponseEnvelope> {
        let params = QueryParams::new()
            .with("contentId", content_id)
            .with_opt("contentTypeId", content_type_id);
        self.call(locale, Endpoint::DetailCommon, &params).await
    }

    /// Introduction details (`detailIntro2`)
    pub async fn get_detail_intro(
        &self,
        locale: Locale,
        content_id: &str,
        content_type_id: &str,
    ) -> ApiResult<ResponseEnvelope> {
        let params = QueryParams::new()
            .with("contentId", content_id)
            .with("contentTypeId", content_type_id);
        self.call(locale, Endpoint::DetailIntro, &params).await
    }

    /// Repeating details (`detailInfo2`)
    pub async fn get_detail_info(
        &self,
        locale: Locale,
        content_id: &str,
        content_type_id: &str,
    ) -> ApiResult<ResponseEnvelope> {
        let params = QueryParams::new()
            .with("contentId", content_id)
            .with("contentTypeId", content_type_id);
        self.call(locale, Endpoint::DetailInfo, &params).await
    }

    /// Images (`detailImage2`), sub-images included
    pub async fn get_detail_image(&self, locale: Locale, content_id: &str) -> ApiResult<ResponseEnvelope> {
        let params = QueryParams::new()
            .with("contentId", content_id)
            .with("imageYN", "Y")
            .with("subImageYN", "Y")
            .with("numOfRows", 20);
        self.call(locale, Endpoint::DetailImage, &params).await
    }

    /// Area codes (`areaCode2`); sub-areas when `area_code` is given
    pub async fn get_area_code(&self, locale: Locale, area_code: Option<&str>) -> ApiResult<ResponseEnvelope> {
        let params = QueryParams::new()
            .with_opt("areaCode", area_code)
            .with("numOfRows", 20);
        self.call(locale, Endpoint::AreaCode, &params).await
    }

    /// Service category codes (`categoryCode2`)
    pub async fn get_category_code(
        &self,
        locale: Locale,
        content_type_id: Option<&str>,
        cat1: Option<&str>,
        cat2: Option<&str>,
    ) -> ApiResult<ResponseEnvelope> {
        let params = QueryParams::new()
            .with_opt("contentTypeId", content_type_id)
            .with_opt("cat1", cat1)
            .with_opt("cat2", cat2)
            .with("numOfRows", 20);
        self.call(locale, Endpoint::CategoryCode, &params).await
    }

    /// Location-based list (`locationBasedList2`)
    pub async fn get_location_based_list(
        &self,
        locale: Locale,
        map_x: &str,
        map_y: &str,
        radius_m: Option<u32>,
        params: &QueryParams,
    ) -> ApiResult<ResponseEnvelope> {
        let params = params
            .clone()
            .with("mapX", map_x)
            .with("mapY", map_y)
            .with("radius", radius_m.unwrap_or(DEFAULT_RADIUS_M));
        self.call(locale, Endpoint::LocationBasedList, &params).await
    }
}
