//! Upstream operations and query parameters

use crate::error::TourError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Upstream operation identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    AreaBasedList,
    SearchKeyword,
    SearchFestival,
    SearchStay,
    DetailCommon,
    DetailIntro,
    DetailInfo,
    DetailImage,
    AreaCode,
    CategoryCode,
    LocationBasedList,
}

impl Endpoint {
    pub const ALL: [Endpoint; 11] = [
        Endpoint::AreaBasedList,
        Endpoint::SearchKeyword,
        Endpoint::SearchFestival,
        Endpoint::SearchStay,
        Endpoint::DetailCommon,
        Endpoint::DetailIntro,
        Endpoint::DetailInfo,
        Endpoint::DetailImage,
        Endpoint::AreaCode,
        Endpoint::CategoryCode,
        Endpoint::LocationBasedList,
    ];

    /// Path segment under the service namespace
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::AreaBasedList => "areaBasedList2",
            Endpoint::SearchKeyword => "searchKeyword2",
            Endpoint::SearchFestival => "searchFestival2",
            Endpoint::SearchStay => "searchStay2",
            Endpoint::DetailCommon => "detailCommon2",
            Endpoint::DetailIntro => "detailIntro2",
            Endpoint::DetailInfo => "detailInfo2",
            Endpoint::DetailImage => "detailImage2",
            Endpoint::AreaCode => "areaCode2",
            Endpoint::CategoryCode => "categoryCode2",
            Endpoint::LocationBasedList => "locationBasedList2",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Endpoint {
    type Err = TourError;

    /// Accepts the path with or without a leading slash
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('/');
        Endpoint::ALL
            .into_iter()
            .find(|endpoint| endpoint.path() == wanted)
            .ok_or_else(|| TourError::Validation(format!("Unknown endpoint: {}", s)))
    }
}

/// A query parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    One(String),
    /// Serialized as the key repeated once per value, in order
    Many(Vec<String>),
}

/// Query parameters keyed in sorted order
///
/// Sorting makes the serialized form independent of insertion order, so
/// the same logical request always yields the same cache key. Absent
/// values are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: BTreeMap<String, ParamValue>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Builder-style insert that skips `None`
    pub fn with_opt<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.insert_opt(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.entries
            .insert(key.into(), ParamValue::One(value.to_string()));
    }

    pub fn insert_opt<V: ToString>(&mut self, key: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    pub fn insert_many<I, V>(&mut self, key: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        let values: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
        if !values.is_empty() {
            self.entries.insert(key.into(), ParamValue::Many(values));
        }
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    /// The single value of `key`, or the first of a list
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.entries.get(key)? {
            ParamValue::One(value) => Some(value),
            ParamValue::Many(values) => values.first().map(String::as_str),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<ParamValue> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `self` layered over `defaults`; keys present in `self` win
    pub fn over_defaults(&self, defaults: &QueryParams) -> QueryParams {
        let mut merged = defaults.clone();
        for (key, value) in &self.entries {
            merged.entries.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Canonical `application/x-www-form-urlencoded` serialization
    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.entries {
            match value {
                ParamValue::One(v) => {
                    serializer.append_pair(key, v);
                }
                ParamValue::Many(values) => {
                    for v in values {
                        serializer.append_pair(key, v);
                    }
                }
            }
        }
        serializer.finish()
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = QueryParams::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}
