//! Search filters as received at the HTTP boundary.
//!
//! [`SearchFilters`] keeps the normalized raw values so they can form a
//! canonical cache key; [`SearchFilters::to_artifact_filter`] hands them to
//! the store.

use heritage_store_db::ArtifactFilter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::pagination::PageRequest;

/// Normalized search filters, one optional value per known filter name.
///
/// Fields are declared in alphabetical order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

fn normalize_text(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_lowercase())
}

fn normalize_id(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl SearchFilters {
    /// Collect filters from query-string pairs.
    ///
    /// Unknown keys are ignored. When a key repeats, the last value wins.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filters = SearchFilters::default();
        for (key, value) in pairs {
            let value = value.as_ref();
            let slot = match key.as_ref() {
                "creator" => &mut filters.creator,
                "format" => &mut filters.format,
                "location" => &mut filters.location,
                "material" => &mut filters.material,
                "name" => &mut filters.name,
                "q" => &mut filters.q,
                "tag" => &mut filters.tag,
                "id" => {
                    filters.id = normalize_id(value);
                    continue;
                }
                _ => continue,
            };
            *slot = normalize_text(value);
        }
        filters
    }

    /// Filters for a name lookup.
    pub fn by_name(name: &str) -> Self {
        SearchFilters {
            name: normalize_text(name),
            ..Default::default()
        }
    }

    /// Filters for an id lookup.
    pub fn by_id(id: i64) -> Self {
        SearchFilters {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    /// Present filters in alphabetical key order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("creator", &self.creator),
            ("format", &self.format),
            ("id", &self.id),
            ("location", &self.location),
            ("material", &self.material),
            ("name", &self.name),
            ("q", &self.q),
            ("tag", &self.tag),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.fields().next().is_none()
    }

    /// Compact JSON object with sorted keys.
    pub fn canonical_json(&self) -> String {
        let map: Map<String, Value> = self
            .fields()
            .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
            .collect();
        Value::Object(map).to_string()
    }

    pub fn to_artifact_filter(&self) -> ArtifactFilter {
        let mut filter = ArtifactFilter::default();
        if let Some(id) = &self.id {
            filter = filter.with_raw_id(id);
        }
        if let Some(name) = &self.name {
            filter = filter.with_name(name);
        }
        if let Some(q) = &self.q {
            filter = filter.with_q(q);
        }
        if let Some(creator) = &self.creator {
            filter = filter.with_creator(creator);
        }
        if let Some(format) = &self.format {
            filter = filter.with_format(format);
        }
        if let Some(location) = &self.location {
            filter = filter.with_location(location);
        }
        if let Some(material) = &self.material {
            filter = filter.with_material(material);
        }
        if let Some(tag) = &self.tag {
            filter = filter.with_tag(tag);
        }
        filter
    }
}

/// Which catalog operation a cached page belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOp {
    List,
    ById,
    ByName,
    Search,
}

impl CacheOp {
    pub fn tag(self) -> &'static str {
        match self {
            CacheOp::List => "list",
            CacheOp::ById => "by-id",
            CacheOp::ByName => "by-name",
            CacheOp::Search => "search",
        }
    }
}

/// `heritage:<op>:<canonical filters>:p<page>:s<per_page>`
pub fn cache_key(op: CacheOp, filters: &SearchFilters, request: PageRequest) -> String {
    format!(
        "heritage:{}:{}:p{}:s{}",
        op.tag(),
        filters.canonical_json(),
        request.page(),
        request.per_page()
    )
}
