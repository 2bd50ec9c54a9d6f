//! Row models for the two tabular sources.
//!
//! Cells are coerced the way Cypher's `toInteger`/`toFloat` coerce `LOAD CSV`
//! strings: blank cells are null, `"120.0"` is the integer 120. Only the
//! merge keys are required; free-text attributes are kept verbatim.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// One row of the articles source.
///
/// Each row describes an article together with its reporter and category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    #[serde(deserialize_with = "required_integer")]
    pub article_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub lead: Option<String>,
    #[serde(default)]
    pub body_content: Option<String>,
    #[serde(deserialize_with = "trimmed")]
    pub reporter_name: String,
    #[serde(deserialize_with = "trimmed")]
    pub category_name: String,
}

/// One row of the traffic source: an article's metrics for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficRecord {
    #[serde(deserialize_with = "trimmed")]
    pub traffic_date: String,
    #[serde(deserialize_with = "required_integer")]
    pub article_id: i64,
    #[serde(rename = "activeUsers", default, deserialize_with = "lenient_integer")]
    pub active_users: Option<i64>,
    #[serde(default, deserialize_with = "lenient_integer")]
    pub sessions: Option<i64>,
    #[serde(rename = "screenPageViews", default, deserialize_with = "lenient_integer")]
    pub screen_page_views: Option<i64>,
    #[serde(rename = "screenPageViewsPerSession", default, deserialize_with = "lenient_float")]
    pub screen_page_views_per_session: Option<f64>,
    #[serde(rename = "screenPageViewsPerUser", default, deserialize_with = "lenient_float")]
    pub screen_page_views_per_user: Option<f64>,
}

/// Metrics carried by a GAIN relationship. `None` leaves the property unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GainMetrics {
    pub active_users: Option<i64>,
    pub sessions: Option<i64>,
    pub screen_page_views: Option<i64>,
    pub screen_page_views_per_session: Option<f64>,
    pub screen_page_views_per_user: Option<f64>,
}

/// Rows that the graph store cannot merge on.
pub trait KeyedRecord {
    /// Name of the first blank key column, if any.
    fn blank_key(&self) -> Option<&'static str>;
}

impl KeyedRecord for ArticleRecord {
    fn blank_key(&self) -> Option<&'static str> {
        if self.reporter_name.is_empty() {
            Some("reporter_name")
        } else if self.category_name.is_empty() {
            Some("category_name")
        } else {
            None
        }
    }
}

impl KeyedRecord for TrafficRecord {
    fn blank_key(&self) -> Option<&'static str> {
        if self.traffic_date.is_empty() {
            Some("traffic_date")
        } else {
            None
        }
    }
}

impl TrafficRecord {
    pub fn metrics(&self) -> GainMetrics {
        GainMetrics {
            active_users: self.active_users,
            sessions: self.sessions,
            screen_page_views: self.screen_page_views,
            screen_page_views_per_session: self.screen_page_views_per_session,
            screen_page_views_per_user: self.screen_page_views_per_user,
        }
    }
}

/// `toInteger` on a string: integral text, or a float truncated toward zero.
pub fn to_integer(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<i64>() {
        return Some(value);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value.abs() < i64::MAX as f64 => Some(value.trunc() as i64),
        _ => None,
    }
}

/// `toFloat` on a string.
pub fn to_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

fn cell<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Option::<String>::deserialize(deserializer)
}

fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(cell(deserializer)?.map(|raw| raw.trim().to_string()).unwrap_or_default())
}

fn required_integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let raw = cell(deserializer)?.unwrap_or_default();
    to_integer(&raw).ok_or_else(|| D::Error::custom(format!("invalid integer '{}'", raw.trim())))
}

fn lenient_integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    Ok(cell(deserializer)?.as_deref().and_then(to_integer))
}

fn lenient_float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(cell(deserializer)?.as_deref().and_then(to_float))
}
