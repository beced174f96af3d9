use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::UpstreamError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    /// Path segment used by the upstream API.
    pub fn as_path(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "TV show",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}

/// One candidate from `/search/movie` or `/search/tv`.
///
/// Movies carry `title`/`release_date`, shows carry `name`/`first_air_date`; both
/// land in the same fields here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub id: i64,
    #[serde(rename = "title", alias = "name")]
    pub display_name: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default, rename = "date", alias = "release_date", alias = "first_air_date")]
    pub date: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub results: Vec<SearchResultItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeasonDetail {
    pub episodes: Vec<EpisodeSummary>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EpisodeSummary {
    pub episode_number: i64,
    #[serde(default)]
    pub name: String,
}

/// A full upstream record (movie, show or episode), kept as the raw JSON object so it
/// can be returned untouched apart from cast enrichment.
///
/// Fields the pipeline relies on are checked when they are read; a missing or
/// mistyped field fails as [`UpstreamError::Shape`] naming the call that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailRecord {
    operation: String,
    body: Map<String, Value>,
}

impl DetailRecord {
    pub fn from_value(operation: impl Into<String>, value: Value) -> Result<Self, UpstreamError> {
        let operation = operation.into();
        match value {
            Value::Object(body) => Ok(Self { operation, body }),
            other => Err(UpstreamError::shape(
                operation,
                format!("expected a JSON object, got {}", json_type(&other)),
            )),
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    pub fn cast(&self) -> Result<&Vec<Value>, UpstreamError> {
        self.body
            .get("credits")
            .and_then(|c| c.get("cast"))
            .and_then(Value::as_array)
            .ok_or_else(|| self.missing("credits.cast"))
    }

    pub fn cast_mut(&mut self) -> Result<&mut Vec<Value>, UpstreamError> {
        // Borrowck: build the error before taking the mutable borrow.
        let err = self.missing("credits.cast");
        self.body
            .get_mut("credits")
            .and_then(|c| c.get_mut("cast"))
            .and_then(Value::as_array_mut)
            .ok_or(err)
    }

    /// Season numbers of a show record, ascending.
    pub fn season_numbers(&self) -> Result<Vec<i64>, UpstreamError> {
        let seasons = self
            .body
            .get("seasons")
            .and_then(Value::as_array)
            .ok_or_else(|| self.missing("seasons"))?;
        let mut numbers = seasons
            .iter()
            .map(|s| {
                s.get("season_number")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| self.missing("seasons[].season_number"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        numbers.sort_unstable();
        Ok(numbers)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.body)
    }

    fn missing(&self, field: &str) -> UpstreamError {
        UpstreamError::shape(&self.operation, format!("missing or invalid `{field}`"))
    }
}

impl Serialize for DetailRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.body.serialize(serializer)
    }
}

/// `id` of a cast entry, if it is an object with an integer id.
pub fn cast_member_id(member: &Value) -> Option<i64> {
    member.as_object()?.get("id")?.as_i64()
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
