#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tmdb_lookup::error::UpstreamError;
use tmdb_lookup::models::{DetailRecord, MediaKind, SearchResultItem, SeasonDetail};
use tmdb_lookup::tmdb::TmdbApi;

/// In-memory upstream. Every call is recorded in `calls` as a short string.
#[derive(Default)]
pub struct FakeTmdb {
    pub movie_results: Vec<Value>,
    pub tv_results: Vec<Value>,
    pub fail_search: bool,
    pub panic_search: bool,
    pub details: HashMap<(&'static str, i64), Value>,
    pub seasons: HashMap<i64, Value>,
    pub episodes: HashMap<(i64, i64), Value>,
    pub failing_people: HashSet<i64>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeTmdb {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn missing(operation: String) -> UpstreamError {
        UpstreamError::Status {
            operation,
            status: 404,
            body: "{\"status_code\":34}".to_string(),
        }
    }
}

#[async_trait]
impl TmdbApi for FakeTmdb {
    async fn search(
        &self,
        kind: MediaKind,
        query: &str,
    ) -> Result<Vec<SearchResultItem>, UpstreamError> {
        self.record(format!("search {kind} {query}"));
        if self.panic_search {
            panic!("search index poisoned");
        }
        if self.fail_search {
            return Err(UpstreamError::Timeout {
                operation: format!("search {kind}"),
            });
        }
        let raw = match kind {
            MediaKind::Movie => &self.movie_results,
            MediaKind::Tv => &self.tv_results,
        };
        Ok(raw
            .iter()
            .map(|v| serde_json::from_value(v.clone()).unwrap())
            .collect())
    }

    async fn details(
        &self,
        kind: MediaKind,
        id: i64,
        append: &[&str],
    ) -> Result<DetailRecord, UpstreamError> {
        let operation = format!("{kind} {id} details");
        self.record(format!("details {kind} {id} [{}]", append.join(",")));
        let value = self
            .details
            .get(&(kind.as_path(), id))
            .cloned()
            .ok_or_else(|| Self::missing(operation.clone()))?;
        DetailRecord::from_value(operation, value)
    }

    async fn person(&self, id: i64) -> Result<Value, UpstreamError> {
        self.record(format!("person {id}"));
        // Later ids finish first so completion order differs from cast order.
        for _ in 0..(100 - id.rem_euclid(100)) {
            tokio::task::yield_now().await;
        }
        if self.failing_people.contains(&id) {
            return Err(UpstreamError::Status {
                operation: format!("person {id}"),
                status: 500,
                body: "boom".to_string(),
            });
        }
        Ok(person_detail(id))
    }

    async fn season(
        &self,
        show_id: i64,
        season_number: i64,
    ) -> Result<SeasonDetail, UpstreamError> {
        let operation = format!("tv {show_id} season {season_number}");
        self.record(format!("season {show_id} {season_number}"));
        let value = self
            .seasons
            .get(&season_number)
            .cloned()
            .ok_or_else(|| Self::missing(operation.clone()))?;
        serde_json::from_value(value).map_err(|e| UpstreamError::shape(operation, e.to_string()))
    }

    async fn episode(
        &self,
        show_id: i64,
        season_number: i64,
        episode_number: i64,
        append: &[&str],
    ) -> Result<DetailRecord, UpstreamError> {
        let operation = format!("tv {show_id} season {season_number} episode {episode_number}");
        self.record(format!(
            "episode {show_id} {season_number} {episode_number} [{}]",
            append.join(",")
        ));
        let value = self
            .episodes
            .get(&(season_number, episode_number))
            .cloned()
            .ok_or_else(|| Self::missing(operation.clone()))?;
        DetailRecord::from_value(operation, value)
    }
}

pub fn person_detail(id: i64) -> Value {
    json!({
        "id": id,
        "name": format!("Person {id}"),
        "biography": format!("Biography of person {id}"),
        "place_of_birth": "Somewhere"
    })
}

pub fn cast(count: i64) -> Vec<Value> {
    (1..=count)
        .map(|id| {
            json!({
                "id": id,
                "name": format!("Actor {id}"),
                "character": format!("Character {id}"),
                "profile_path": format!("/actor{id}.jpg")
            })
        })
        .collect()
}

pub fn movie_detail(id: i64, title: &str, cast_count: i64) -> Value {
    json!({
        "id": id,
        "title": title,
        "overview": "A team of explorers travel through a wormhole in space.",
        "release_date": "2014-11-05",
        "poster_path": "/gEU2QniE6E77NI6lCU6MxlNBvIx.jpg",
        "credits": {
            "cast": cast(cast_count),
            "crew": [{"id": 525, "name": "Christopher Nolan", "job": "Director"}]
        },
        "videos": {"results": [{"site": "YouTube", "type": "Trailer", "key": "zSWdZVtXT7E"}]}
    })
}

pub fn show_detail(id: i64, name: &str, seasons: &[i64]) -> Value {
    let seasons: Vec<Value> = seasons
        .iter()
        .map(|n| json!({"season_number": n, "name": format!("Season {n}")}))
        .collect();
    json!({"id": id, "name": name, "seasons": seasons})
}

pub fn season(episodes: &[(i64, &str)]) -> Value {
    let episodes: Vec<Value> = episodes
        .iter()
        .map(|(n, name)| json!({"episode_number": n, "name": name}))
        .collect();
    json!({"episodes": episodes})
}

pub fn episode_detail(name: &str, cast_count: i64) -> Value {
    json!({
        "name": name,
        "air_date": "2013-09-15",
        "credits": {
            "cast": cast(cast_count),
            "crew": [],
            "guest_stars": []
        }
    })
}
