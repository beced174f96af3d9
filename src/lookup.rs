//! The search → exact match → detail → enrich pipeline shared by every route.

use tracing::info;

use crate::enrich::enrich_cast;
use crate::episode::locate_episode;
use crate::error::{LookupError, QueryField};
use crate::models::{DetailRecord, MediaKind};
use crate::resolve::resolve;
use crate::tmdb::TmdbApi;

const MOVIE_APPEND: &[&str] = &["credits", "videos"];
const EPISODE_APPEND: &[&str] = &["credits"];

/// How a TV episode is addressed by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EpisodeQuery {
    /// Scan seasons for an episode with this title; the result is enriched.
    Title(String),
    /// Fetch the episode directly; the result is returned as the upstream sent it.
    Number { season: i64, episode: i64 },
}

#[derive(Clone, Copy)]
pub struct Lookup<'a> {
    tmdb: &'a dyn TmdbApi,
    cast_limit: usize,
}

impl<'a> Lookup<'a> {
    pub fn new(tmdb: &'a dyn TmdbApi, cast_limit: usize) -> Self {
        Self { tmdb, cast_limit }
    }

    /// Searches `kind` for `title` and returns the id of the exact match.
    pub async fn resolve_id(&self, kind: MediaKind, title: &str) -> Result<i64, LookupError> {
        let candidates = self.tmdb.search(kind, title).await?;
        let matched = resolve(&candidates, title)
            .map_err(|reason| LookupError::not_found(reason, QueryField::Title))?;
        info!(%kind, id = matched.id, "Resolved '{}' -> '{}'", title, matched.display_name);
        Ok(matched.id)
    }

    pub async fn movie(&self, title: &str) -> Result<DetailRecord, LookupError> {
        let id = self.resolve_id(MediaKind::Movie, title).await?;
        let detail = self.tmdb.details(MediaKind::Movie, id, MOVIE_APPEND).await?;
        Ok(enrich_cast(self.tmdb, detail, self.cast_limit).await?)
    }

    pub async fn episode(
        &self,
        title: &str,
        query: &EpisodeQuery,
    ) -> Result<DetailRecord, LookupError> {
        let show_id = self.resolve_id(MediaKind::Tv, title).await?;
        match query {
            EpisodeQuery::Title(episode_title) => {
                locate_episode(self.tmdb, show_id, episode_title, self.cast_limit).await
            }
            EpisodeQuery::Number { season, episode } => Ok(self
                .tmdb
                .episode(show_id, *season, *episode, EPISODE_APPEND)
                .await?),
        }
    }
}
