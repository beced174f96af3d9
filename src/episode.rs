use tracing::{debug, info};

use crate::enrich::enrich_cast;
use crate::error::{LookupError, NotFoundReason, QueryField};
use crate::models::{DetailRecord, MediaKind, SeasonDetail};
use crate::resolve::titles_match;
use crate::tmdb::TmdbApi;

/// Where a matching episode was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeLocation {
    pub season_number: i64,
    pub episode_number: i64,
}

/// Finds the episode titled `episode_title` in a show and returns its enriched detail.
///
/// Seasons are fetched one at a time in ascending order and the scan stops at the
/// first season containing a match, so later seasons are never requested.
pub async fn locate_episode(
    tmdb: &dyn TmdbApi,
    show_id: i64,
    episode_title: &str,
    cast_limit: usize,
) -> Result<DetailRecord, LookupError> {
    let show = tmdb.details(MediaKind::Tv, show_id, &[]).await?;
    let seasons = show.season_numbers()?;

    let Some(location) = scan_seasons(tmdb, show_id, &seasons, episode_title).await? else {
        return Err(LookupError::not_found(
            NotFoundReason::NoEpisodeMatch,
            QueryField::EpisodeTitle,
        ));
    };
    info!(
        show_id,
        season = location.season_number,
        episode = location.episode_number,
        "Matched episode '{}'",
        episode_title
    );

    let episode = tmdb
        .episode(
            show_id,
            location.season_number,
            location.episode_number,
            &["credits"],
        )
        .await?;
    Ok(enrich_cast(tmdb, episode, cast_limit).await?)
}

async fn scan_seasons(
    tmdb: &dyn TmdbApi,
    show_id: i64,
    seasons: &[i64],
    episode_title: &str,
) -> Result<Option<EpisodeLocation>, LookupError> {
    for &season_number in seasons {
        let season = tmdb.season(show_id, season_number).await?;
        if let Some(episode_number) = find_in_season(&season, episode_title) {
            return Ok(Some(EpisodeLocation {
                season_number,
                episode_number,
            }));
        }
        debug!(show_id, season = season_number, "No episode match in season");
    }
    Ok(None)
}

/// Episode number of the first episode in `season` titled `episode_title`, ignoring case.
pub fn find_in_season(season: &SeasonDetail, episode_title: &str) -> Option<i64> {
    season
        .episodes
        .iter()
        .find(|ep| titles_match(&ep.name, episode_title))
        .map(|ep| ep.episode_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EpisodeSummary;

    fn season(names: &[(i64, &str)]) -> SeasonDetail {
        SeasonDetail {
            episodes: names
                .iter()
                .map(|(n, name)| EpisodeSummary {
                    episode_number: *n,
                    name: name.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn finds_episode_ignoring_case() {
        let s = season(&[(1, "Pilot"), (2, "Ozymandias")]);
        assert_eq!(find_in_season(&s, "ozymandias"), Some(2));
    }

    #[test]
    fn first_matching_episode_wins() {
        let s = season(&[(4, "Reunion"), (9, "reunion")]);
        assert_eq!(find_in_season(&s, "Reunion"), Some(4));
    }

    #[test]
    fn no_match_in_empty_or_unrelated_season() {
        assert_eq!(find_in_season(&season(&[]), "Pilot"), None);
        assert_eq!(find_in_season(&season(&[(1, "Pilot Part 2")]), "Pilot"), None);
    }
}
