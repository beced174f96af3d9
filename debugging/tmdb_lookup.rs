//! Run a lookup against the live TMDB API and print the JSON the server would return.
//! Usage:
//!   cargo run --bin tmdb_lookup -- movie "<title>"
//!   cargo run --bin tmdb_lookup -- tv "<title>" "<episode title>"
//!   cargo run --bin tmdb_lookup -- tv "<title>" <season_number> <episode_number>
//! Requires TMDB_READ_ACCESS_TOKEN in the environment (.env supported).

use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use tmdb_lookup::config::Config;
use tmdb_lookup::error::ApiError;
use tmdb_lookup::lookup::{EpisodeQuery, Lookup};
use tmdb_lookup::models::MediaKind;
use tmdb_lookup::tmdb::TmdbClient;

#[derive(Debug, Clone, Copy, PartialEq)]
struct KindArg(MediaKind);

impl FromStr for KindArg {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "movie" => Ok(KindArg(MediaKind::Movie)),
            "tv" => Ok(KindArg(MediaKind::Tv)),
            _ => Err(anyhow::anyhow!("media kind must be 'movie' or 'tv'")),
        }
    }
}

fn usage() -> anyhow::Error {
    anyhow::anyhow!(
        "usage: tmdb_lookup movie <title> | tv <title> <episode title> | tv <title> <season> <episode>"
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    let config = Config::from_env()?;
    let client = TmdbClient::from_config(&config)?;
    let lookup = Lookup::new(&client, config.cast_detail_limit);

    let args: Vec<String> = env::args().skip(1).collect();
    let KindArg(kind) = args.first().ok_or_else(usage)?.parse()?;
    let title = args.get(1).ok_or_else(usage)?;

    let result = match (kind, &args[2..]) {
        (MediaKind::Movie, []) => lookup.movie(title).await,
        (MediaKind::Tv, [episode_title]) => {
            lookup
                .episode(title, &EpisodeQuery::Title(episode_title.clone()))
                .await
        }
        (MediaKind::Tv, [season, episode]) => {
            let season = season.parse().context("season must be a number")?;
            let episode = episode.parse().context("episode must be a number")?;
            lookup
                .episode(title, &EpisodeQuery::Number { season, episode })
                .await
        }
        _ => return Err(usage()),
    };

    match result {
        Ok(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Err(err) => {
            let api_error = ApiError::new(kind, err);
            println!("{}", serde_json::to_string_pretty(&api_error.envelope())?);
            anyhow::bail!("lookup failed with status {}", api_error.status())
        }
    }
}
