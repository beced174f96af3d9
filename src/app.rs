use crate::config::Config;
use crate::error::{panic_response, ApiError, LookupError, QueryField};
use crate::lookup::{EpisodeQuery, Lookup};
use crate::models::MediaKind;
use crate::tmdb::{TmdbApi, TmdbClient};
use anyhow::Result;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::Response,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub tmdb: Arc<dyn TmdbApi>,
    pub cast_detail_limit: usize,
}

impl AppState {
    fn lookup(&self) -> Lookup<'_> {
        Lookup::new(self.tmdb.as_ref(), self.cast_detail_limit)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct MovieQuery {
    pub title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TvQuery {
    pub title: Option<String>,
    pub episode_title: Option<String>,
    pub season_number: Option<String>,
    pub episode_number: Option<String>,
}

pub async fn run_server(config: Config) -> Result<()> {
    let tmdb: Arc<dyn TmdbApi> = Arc::new(TmdbClient::from_config(&config)?);
    info!(
        base_url = %config.tmdb_base_url,
        timeout_secs = config.upstream_timeout.as_secs(),
        cast_detail_limit = config.cast_detail_limit,
        "TMDB client ready"
    );

    let state = AppState {
        tmdb,
        cast_detail_limit: config.cast_detail_limit,
    };

    let app = build_router(state);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/search/movie",
            get(search_movie).layer(CatchPanicLayer::custom(movie_panic)),
        )
        .route(
            "/search/tv",
            get(search_tv).layer(CatchPanicLayer::custom(tv_panic)),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn movie_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    panic_response(MediaKind::Movie, payload)
}

fn tv_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    panic_response(MediaKind::Tv, payload)
}

async fn health() -> &'static str {
    "OK"
}

async fn search_movie(
    State(state): State<AppState>,
    query: Result<Query<MovieQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let kind = MediaKind::Movie;
    let Query(query) = query.map_err(|e| reject_query(kind, e))?;
    let title = required(query.title.as_deref(), QueryField::Title)
        .map_err(|e| ApiError::new(kind, e))?;

    info!("Movie search for '{}'", title);
    let record = state
        .lookup()
        .movie(title)
        .await
        .map_err(|e| ApiError::new(kind, e))?;
    Ok(Json(record.into_value()))
}

async fn search_tv(
    State(state): State<AppState>,
    query: Result<Query<TvQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let kind = MediaKind::Tv;
    let Query(query) = query.map_err(|e| reject_query(kind, e))?;
    let (title, episode) = parse_tv_query(&query).map_err(|e| ApiError::new(kind, e))?;

    info!("TV search for '{}' ({:?})", title, episode);
    let record = state
        .lookup()
        .episode(title, &episode)
        .await
        .map_err(|e| ApiError::new(kind, e))?;
    Ok(Json(record.into_value()))
}

/// Validates a TV query and decides how the episode is addressed.
///
/// A non-empty `episodeTitle` selects the title scan; otherwise both numbers are required.
pub fn parse_tv_query(query: &TvQuery) -> Result<(&str, EpisodeQuery), LookupError> {
    let title = required(query.title.as_deref(), QueryField::Title)?;

    if let Some(episode_title) = query.episode_title.as_deref() {
        let episode_title = required(Some(episode_title), QueryField::EpisodeTitle)?;
        return Ok((title, EpisodeQuery::Title(episode_title.to_string())));
    }

    match (
        query.season_number.as_deref(),
        query.episode_number.as_deref(),
    ) {
        (None, None) => Err(LookupError::missing(QueryField::EpisodeTitle)),
        (season, episode) => {
            let season = number(season, QueryField::SeasonNumber)?;
            let episode = number(episode, QueryField::EpisodeNumber)?;
            Ok((title, EpisodeQuery::Number { season, episode }))
        }
    }
}

fn required(value: Option<&str>, field: QueryField) -> Result<&str, LookupError> {
    match value {
        None => Err(LookupError::missing(field)),
        Some("") => Err(LookupError::empty(field)),
        Some(v) => Ok(v),
    }
}

fn number(value: Option<&str>, field: QueryField) -> Result<i64, LookupError> {
    let raw = required(value, field)?;
    raw.trim()
        .parse::<u32>()
        .map(i64::from)
        .map_err(|_| LookupError::not_a_number(field))
}

fn reject_query(kind: MediaKind, rejection: QueryRejection) -> ApiError {
    warn!("Malformed query string: {}", rejection.body_text());
    ApiError::new(kind, LookupError::MalformedQuery(rejection.body_text()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
