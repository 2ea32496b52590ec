//! HTTP surface over the resolver and the channel directory.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use streams_resolver::{
    directory::{DEFAULT_SUGGESTIONS, Directory, DirectoryCache, DirectoryError, DirectoryLoader},
    extractor::{ResolveError, StreamResolver},
    media::{ChannelDescriptor, ChannelKind, PlaybackMode, ResolvedStream},
};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use url::Url;

const BANNER: &str = "gengas stream resolver is running";

#[derive(Clone)]
pub struct AppState {
    resolver: StreamResolver,
    loader: DirectoryLoader,
    cache: Arc<RwLock<DirectoryCache>>,
}

impl AppState {
    pub fn new(resolver: StreamResolver, loader: DirectoryLoader, cache_ttl: Duration) -> Self {
        Self {
            resolver,
            loader,
            cache: Arc::new(RwLock::new(DirectoryCache::new(cache_ttl))),
        }
    }

    async fn directory(&self) -> Result<Arc<Directory>, DirectoryError> {
        if let Some(directory) = self.cache.read().await.get_fresh(Instant::now()) {
            return Ok(directory);
        }

        // Misses queue on the write lock and `load_cached` re-checks freshness,
        // so only the first of them fetches.
        let mut cache = self.cache.write().await;
        self.loader.load_cached(&mut cache).await
    }
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        let status = match &err {
            ResolveError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ResolveError::Unsupported(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ResolveError::ExtractionFailed(_) => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        warn!("Directory request failed: {err}");
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: "channels not available".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayResponse {
    // Field name older clients read the playable url from
    stream_url: String,
    #[serde(flatten)]
    stream: ResolvedStream,
}

impl From<ResolvedStream> for PlayResponse {
    fn from(stream: ResolvedStream) -> Self {
        Self {
            stream_url: stream.playable_url.clone(),
            stream,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayQuery {
    url: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    mode: Option<String>,
    #[serde(default)]
    force: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    channel: ChannelDescriptor,
    #[serde(default)]
    mode: PlaybackMode,
    #[serde(default)]
    force: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
    limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NameQuery {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UrlQuery {
    url: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/channels", get(channels))
        .route("/api/channels/{country}", get(country))
        .route("/api/search", get(search))
        .route("/api/match", get(match_country))
        .route("/api/play", get(play))
        .route("/api/resolve", post(resolve))
        .route("/video", get(video))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(state: AppState, host: &str, port: u16) -> std::io::Result<()> {
    let listener = TcpListener::bind((host, port)).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    info!("Shutting down");
}

async fn index() -> &'static str {
    BANNER
}

async fn channels(State(state): State<AppState>) -> ApiResult<Json<Directory>> {
    let directory = state.directory().await?;
    Ok(Json(directory.as_ref().clone()))
}

async fn country(
    State(state): State<AppState>,
    Path(country): Path<String>,
) -> ApiResult<Json<Value>> {
    let directory = state.directory().await?;
    let (key, entry) = directory
        .get(&country)
        .map(|entry| (country.as_str(), entry))
        .or_else(|| directory.match_country(&country))
        .ok_or_else(|| ApiError::not_found(format!("unknown country: {country}")))?;

    Ok(Json(json!({
        "name": key,
        "code": entry.code,
        "timezone": entry.timezone,
        "localTime": entry.local_time(Utc::now()),
        "channels": entry.channels,
    })))
}

async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<String>>> {
    let directory = state.directory().await?;
    let q = query.q.unwrap_or_default();
    let limit = query.limit.unwrap_or(DEFAULT_SUGGESTIONS);

    Ok(Json(
        directory
            .suggest(&q, limit)
            .into_iter()
            .map(str::to_string)
            .collect(),
    ))
}

async fn match_country(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> ApiResult<Json<Value>> {
    let name = query
        .name
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("missing name parameter"))?;

    let directory = state.directory().await?;
    let (key, _) = directory
        .match_country(&name)
        .ok_or_else(|| ApiError::not_found(format!("no country matches {name:?}")))?;

    Ok(Json(json!({ "key": key })))
}

async fn play(
    State(state): State<AppState>,
    Query(query): Query<PlayQuery>,
) -> ApiResult<Json<PlayResponse>> {
    let mode = match query.mode.as_deref() {
        Some(mode) => mode.parse::<PlaybackMode>().map_err(ApiError::bad_request)?,
        None => PlaybackMode::Direct,
    };
    let kind = ChannelKind::from(query.kind.as_deref().unwrap_or("youtube"));
    let url = query.url.unwrap_or_default();
    let descriptor = ChannelDescriptor::new(url.clone(), kind, url);

    resolve_channel(&state, &descriptor, mode, query.force).await
}

async fn resolve(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> ApiResult<Json<PlayResponse>> {
    resolve_channel(&state, &request.channel, request.mode, request.force).await
}

async fn resolve_channel(
    state: &AppState,
    descriptor: &ChannelDescriptor,
    mode: PlaybackMode,
    force: bool,
) -> ApiResult<Json<PlayResponse>> {
    let resolved = if force {
        state.resolver.resolve_after_playback_failure(descriptor).await
    } else {
        state.resolver.resolve(descriptor, mode).await
    };

    match resolved {
        Ok(stream) => Ok(Json(stream.into())),
        Err(e) => {
            warn!(url = %descriptor.url, "Resolution failed: {e}");
            Err(e.into())
        }
    }
}

async fn video(
    State(state): State<AppState>,
    Query(query): Query<UrlQuery>,
) -> ApiResult<Json<Value>> {
    let url = query
        .url
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("missing url parameter"))?;
    let url = Url::parse(url.trim())
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .ok_or_else(|| ApiError::bad_request(format!("not an http(s) url: {url:?}")))?;

    match state.resolver.extractor().metadata(url.as_str()).await {
        Ok(metadata) => Ok(Json(metadata.raw)),
        Err(e) => {
            error!(url = %url, "Failed to fetch video data: {e}");
            Err(ApiError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Failed to fetch video data".to_string(),
            })
        }
    }
}
