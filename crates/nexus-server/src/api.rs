use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::sse::{Event, KeepAlive, Sse},
    routing::{delete, get, patch, post},
    Json, Router,
};
use futures::stream::{self, Stream};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use nexus_client::{catalog, Dashboard, DashboardEvent, FetchKind, TargetStatus};
use nexus_shared::{
    CryptoData, CryptoHistoryItem, FavoriteItem, LoadStatus, NewsArticle, Notification,
    NotificationPreferences, NotificationPreferencesPatch, WeatherData, WeatherHistoryItem,
};

use crate::error::ServerError;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<Dashboard>,
    /// Parent of every request-scoped fetch token; cancelled on shutdown.
    pub shutdown: CancellationToken,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/api/events", get(event_stream))
        .route("/api/crypto", get(crypto_overview))
        .route("/api/crypto/:id", get(crypto_detail))
        .route("/api/crypto/:id/refresh", post(crypto_refresh))
        .route("/api/crypto/:id/history/refresh", post(crypto_history_refresh))
        .route("/api/weather", get(weather_overview))
        .route("/api/weather/:city", get(weather_detail))
        .route("/api/weather/:city/refresh", post(weather_refresh))
        .route("/api/weather/:city/history/refresh", post(weather_history_refresh))
        .route("/api/news", get(news_view))
        .route("/api/news/refresh", post(news_refresh))
        .route("/api/favorites", get(favorites_list).delete(favorites_clear))
        .route("/api/favorites/toggle", post(favorites_toggle))
        .route(
            "/api/notifications",
            get(notifications_view).delete(notifications_clear),
        )
        .route("/api/notifications/read-all", post(notifications_read_all))
        .route("/api/notifications/preferences", patch(notifications_preferences))
        .route("/api/notifications/:id/read", post(notification_read))
        .route("/api/notifications/:id", delete(notification_dismiss))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─── Response shapes ───

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct StatusPair {
    snapshot: TargetStatus,
    history: TargetStatus,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Overview<T> {
    data: HashMap<String, T>,
    snapshot_status: HashMap<String, TargetStatus>,
    history_status: HashMap<String, TargetStatus>,
    status: LoadStatus,
}

#[derive(Serialize)]
struct Detail<T, H> {
    key: String,
    snapshot: Option<T>,
    history: Vec<H>,
    status: StatusPair,
}

impl<T, H> Detail<T, H> {
    fn is_unknown(&self) -> bool {
        self.snapshot.is_none()
            && self.history.is_empty()
            && self.status.snapshot.status == LoadStatus::Idle
            && self.status.history.status == LoadStatus::Idle
    }
}

#[derive(Serialize)]
struct NewsView {
    articles: Vec<NewsArticle>,
    status: TargetStatus,
}

#[derive(Serialize)]
struct ToggleResponse {
    favorite: bool,
    favorites: Vec<FavoriteItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NotificationsView {
    items: Vec<Notification>,
    unread_count: usize,
    preferences: NotificationPreferences,
}

// ─── Health & events ───

async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, ServerError> {
    let db = state
        .dashboard
        .database()
        .lock()
        .map_err(|_| ServerError::Internal("database lock poisoned".into()))?;
    db.conn()
        .execute_batch("SELECT 1")
        .map_err(|e| ServerError::Internal(format!("database unavailable: {e}")))?;

    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    }))
}

/// Server-sent stream of dashboard events (toasts, unread count, ticks, warnings).
async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    Sse::new(sse_events(state.dashboard.subscribe())).keep_alive(KeepAlive::default())
}

/// One SSE frame per event; a lagging subscriber skips what it missed.
fn sse_events(
    rx: broadcast::Receiver<DashboardEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => match Event::default().event(event.name()).json_data(&event) {
                    Ok(sse) => return Some((Ok(sse), rx)),
                    Err(e) => tracing::warn!(error = %e, "Failed to encode event"),
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    })
}

// ─── Crypto ───

/// Refreshes only reach the source for catalogue entities, so arbitrary
/// path keys never create status entries.
fn known_coin(id: &str) -> Result<(), ServerError> {
    match catalog::coin(id) {
        Some(_) => Ok(()),
        None => Err(ServerError::NotFound(format!("unknown coin '{id}'"))),
    }
}

async fn crypto_overview(State(state): State<AppState>) -> Json<Overview<CryptoData>> {
    let crypto = &state.dashboard.crypto;
    Json(Overview {
        data: crypto.snapshots().await,
        snapshot_status: crypto.statuses(FetchKind::Snapshot).await,
        history_status: crypto.statuses(FetchKind::History).await,
        status: crypto.overall_status().await,
    })
}

async fn crypto_view(state: &AppState, id: &str) -> Detail<CryptoData, CryptoHistoryItem> {
    let crypto = &state.dashboard.crypto;
    Detail {
        key: id.to_string(),
        snapshot: crypto.snapshot(id).await,
        history: crypto.history(id).await,
        status: StatusPair {
            snapshot: crypto.status(FetchKind::Snapshot, id).await,
            history: crypto.status(FetchKind::History, id).await,
        },
    }
}

async fn crypto_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Detail<CryptoData, CryptoHistoryItem>>, ServerError> {
    let view = crypto_view(&state, &id).await;
    if view.is_unknown() {
        return Err(ServerError::NotFound(format!("no data for coin '{id}'")));
    }
    Ok(Json(view))
}

async fn crypto_refresh(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Detail<CryptoData, CryptoHistoryItem>>, ServerError> {
    known_coin(&id)?;
    let cancel = state.shutdown.child_token();
    let status = state.dashboard.crypto.fetch_snapshot(&id, &cancel).await;
    info!(id = %id, ?status, "Crypto snapshot refreshed on request");
    Ok(Json(crypto_view(&state, &id).await))
}

async fn crypto_history_refresh(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Detail<CryptoData, CryptoHistoryItem>>, ServerError> {
    known_coin(&id)?;
    let cancel = state.shutdown.child_token();
    state.dashboard.crypto.fetch_history(&id, &cancel).await;
    Ok(Json(crypto_view(&state, &id).await))
}

// ─── Weather ───

fn known_city(city: &str) -> Result<(), ServerError> {
    if catalog::is_known_city(city) {
        Ok(())
    } else {
        Err(ServerError::NotFound(format!("unknown city '{city}'")))
    }
}

async fn weather_overview(State(state): State<AppState>) -> Json<Overview<WeatherData>> {
    let weather = &state.dashboard.weather;
    Json(Overview {
        data: weather.snapshots().await,
        snapshot_status: weather.statuses(FetchKind::Snapshot).await,
        history_status: weather.statuses(FetchKind::History).await,
        status: weather.overall_status().await,
    })
}

async fn weather_view(state: &AppState, city: &str) -> Detail<WeatherData, WeatherHistoryItem> {
    let weather = &state.dashboard.weather;
    Detail {
        key: nexus_shared::city_slug(city),
        snapshot: weather.snapshot(city).await,
        history: weather.history(city).await,
        status: StatusPair {
            snapshot: weather.status(FetchKind::Snapshot, city).await,
            history: weather.status(FetchKind::History, city).await,
        },
    }
}

async fn weather_detail(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Result<Json<Detail<WeatherData, WeatherHistoryItem>>, ServerError> {
    let view = weather_view(&state, &city).await;
    if view.is_unknown() {
        return Err(ServerError::NotFound(format!("no data for city '{city}'")));
    }
    Ok(Json(view))
}

async fn weather_refresh(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Result<Json<Detail<WeatherData, WeatherHistoryItem>>, ServerError> {
    known_city(&city)?;
    let cancel = state.shutdown.child_token();
    state.dashboard.weather.fetch_snapshot(&city, &cancel).await;
    Ok(Json(weather_view(&state, &city).await))
}

async fn weather_history_refresh(
    State(state): State<AppState>,
    Path(city): Path<String>,
) -> Result<Json<Detail<WeatherData, WeatherHistoryItem>>, ServerError> {
    known_city(&city)?;
    let cancel = state.shutdown.child_token();
    state.dashboard.weather.fetch_history(&city, &cancel).await;
    Ok(Json(weather_view(&state, &city).await))
}

// ─── News ───

async fn news_view(State(state): State<AppState>) -> Json<NewsView> {
    let news = &state.dashboard.news;
    Json(NewsView {
        articles: news.articles().await,
        status: news.status().await,
    })
}

async fn news_refresh(State(state): State<AppState>) -> Json<NewsView> {
    let cancel = state.shutdown.child_token();
    state.dashboard.news.fetch(&cancel).await;
    news_view(State(state)).await
}

// ─── Favorites ───

async fn favorites_list(State(state): State<AppState>) -> Json<Vec<FavoriteItem>> {
    Json(state.dashboard.preferences.favorites().await)
}

async fn favorites_toggle(
    State(state): State<AppState>,
    Json(item): Json<FavoriteItem>,
) -> Result<Json<ToggleResponse>, ServerError> {
    if item.id.trim().is_empty() {
        return Err(ServerError::BadRequest("favorite id must not be empty".into()));
    }
    let preferences = &state.dashboard.preferences;
    let favorite = preferences.toggle_favorite(item).await;
    Ok(Json(ToggleResponse {
        favorite,
        favorites: preferences.favorites().await,
    }))
}

async fn favorites_clear(State(state): State<AppState>) -> StatusCode {
    state.dashboard.preferences.clear_favorites().await;
    StatusCode::NO_CONTENT
}

// ─── Notifications ───

async fn notifications_view(State(state): State<AppState>) -> Json<NotificationsView> {
    let notifications = &state.dashboard.notifications;
    Json(NotificationsView {
        items: notifications.items().await,
        unread_count: notifications.unread_count().await,
        preferences: notifications.preferences().await,
    })
}

async fn notifications_read_all(State(state): State<AppState>) -> Json<NotificationsView> {
    state.dashboard.notifications.mark_all_as_read().await;
    notifications_view(State(state)).await
}

async fn notification_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NotificationsView>, ServerError> {
    if !state.dashboard.notifications.mark_as_read(&id).await {
        return Err(ServerError::NotFound(format!("notification '{id}'")));
    }
    Ok(notifications_view(State(state)).await)
}

async fn notification_dismiss(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NotificationsView>, ServerError> {
    if !state.dashboard.notifications.dismiss(&id).await {
        return Err(ServerError::NotFound(format!("notification '{id}'")));
    }
    Ok(notifications_view(State(state)).await)
}

async fn notifications_clear(State(state): State<AppState>) -> Json<NotificationsView> {
    state.dashboard.notifications.clear().await;
    notifications_view(State(state)).await
}

async fn notifications_preferences(
    State(state): State<AppState>,
    Json(patch): Json<NotificationPreferencesPatch>,
) -> Json<NotificationPreferences> {
    Json(state.dashboard.notifications.update_preferences(patch).await)
}

pub async fn serve(
    state: AppState,
    addr: std::net::SocketAddr,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}
