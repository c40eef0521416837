//! HTTP surface: the searchable index, the manual refresh and robots.txt.

use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};
use url::form_urlencoded;

use crate::config::{Config, Mode};
use crate::freshness::{FreshnessPolicy, RefreshCoordinator};
use crate::pipeline::{run_refresh, TransportFactory};
use crate::search::search;
use crate::store;
use crate::views::{self, IndexView};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub freshness: FreshnessPolicy,
    pub coordinator: Arc<RefreshCoordinator>,
    pub transports: TransportFactory,
}

impl AppState {
    pub fn new(config: Config, transports: TransportFactory) -> Self {
        Self {
            config: Arc::new(config),
            freshness: FreshnessPolicy::default(),
            coordinator: RefreshCoordinator::new(),
            transports,
        }
    }
}

/// The first `q` parameter, trimmed. Repeated or undecodable parameters
/// never reject the request.
pub fn search_query(raw: Option<&str>) -> String {
    raw.and_then(|raw| {
        form_urlencoded::parse(raw.as_bytes())
            .find(|(key, _)| key == "q")
            .map(|(_, value)| value.trim().to_string())
    })
    .unwrap_or_default()
}

pub fn build_app(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/", get(index))
        .route("/robots.txt", get(robots_txt));

    // Automatic mode has no refresh route at all, so it 404s.
    if state.config.mode == Mode::Manual {
        router = router.route("/refresh", get(refresh));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

async fn index(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Html<String> {
    maybe_trigger_background_refresh(&state).await;

    let query = search_query(raw.as_deref());
    let path = state.config.jobs_path();
    let needle = query.clone();
    let (jobs, last_updated) = tokio::task::spawn_blocking(move || {
        (search(store::load(&path), &needle), store::last_modified(&path))
    })
    .await
    .unwrap_or_else(|e| {
        error!(error = %e, "Loading jobs failed");
        (Vec::new(), None)
    });

    Html(views::render_index(&IndexView {
        jobs: &jobs,
        query: &query,
        last_updated,
        show_refresh: state.config.mode == Mode::Manual,
    }))
}

async fn refresh(State(state): State<AppState>, RawQuery(raw): RawQuery) -> Response {
    let query = search_query(raw.as_deref());
    let config = Arc::clone(&state.config);
    let transports = state.transports.clone();

    let result = tokio::task::spawn_blocking(move || {
        run_refresh(&config, &transports, config.mode.scrape_delay())
    })
    .await;

    match result {
        Ok(Ok(count)) => {
            info!(jobs = count, "Manual refresh done");
            Redirect::to(&views::index_href(&query)).into_response()
        }
        Ok(Err(e)) => {
            error!("Refresh failed: {:#}", anyhow::Error::new(e));
            refresh_failed()
        }
        Err(e) => {
            error!(error = %e, "Refresh task died");
            refresh_failed()
        }
    }
}

fn refresh_failed() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Html(views::render_error(
            "Could not load the job listings. Please try again later.",
        )),
    )
        .into_response()
}

async fn robots_txt() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        views::ROBOTS_TXT,
    )
}

/// In automatic mode, starts one background refresh when the jobs file is
/// stale and no refresh is running. Never waits for it.
async fn maybe_trigger_background_refresh(state: &AppState) {
    if state.config.mode != Mode::Automatic {
        return;
    }
    let freshness = state.freshness.clone();
    let path = state.config.jobs_path();
    let stale = tokio::task::spawn_blocking(move || freshness.should_auto_refresh(&path))
        .await
        .unwrap_or(true);
    if !stale {
        return;
    }
    let Some(slot) = state.coordinator.try_acquire() else {
        debug!("Background refresh already running");
        return;
    };

    info!("Jobs are stale, starting background refresh");
    let config = Arc::clone(&state.config);
    let transports = state.transports.clone();
    tokio::task::spawn_blocking(move || {
        let _slot = slot;
        match run_refresh(&config, &transports, config.mode.scrape_delay()) {
            Ok(count) => info!(jobs = count, "Background refresh done"),
            Err(e) => error!(
                "Background refresh failed, keeping old data: {:#}",
                anyhow::Error::new(e)
            ),
        }
    });
}
