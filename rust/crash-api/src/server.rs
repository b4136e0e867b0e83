use crate::{
    config::AppConfig,
    db::{self, PgPool},
    error::Result,
    query::{
        filters::{clean_filters, CrashFilter},
        points::MapRequest,
        QueryEngine,
    },
    state::AppState,
};
use axum::{
    extract::{Query, State},
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::{collections::HashMap, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{debug, info, warn};

pub const STATUS_MESSAGE: &str = "The server is running.";

pub struct Server {
    config: Arc<AppConfig>,
    state: AppState,
}

impl Server {
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        let pool = db::connect_pool(&config).await?;
        Self::with_pool(config, pool)
    }

    pub fn with_pool(config: AppConfig, pool: PgPool) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let query = QueryEngine::new(pool, Arc::clone(&config))?;
        let state = AppState::new(Arc::clone(&config), query);

        Ok(Self { config, state })
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/test", get(Self::status))
            .route("/map", get(Self::map))
            .route("/crashes", get(Self::crashes))
            .route("/api/filter_request", get(Self::crashes))
            .route("/years", get(Self::years))
            .with_state(self.state.clone())
            .layer(cors_layer(self.state.config.allowed_origins.as_deref()))
            .layer(TraceLayer::new_for_http())
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let addr = self.config.listen_addr;
        let listener = TcpListener::bind(addr).await?;
        info!(%addr, "crash API listening");
        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    async fn status() -> &'static str {
        STATUS_MESSAGE
    }

    async fn map(
        State(state): State<AppState>,
        Query(params): Query<HashMap<String, String>>,
    ) -> Result<Json<Vec<Value>>> {
        let request = MapRequest::from_params(&params)?;
        let points = state.query.map_points(&request).await?;
        Ok(Json(points))
    }

    async fn crashes(
        State(state): State<AppState>,
        Query(pairs): Query<Vec<(String, String)>>,
    ) -> Result<Json<Vec<Value>>> {
        let filter = CrashFilter::try_from(clean_filters(pairs)?)?;
        debug!(?filter, "aggregating crash totals");
        let totals = state.query.zip_totals(&filter).await?;
        Ok(Json(totals))
    }

    async fn years(State(state): State<AppState>) -> Result<Json<Vec<Value>>> {
        Ok(Json(state.query.years().await?))
    }
}

fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers(Any);

    match allowed_origins {
        None => layer.allow_origin(Any),
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match origin.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!(%origin, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            layer.allow_origin(AllowOrigin::list(origins))
        }
    }
}
