mod config;
mod errors;
mod forms;
mod integrations;
mod routes;
mod session;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::forms::remote::RemoteFormsClient;
use crate::integrations::store::RedisIntegrationStore;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("forms_api={},tower_http=info", &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting forms API v{}", env!("CARGO_PKG_VERSION"));

    let mut state = AppState::in_memory(config.clone());

    if let Some(url) = &config.redis_url {
        let redis = redis::Client::open(url.as_str())?;
        state.integrations = Arc::new(RedisIntegrationStore::new(redis));
    } else {
        info!("REDIS_URL not set; integration configs kept in memory");
    }

    if let Some(base_url) = &config.forms_api_url {
        let remote = RemoteFormsClient::new(reqwest::Client::new(), base_url.as_str());
        match remote.get_all_forms().await {
            Ok(forms) => {
                let count = forms.len();
                for form in forms {
                    state.forms.save(form).await?;
                }
                info!(count, "Seeded forms from remote API");
            }
            Err(e) => warn!(error = %e, "Could not load forms from remote API"),
        }
        state.submit_sink = Arc::new(remote);
        info!("Submissions forwarded to {base_url}");
    }

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
