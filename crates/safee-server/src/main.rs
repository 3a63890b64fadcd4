mod configuration;
mod error;
mod routes;
mod state;

use crate::configuration::Settings;
use crate::state::AppState;
use safee::agent::Agent;
use safee::providers::openai::OpenAiProvider;
use safee::scoring::{ScoringClient, ScoringConfig};
use safee::speech::HttpSynthesizer;
use safee::tools::ToolRegistry;
use safee::transcript::TranscriptLog;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let settings = Settings::new()?;
    let addr = settings.server.socket_addr()?;

    let provider = OpenAiProvider::new(settings.provider.into_config())?;
    let scoring = ScoringClient::new(ScoringConfig::default())?;
    let synthesizer = HttpSynthesizer::new(
        settings.speech.host.clone(),
        settings.speech.api_key.clone(),
        settings.speech.voice_config(),
    )?;

    let agent = Agent::new(
        Box::new(provider),
        ToolRegistry::new(scoring),
        Box::new(synthesizer),
        TranscriptLog::new(settings.storage.transcript.clone()),
        settings.storage.knowledge_base.clone().into(),
    );
    let state = AppState {
        agent: Arc::new(agent),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
