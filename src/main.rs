use std::error::Error;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use sms_gateway::config::Config;
use sms_gateway::server::{self, AppState};
use sms_gateway::telemetry::init_tracing;
use sms_gateway::AfricasTalkingClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;
    init_tracing(&config)?;

    let mut builder = AfricasTalkingClient::builder(config.username.clone(), config.api_key.clone())
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
    if let Some(endpoint) = config.endpoint.as_deref() {
        builder = builder.endpoint(endpoint);
    }
    let client = builder.build()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = config.environment.as_str(),
        username = config.username.as_str(),
        endpoint = client.endpoint(),
        "starting sms gateway"
    );

    let endpoint = client.endpoint().to_owned();
    let state = Arc::new(AppState::new(&config, Arc::new(client), endpoint));
    let listener = TcpListener::bind(config.listen_addr()).await?;
    server::serve(listener, state).await?;

    info!("sms gateway stopped");
    Ok(())
}
