use outreach_api::setup;
use outreach_core::{PolicyTable, ServerConfig};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = ServerConfig::from_env()?;
    let policy = PolicyTable::from_env()?;

    let (_state, router) = setup::initialize_app(config.clone(), policy).await?;

    setup::server::start_server(&config, router).await?;

    Ok(())
}
