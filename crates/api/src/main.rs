use plantops_infra::config::PlantConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = PlantConfig::from_env()?;
    plantops_observability::init(config.log_format);

    let app = plantops_api::app::build_app(&config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "plantops api listening");

    axum::serve(listener, app).await?;
    Ok(())
}
