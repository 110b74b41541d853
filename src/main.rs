use std::sync::Arc;

use beatws::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Arc::new(Config::load()?);
    simple_logger::init_with_level(config.log.level.as_level())?;

    if config.max_clients == 0 {
        log::warn!("max-clients is 0, every client will be turned away");
    }

    beatws::startup(config).await?;
    Ok(())
}
