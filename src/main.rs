use pm_ingest::app::run;
use pm_ingest::config::Config;
use pm_ingest::error::Result;
use pm_ingest::logging::init;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    init(&config.log_level);

    let summary = run(config).await?;
    println!("{}", summary);

    Ok(())
}
