//! 服务入口
use aulachat::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    aulachat::server::run(config).await
}
