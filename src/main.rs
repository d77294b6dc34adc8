use search_relay::server::{self, AppState};
use search_relay::{PoolConfig, ProxyPool, Registry, ServerConfig};

use anyhow::Context;
use log::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the process environment still applies.
    let dotenv = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let config = ServerConfig::from_env()?;
    let registry = Registry::from_file(&config.proxy_list)
        .with_context(|| format!("loading {}", config.proxy_list.display()))?;

    let pool = ProxyPool::new(registry, PoolConfig::default());
    let sweeper = pool.spawn_health_task();

    let (total, _) = pool.get_stats();
    info!("Proxy pool initialized with {} proxies", total);
    if config.admin_password.is_none() {
        info!("ADMIN_PASSWORD not set, admin view is disabled");
    }

    let state = AppState::new(pool, config.admin_password.clone());
    let router = server::router(state, &config.static_dir);
    server::serve(&config.bind_address(), router).await?;

    sweeper.abort();
    Ok(())
}
