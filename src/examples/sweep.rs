//! Load a proxy list, run one health sweep and print the pool status.
//!
//! Usage: cargo run --example sweep -- proxies.txt

use search_relay::{PoolConfig, ProxyPool, Registry};
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "proxies.txt".to_string());
    let registry = Registry::from_file(&path)?;

    let config = PoolConfig::builder()
        .probe_url("https://httpbin.org/ip")
        .probe_timeout(Duration::from_secs(5))
        .build();
    let pool = ProxyPool::new(registry, config);

    println!("Probing proxies...");
    let summary = pool.run_health_sweep().await;
    println!("{} alive, {} dead", summary.alive, summary.dead);

    for proxy in pool.list_status() {
        let state = if proxy.alive { "Alive" } else { "Dead" };
        println!("{} - {} - {}ms", proxy.address, state, proxy.last_latency_ms);
    }

    match pool.search("rust proxy pool").await {
        Ok(body) => println!("Search relayed {} bytes", body.len()),
        Err(e) => println!("Search failed: {}", e),
    }

    Ok(())
}
