//! ttl_memo demo
//!
//! Registers a cache module from the environment, memoizes the methods of a
//! small service and logs what the cache did. With a purge interval
//! configured it keeps running until Ctrl+C or SIGTERM.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_memo::cache::Ttl;
use ttl_memo::memo::{
    with_cache, with_cache_async, CacheArgumentOptions, Cached, CachedAsync, CachedAsyncOptions,
    CachedOptions,
};
use ttl_memo::module::{Cacheable, TtlCacheModule};
use ttl_memo::Config;

/// Exchange rates from a slow upstream.
struct RateService {
    upstream_calls: Arc<AtomicU64>,
    rate: CachedAsync<String, f64, String>,
    symbol: Cached<String, String>,
}

impl Cacheable for RateService {
    const ISOLATED: bool = true;
}

impl RateService {
    fn new(module: &TtlCacheModule) -> Self {
        let binding = module.bind::<Self>();
        let upstream_calls = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&upstream_calls);
        let rate = with_cache_async(
            &binding,
            "rate",
            CachedAsyncOptions::hashed(|pair: &String| pair.clone())
                .ttl(Ttl::Millis(5_000))
                .use_argument_options(true),
            move |pair: String| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    quote(&pair)
                }
            },
        );

        let symbol = with_cache(
            &binding,
            "symbol",
            CachedOptions::hashed(|code: &String| code.clone()).use_shared_cache(true),
            |code: &String| currency_symbol(code).to_string(),
        );

        Self {
            upstream_calls,
            rate,
            symbol,
        }
    }

    fn upstream_calls(&self) -> u64 {
        self.upstream_calls.load(Ordering::SeqCst)
    }
}

fn quote(pair: &str) -> Result<f64, String> {
    match pair {
        "EUR/USD" => Ok(1.08),
        "GBP/USD" => Ok(1.27),
        "USD/JPY" => Ok(149.5),
        other => Err(format!("no quote for {other}")),
    }
}

fn currency_symbol(code: &str) -> &'static str {
    match code {
        "EUR" => "€",
        "GBP" => "£",
        "USD" | "CAD" | "AUD" => "$",
        "JPY" => "¥",
        _ => "?",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" for this crate, can be overridden with RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_memo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ttl_memo demo");

    let config = Config::from_env();
    info!(
        max_entries = ?config.max_entries,
        default_ttl = %config.default_ttl,
        is_global = config.is_global,
        purge_interval = ?config.purge_interval,
        "Configuration loaded"
    );

    let module = TtlCacheModule::register(config.module_options())
        .context("Failed to register the cache module")?;
    let purge = config
        .purge_interval
        .map(|interval| module.spawn_purge_task(interval));

    let first = RateService::new(&module);
    let second = RateService::new(&module);

    // Concurrent lookups of one pair share a single upstream call
    let pair = || "EUR/USD".to_string();
    let (a, b, c) = tokio::join!(
        first.rate.call(pair()),
        first.rate.call(pair()),
        first.rate.call(pair())
    );
    for rate in [a, b, c] {
        rate.map_err(anyhow::Error::msg)?;
    }
    info!(upstream_calls = first.upstream_calls(), "Three concurrent lookups done");

    // Isolated instances do not see each other's entries
    let rate = second.rate.call(pair()).await.map_err(anyhow::Error::msg)?;
    info!(
        rate,
        upstream_calls = second.upstream_calls(),
        "Second instance looked up its own rate"
    );

    // Failures are never cached
    for _ in 0..2 {
        if let Err(error) = first.rate.call("XAU/BTC".to_string()).await {
            warn!(%error, "Lookup failed");
        }
    }

    let refreshed = first
        .rate
        .call_with(pair(), Some(CacheArgumentOptions::new().ignore_cached(true)))
        .await
        .map_err(anyhow::Error::msg)?;
    info!(
        rate = refreshed,
        upstream_calls = first.upstream_calls(),
        "Forced refresh"
    );

    // Symbols are shared across instances
    info!(symbol = %first.symbol.call("EUR".to_string()), "Symbol from first instance");
    info!(symbol = %second.symbol.call("EUR".to_string()), "Symbol from second instance");

    let stats = module.cache().stats();
    info!(
        stats = %serde_json::to_string(&stats)?,
        hit_rate = stats.hit_rate(),
        "Cache statistics"
    );

    if let Some(purge) = purge {
        info!("Purge task running, press Ctrl+C to stop");
        shutdown_signal().await?;
        purge.abort();
        warn!("Purge task aborted");
    }

    info!("Demo complete");
    Ok(())
}

/// Waits for Ctrl+C or SIGTERM.
#[cfg(unix)]
async fn shutdown_signal() -> anyhow::Result<()> {
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
        .context("Failed to install SIGTERM handler")?;

    tokio::select! {
        result = signal::ctrl_c() => {
            result.context("Failed to install Ctrl+C handler")?;
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate.recv() => {
            info!("Received SIGTERM, shutting down");
        }
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> anyhow::Result<()> {
    signal::ctrl_c()
        .await
        .context("Failed to install Ctrl+C handler")?;
    info!("Received Ctrl+C, shutting down");
    Ok(())
}
