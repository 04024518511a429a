use exchange_rate_sdk::{ConverterConfig, CurrencyConverter, LogPresenter, Notice};
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Usage: cargo run --example convert_once -- [AMOUNT] [FROM] [TO]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let amount = args.next().unwrap_or_else(|| "1".to_string());
    let from = args.next().unwrap_or_else(|| "USD".to_string());
    let to = args.next().unwrap_or_else(|| "BDT".to_string());

    let converter = Arc::new(CurrencyConverter::new(
        ConverterConfig::default(),
        Arc::new(LogPresenter),
    )?);

    println!("Converting {} {} -> {}", amount, from, to);
    println!("-------------------------------------------");

    converter.set_from(&from).await?;
    converter.set_to(&to).await?;
    converter.set_amount_input(amount).await;

    // 1. Network path; the selection changes above filled the cache, so drop it
    converter.engine().cache().invalidate().await;
    let start = Instant::now();
    let result = converter.submit().await;
    let network_latency = start.elapsed();

    match result {
        Some(Ok(conversion)) => {
            println!("   Result: {} {}", conversion.amount_text(), conversion.to);
            println!("   Rate:   {}", conversion.rate_line());
            println!("   Source: {}", conversion.source);
            println!("   Latency (network + parsing): {:?}", network_latency);
        }
        Some(Err(e)) => {
            eprintln!("   Error: {}", e);
            if let Some(notice) = Notice::for_result(&Err(e)) {
                eprintln!("   Notice: {}", notice.message);
            }
            return Ok(());
        }
        None => {
            eprintln!("   Another conversion was in flight");
            return Ok(());
        }
    }

    // 2. Cached path
    let start = Instant::now();
    converter.submit().await;
    println!("   Latency (cached): {:?}", start.elapsed());

    let metrics = converter.metrics().await;
    println!("-------------------------------------------");
    println!(
        "Primary {}: p50={:.1}ms success={:.0}% | cache hit rate {:.0}%",
        metrics.primary.provider_name,
        metrics.primary.latency_p50_ms,
        metrics.primary.success_rate * 100.0,
        metrics.cache_hit_rate() * 100.0
    );
    println!("Last updated: {}", converter.tick().await);

    Ok(())
}
