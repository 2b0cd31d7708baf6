use std::sync::Arc;

use anyhow::{anyhow, Result};
use minswap_order_rs::scanner::DEFAULT_CONCURRENCY;
use minswap_order_rs::utils::{now_millis, save_to_file};
use minswap_order_rs::{scan_orders, EncodedDatum, KupoApi, NetworkConfig, NetworkId, OrderDatum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const KUPO_URL: &str = "http://localhost:1442";
const OUT_FILE: &str = "orders.json";

struct Args {
    network: NetworkId,
    kupo: String,
    config: Option<String>,
    time: Option<i128>,
    out: String,
    concurrency: usize,
    decode: Option<String>,
}

fn print_usage(bin: &str) {
    eprintln!("Usage:");
    eprintln!(
        "  {} [--network mainnet|testnet] [--kupo URL] [--config FILE] [--time MS] [--out FILE] [--concurrency N]",
        bin
    );
    eprintln!("  {} [--network mainnet|testnet] --decode <DATUM_CBOR_HEX>", bin);
    eprintln!();
    eprintln!("  No --decode      → scan the order script and write a report to {}", OUT_FILE);
    eprintln!("  --network        → network preset (default: mainnet)");
    eprintln!("  --kupo           → Kupo URL (default: {})", KUPO_URL);
    eprintln!("  --config         → JSON network config, overrides the preset");
    eprintln!("  --time           → execution time in POSIX ms (default: now)");
    eprintln!("  --decode         → print a decoded order datum as JSON");
    eprintln!();
    eprintln!("  Log level follows RUST_LOG (default: info).");
}

fn parse_args(raw_args: &[String]) -> Result<Args> {
    let mut args = Args {
        network: NetworkId::Mainnet,
        kupo: KUPO_URL.to_string(),
        config: None,
        time: None,
        out: OUT_FILE.to_string(),
        concurrency: DEFAULT_CONCURRENCY,
        decode: None,
    };

    let mut i = 1;
    while i < raw_args.len() {
        let flag = raw_args[i].as_str();
        let value = raw_args
            .get(i + 1)
            .cloned()
            .ok_or_else(|| anyhow!("{} requires a value", flag))?;
        match flag {
            "--network" => args.network = value.parse()?,
            "--kupo" => args.kupo = value,
            "--config" => args.config = Some(value),
            "--time" => {
                args.time = Some(value.parse().map_err(|e| anyhow!("invalid --time: {}", e))?)
            }
            "--out" => args.out = value,
            "--concurrency" => {
                args.concurrency = value
                    .parse()
                    .map_err(|e| anyhow!("invalid --concurrency: {}", e))?
            }
            "--decode" => args.decode = Some(value),
            other => return Err(anyhow!("unknown argument: {}", other)),
        }
        i += 2;
    }
    Ok(args)
}

fn setup_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let raw_args: Vec<String> = std::env::args().collect();
    let bin = raw_args.first().map(String::as_str).unwrap_or("minswap-order-rs");
    let args = match parse_args(&raw_args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            print_usage(bin);
            std::process::exit(1);
        }
    };

    setup_tracing();

    let loaded;
    let config = match &args.config {
        Some(path) => {
            loaded = NetworkConfig::load(path)?;
            &loaded
        }
        None => NetworkConfig::preset(args.network),
    };

    if let Some(hex) = &args.decode {
        return decode(hex, config);
    }

    let kupo = Arc::new(KupoApi::new(&args.kupo)?);
    let now = args.time.unwrap_or_else(now_millis);
    let report = scan_orders(kupo, config, now, args.concurrency).await?;

    save_to_file(&report, &args.out)?;
    eprintln!(
        "Exported {} orders to {} (valid {}, expired {}, invalid {})",
        report.total(),
        args.out,
        report.valid.len(),
        report.expired.len(),
        report.invalid.len()
    );
    Ok(())
}

fn decode(hex: &str, config: &NetworkConfig) -> Result<()> {
    let datum = match OrderDatum::decode(&EncodedDatum::new(hex), config.network_id.id()) {
        Ok(datum) => datum,
        Err(e) => {
            println!("{}", e.to_compact_string()?);
            std::process::exit(1);
        }
    };
    if let Err(e) = datum.validate_on_chain_constraint(config) {
        tracing::warn!(error = %e, "datum violates on-chain constraints");
    }
    println!("{}", serde_json::to_string_pretty(&datum)?);
    Ok(())
}
