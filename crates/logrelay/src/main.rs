mod telemetry;

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use logrelay_buffer::RedisBuffer;
use logrelay_core::config::Config;
use logrelay_core::format::Formatter;
use logrelay_core::ids::UuidIds;
use logrelay_relay::drain::{DrainConfig, Drainer};
use logrelay_relay::http;
use logrelay_relay::kafka::KafkaBroker;
use logrelay_relay::logger::CallLogger;
use logrelay_relay::schedule::run_drain_loop;
use logrelay_relay::writer::BufferWriter;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "logrelay")]
#[command(about = "Relay buffered inter-service call records into a Kafka stream")]
struct Cli {
    #[arg(long)]
    redis_url: Option<String>,
    #[arg(long)]
    kafka_brokers: Option<String>,
    #[arg(long)]
    topic: Option<String>,
    #[arg(long)]
    buffer_key: Option<String>,
    #[arg(long)]
    batch_size: Option<usize>,
    #[arg(long, help = "Drain period, e.g. 10s")]
    drain_interval: Option<String>,
    #[arg(long)]
    http_addr: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let cli = Cli::parse();
    let mut cfg = Config::load().context("failed to load configuration")?;
    apply_cli_overrides(&mut cfg, cli)?;

    let store = RedisBuffer::connect(&cfg.redis_url)
        .await
        .context("failed to connect to the holding buffer")?;
    let broker = KafkaBroker::new(&cfg.kafka_brokers, cfg.publish_timeout)
        .context("failed to create the stream broker")?;

    let writer = BufferWriter::new(store.clone(), &cfg.buffer_key, cfg.buffer_ttl);
    let logger = CallLogger::spawn(writer, Formatter::new(UuidIds), cfg.channel_capacity);
    let drainer = Drainer::new(
        store,
        broker,
        DrainConfig {
            buffer_key: cfg.buffer_key.clone(),
            topic: cfg.topic.clone(),
            batch_size: cfg.batch_size,
        },
    );
    let drain_task = tokio::spawn(run_drain_loop(drainer, cfg.drain_interval));

    let addr: SocketAddr = cfg
        .http_addr
        .parse()
        .with_context(|| format!("invalid http_addr: {}", cfg.http_addr))?;
    info!(
        %addr,
        topic = %cfg.topic,
        buffer_key = %cfg.buffer_key,
        batch_size = cfg.batch_size,
        "logrelay started"
    );

    tokio::select! {
        res = http::serve(addr, logger.clone()) => {
            res.context("ingest server failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested; publishes still in flight are best-effort");
        }
    }

    drain_task.abort();
    Ok(())
}

fn apply_cli_overrides(cfg: &mut Config, cli: Cli) -> anyhow::Result<()> {
    if let Some(v) = cli.redis_url {
        cfg.redis_url = v;
    }
    if let Some(v) = cli.kafka_brokers {
        cfg.kafka_brokers = v;
    }
    if let Some(v) = cli.topic {
        cfg.topic = v;
    }
    if let Some(v) = cli.buffer_key {
        cfg.buffer_key = v;
    }
    if let Some(v) = cli.batch_size {
        anyhow::ensure!(v > 0, "--batch-size must be at least 1");
        cfg.batch_size = v;
    }
    if let Some(v) = cli.drain_interval {
        cfg.drain_interval = humantime::parse_duration(&v)
            .with_context(|| format!("invalid --drain-interval: {v}"))?;
    }
    if let Some(v) = cli.http_addr {
        cfg.http_addr = v;
    }
    Ok(())
}
