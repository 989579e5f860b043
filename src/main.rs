use anyhow::Context;
use clap::Parser;
use tracing::info;

use tenzir_exporter::config::Config;
use tenzir_exporter::push::PushClient;
use tenzir_exporter::server::{start_server, AppState};
use tenzir_exporter::{logging, telemetry};

#[derive(Parser)]
#[command(name = "tenzir_exporter")]
#[command(about = "Prometheus Pushgateway exporter for Tenzir node telemetry")]
#[command(version = "0.1.0")]
struct Cli {
    /// Port to listen on for posted telemetry batches
    #[arg(long)]
    port: Option<u16>,

    /// Base URL of the Pushgateway (e.g. http://localhost:9091)
    #[arg(long)]
    pushgateway_url: Option<String>,

    /// Job name the snapshot is pushed under
    #[arg(long)]
    job: Option<String>,

    /// Optional instance grouping for the push
    #[arg(long)]
    instance: Option<String>,

    /// Path to an alternative config.toml
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_logging();
    telemetry::init_telemetry();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path).context("loading config file")?,
        None => Config::load().context("loading configuration")?,
    };
    if let Some(port) = cli.port {
        config.listen_port = port;
    }
    if let Some(url) = cli.pushgateway_url {
        config.pushgateway.url = Some(url);
    }
    if let Some(job) = cli.job {
        config.pushgateway.job = job;
    }
    if let Some(instance) = cli.instance {
        config.pushgateway.instance = Some(instance);
    }

    let push = config.pushgateway.url.as_ref().map(|url| {
        info!(
            "Pushing snapshots to {} as job '{}'",
            url, config.pushgateway.job
        );
        PushClient::new(url, &config.pushgateway.job, config.pushgateway.instance.clone())
    });
    if push.is_none() {
        info!("No Pushgateway configured; snapshots served at /metrics only");
    }

    let state = AppState::new(push);
    start_server(state, config.listen_port)
        .await
        .context("HTTP server failed")?;

    Ok(())
}
