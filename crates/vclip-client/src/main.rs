//! Job progress tracking binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vclip_client::{
    run_until_settled, select_video, ClientConfig, ClientError, ClientResult, TrackArgs, TrackOutcome,
};
use vclip_media::{BlobUrlRegistry, VideoResourceStore};
use vclip_progress::{ProgressTracker, SseSource};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = ClientConfig::from_env();

    // Initialize tracing with colored output for dev, JSON for production
    let env_filter = EnvFilter::from_default_env()
        .add_directive("vclip=info".parse().unwrap());

    if config.json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    let args = match TrackArgs::parse(std::env::args().skip(1)) {
        Ok(a) => a,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };

    info!("Client config: {:?}", config);

    match run(config, args).await {
        Ok(outcome) => {
            info!("Tracking finished: {:?}", outcome);
            std::process::exit(outcome.exit_code());
        }
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    }
}

async fn run(config: ClientConfig, args: TrackArgs) -> ClientResult<TrackOutcome> {
    if let Some(port) = config.metrics_port {
        install_metrics(port)?;
    }

    let store = VideoResourceStore::new(BlobUrlRegistry::new(config.blob_origin.clone()));

    if let Some(path) = &args.video {
        let resource = select_video(&store, path).await?;
        info!(
            "Selected {} at {}",
            path.display(),
            resource.url.unwrap_or_default()
        );
    }

    let source = SseSource::new(config.progress)?;

    info!("Tracking job {}", args.job_id);
    let mut tracker = ProgressTracker::with_job(Arc::new(source), Some(args.job_id));

    let outcome = run_until_settled(&mut tracker, async {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
    })
    .await;

    store.clear_video();
    Ok(outcome)
}

fn install_metrics(port: u16) -> ClientResult<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .map_err(|e| ClientError::Metrics(e.to_string()))?;

    info!("Metrics exporter listening on port {}", port);
    Ok(())
}
