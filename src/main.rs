use clap::Parser;
use futures::future::join_all;
use nerlog::config::{load_config, resolve_config_path, Config};
use nerlog::event::{EntityMention, EventBuilder};
use nerlog::shipper::{EventShipper, StreamTarget};
use nerlog::trace::RandomTraceSource;
use nerlog::transport::{HttpTransport, InMemoryTransport, LogTransport};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "nerlog")]
#[command(about = "Entity extraction telemetry shipper", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Number of concurrent worker tasks
    #[arg(long, default_value_t = 10)]
    workers: usize,

    /// Build all events first and send them as one batch
    #[arg(long)]
    batch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nerlog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = match resolve_config_path(cli.config.as_deref()) {
        Some(path) => {
            info!(path = %path.display(), "Loading config");
            load_config(&path)?
        }
        None => Config::default(),
    };

    // In-memory store unless a remote endpoint is configured
    let (transport, memory): (Arc<dyn LogTransport>, Option<Arc<InMemoryTransport>>) =
        match &config.logs.endpoint {
            Some(endpoint) => {
                info!(endpoint = %endpoint, region = %config.logs.region, "Using HTTP log transport");
                (
                    Arc::new(HttpTransport::new(endpoint, config.logs.request_timeout)?),
                    None,
                )
            }
            None => {
                info!("No endpoint configured, using in-memory log transport");
                let store = Arc::new(InMemoryTransport::new());
                (Arc::clone(&store) as Arc<dyn LogTransport>, Some(store))
            }
        };

    let target = StreamTarget {
        group: config.logs.log_group.clone(),
        stream: config.logs.log_stream.clone(),
    };
    let shipper = Arc::new(EventShipper::with_limits(
        transport,
        target.clone(),
        config.logs.max_attempts,
        config.logs.request_timeout,
    ));
    shipper.ensure_stream_exists().await?;

    let builder = Arc::new(EventBuilder::new(&config, Arc::new(RandomTraceSource)));

    let failed = if cli.batch {
        send_one_batch(&builder, &shipper, cli.workers).await
    } else {
        spawn_workers(builder, Arc::clone(&shipper), cli.workers).await
    };

    if let Some(store) = memory {
        info!(
            stored = store.event_count(&target.group, &target.stream).await,
            "In-memory log store contents"
        );
    }

    if failed > 0 {
        error!(workers = cli.workers, failed = failed, "Some events were not delivered");
        std::process::exit(1);
    }

    info!(workers = cli.workers, "All events sent");
    Ok(())
}

/// One task per worker, each building and sending a single event.
async fn spawn_workers(
    builder: Arc<EventBuilder>,
    shipper: Arc<EventShipper>,
    workers: usize,
) -> usize {
    let handles: Vec<_> = (0..workers)
        .map(|i| {
            let builder = Arc::clone(&builder);
            let shipper = Arc::clone(&shipper);
            tokio::spawn(async move { run_worker(&builder, &shipper, i).await })
        })
        .collect();

    join_all(handles)
        .await
        .into_iter()
        .filter(|result| !matches!(result, Ok(true)))
        .count()
}

async fn run_worker(builder: &EventBuilder, shipper: &EventShipper, worker_id: usize) -> bool {
    let event = match builder.build(
        vec![EntityMention::new(
            "PERSON",
            format!("User {}", worker_id),
            0.91,
        )],
        vec![],
        &format!("https://example.com/{}", worker_id),
    ) {
        Ok(event) => event,
        Err(e) => {
            error!(worker_id = worker_id, error = %e, "Failed to build event");
            return false;
        }
    };

    match shipper.send_event(&event).await {
        Ok(()) => true,
        Err(e) => {
            error!(worker_id = worker_id, error = %e, "Failed to send event");
            false
        }
    }
}

/// Build every event up front and deliver them in a single put.
async fn send_one_batch(builder: &EventBuilder, shipper: &EventShipper, count: usize) -> usize {
    let mut events = Vec::with_capacity(count);
    for i in 0..count {
        match builder.build(
            vec![EntityMention::new("PERSON", format!("User {}", i), 0.91)],
            vec![],
            &format!("https://example.com/{}", i),
        ) {
            Ok(event) => events.push(event),
            Err(e) => {
                error!(worker_id = i, error = %e, "Failed to build event");
                return count;
            }
        }
    }

    match shipper.send(&events).await {
        Ok(()) => 0,
        Err(e) => {
            error!(events = events.len(), error = %e, "Failed to send batch");
            count
        }
    }
}
