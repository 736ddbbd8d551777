mod config;
use clap::{Parser, Subcommand, ValueEnum};
use crate::config::Config;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tessera_core::{
    BlobId, ClusterMap, Coordinator, CoordinatorError, HttpTransport, JsonWireCodec,
    OperationContext, Payload, PayloadKind, RequestMetrics, Result, TesseraError,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Replica-aware blob reads against a partitioned blob store")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load both layouts and run every cluster map check
    Validate {
        /// Path to configuration file
        #[arg(long = "conf", default_value = "config.yaml")]
        conf: String,
    },
    /// Rewrite the layouts in canonical form
    Layout {
        /// Path to configuration file
        #[arg(long = "conf", default_value = "config.yaml")]
        conf: String,

        /// Directory receiving hardware.json and partitions.json
        #[arg(long)]
        output_dir: PathBuf,
    },
    /// Read one blob from its replicas
    Get {
        /// Path to configuration file
        #[arg(long = "conf", default_value = "config.yaml")]
        conf: String,

        /// Blob id in <partition>.<id> form
        #[arg(long)]
        blob_id: String,

        #[arg(long, value_enum, default_value_t = KindArg::Properties)]
        kind: KindArg,

        /// Write binary content here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Properties,
    UserMetadata,
    Data,
    All,
}

impl From<KindArg> for PayloadKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Properties => PayloadKind::BlobProperties,
            KindArg::UserMetadata => PayloadKind::UserMetadata,
            KindArg::Data => PayloadKind::BlobData,
            KindArg::All => PayloadKind::All,
        }
    }
}

fn load_config(path: &str) -> Config {
    match Config::from_file(path) {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("Failed to load config: {}", error);
            std::process::exit(1);
        }
    }
}

fn run_validate(config: &Config) -> Result<()> {
    let map = config.load_cluster_map()?;
    let nodes: Vec<_> = map.data_nodes().collect();
    let down = nodes.iter().filter(|node| map.is_node_down(node)).count();

    println!(
        "cluster {}: datacenters={} nodes={} down={} partitions={} capacity={}",
        map.cluster_name(),
        map.datacenters().len(),
        nodes.len(),
        down,
        map.partitions().count(),
        map.raw_capacity_in_bytes()
    );
    Ok(())
}

fn run_layout(config: &Config, output_dir: &Path) -> Result<()> {
    let map = config.load_cluster_map()?;
    std::fs::create_dir_all(output_dir)?;

    let hardware_path = output_dir.join("hardware.json");
    let partition_path = output_dir.join("partitions.json");
    map.to_hardware_layout().write_to_file(&hardware_path)?;
    map.to_partition_layout().write_to_file(&partition_path)?;

    tracing::info!(
        "wrote canonical layouts for {} to {}",
        map.cluster_name(),
        output_dir.display()
    );
    Ok(())
}

async fn run_get(
    config: &Config,
    blob_id: &str,
    kind: PayloadKind,
    output: Option<&Path>,
) -> Result<()> {
    let blob_id: BlobId = blob_id
        .parse()
        .map_err(|error: TesseraError| CoordinatorError::InvalidBlobId(error.to_string()))?;

    let map = Arc::new(config.load_cluster_map()?);
    let transport = Arc::new(HttpTransport::new(config.connect_timeout())?);
    let metrics = Arc::new(RequestMetrics::new());
    let context = OperationContext::new(
        config.operation.clone(),
        config.client_id.clone(),
        map,
        transport,
        Arc::new(JsonWireCodec),
        metrics.clone(),
    )?;
    let coordinator = Coordinator::new(Arc::new(context));

    tracing::info!("get {} for {}", kind, blob_id);
    let result = coordinator.get(blob_id, kind).await;

    for (node, kind, stats) in metrics.snapshot() {
        tracing::debug!(
            "request stats: node={} kind={} requests={} completed={} max_latency={:?}",
            node,
            kind,
            stats.requests,
            stats.completed,
            stats.max_latency
        );
    }

    match result? {
        Payload::Properties(properties) => {
            println!("{}", serde_json::to_string_pretty(&properties)?);
        }
        Payload::UserMetadata(metadata) => write_content(&metadata, output)?,
        Payload::Data(data) => write_content(&data.content, output)?,
        Payload::All(info) => {
            println!("{}", serde_json::to_string_pretty(&info.properties)?);
            tracing::info!("user metadata: {} bytes", info.user_metadata.len());
            write_content(&info.data.content, output)?;
        }
    }
    Ok(())
}

fn write_content(content: &[u8], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)?;
            tracing::info!("wrote {} bytes to {}", content.len(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tessera=info,tessera_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { conf } => run_validate(&load_config(&conf)),
        Commands::Layout { conf, output_dir } => run_layout(&load_config(&conf), &output_dir),
        Commands::Get {
            conf,
            blob_id,
            kind,
            output,
        } => run_get(&load_config(&conf), &blob_id, kind.into(), output.as_deref()).await,
    };

    if let Err(error) = result {
        tracing::error!("{}", error);
        std::process::exit(1);
    }
}
