//! Tumorscan - HTTP inference service for tumor image classification

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tumorscan_infer::metrics::{Metrics, MetricsServer};
use tumorscan_infer::{classify, preprocess, LabelSet, Model, OnnxModel};
use tumorscan_server::api::{self, AppState};
use tumorscan_server::config::Config;

#[derive(Parser)]
#[command(name = "tumorscan")]
#[command(version = "0.1.0")]
#[command(about = "HTTP inference service for tumor image classification", long_about = None)]
struct Cli {
    /// Path to configuration file (YAML or TOML)
    #[arg(short, long, global = true, env = "TUMORSCAN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP inference server
    Serve {
        /// Server port
        #[arg(short, long)]
        port: Option<u16>,

        /// Bind address (default: 127.0.0.1 for security)
        #[arg(long)]
        bind: Option<String>,

        /// Path to the trained ONNX model artifact
        #[arg(short, long, env = "TUMORSCAN_MODEL")]
        model: Option<PathBuf>,

        /// Path to the class names JSON file
        #[arg(short, long, env = "TUMORSCAN_LABELS")]
        labels: Option<PathBuf>,

        /// Enable Prometheus metrics endpoint
        #[arg(long)]
        metrics: bool,

        /// Metrics endpoint port
        #[arg(long)]
        metrics_port: Option<u16>,

        /// Maximum accepted upload size in bytes
        #[arg(long)]
        max_upload_bytes: Option<u64>,
    },

    /// Classify a single local image file and print the result
    Predict {
        /// Path to the image file
        #[arg(short, long)]
        image: PathBuf,

        /// Path to the trained ONNX model artifact
        #[arg(short, long, env = "TUMORSCAN_MODEL")]
        model: Option<PathBuf>,

        /// Path to the class names JSON file
        #[arg(short, long, env = "TUMORSCAN_LABELS")]
        labels: Option<PathBuf>,
    },

    /// Generate example configuration file
    ConfigGen {
        /// Output format (yaml, toml)
        #[arg(short, long, default_value = "yaml")]
        format: String,

        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => Config::load(path).map_err(|e| anyhow::anyhow!("{}", e))?,
        None => Config::default(),
    };

    // Initialize logging
    let level = config.logging.level.parse().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Serve {
            port,
            bind,
            model,
            labels,
            metrics,
            metrics_port,
            max_upload_bytes,
        } => {
            // CLI flags override the config file
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            if metrics {
                config.server.metrics_enabled = true;
            }
            if let Some(metrics_port) = metrics_port {
                config.server.metrics_port = metrics_port;
            }
            if let Some(max) = max_upload_bytes {
                config.server.max_upload_bytes = max;
            }
            if let Some(model) = model {
                config.model.model_file = model;
            }
            if let Some(labels) = labels {
                config.model.labels_file = labels;
            }

            run_server(config).await?;
        }

        Commands::Predict {
            image,
            model,
            labels,
        } => {
            if let Some(model) = model {
                config.model.model_file = model;
            }
            if let Some(labels) = labels {
                config.model.labels_file = labels;
            }

            run_predict(&config, &image)?;
        }

        Commands::ConfigGen { format, output } => {
            let content = match format.to_lowercase().as_str() {
                "yaml" | "yml" => Config::example_yaml(),
                "toml" => Config::example_toml(),
                _ => anyhow::bail!("Unsupported format: {}. Use 'yaml' or 'toml'", format),
            };

            if let Some(path) = output {
                std::fs::write(&path, &content)?;
                println!("Configuration written to: {}", path.display());
            } else {
                println!("{}", content);
            }
        }
    }

    Ok(())
}

/// Load the model and label artifacts once; both live for the process
/// lifetime and are never reloaded per request.
fn load_artifacts(config: &Config) -> Result<(Box<dyn Model>, LabelSet)> {
    let model = OnnxModel::load(&config.model.model_file).map_err(|e| anyhow::anyhow!("{}", e))?;
    info!("Loaded model from {}", config.model.model_file.display());

    let labels =
        LabelSet::load(&config.model.labels_file).map_err(|e| anyhow::anyhow!("{}", e))?;
    info!(
        "Loaded {} class labels from {}",
        labels.len(),
        config.model.labels_file.display()
    );

    Ok((Box::new(model), labels))
}

async fn run_server(config: Config) -> Result<()> {
    let (model, labels) = load_artifacts(&config)?;

    println!("Tumorscan Server");
    println!("================");
    println!(
        "Predict:  http://{}:{}/api/check-tumor",
        config.server.bind, config.server.port
    );
    println!(
        "Health:   http://{}:{}/health",
        config.server.bind, config.server.port
    );
    if config.server.metrics_enabled {
        println!(
            "Metrics:  http://{}:{}/metrics",
            config.server.bind, config.server.metrics_port
        );
    }
    println!();

    // Create metrics if enabled
    let metrics = config.server.metrics_enabled.then(|| {
        let metrics = Metrics::new();
        let server = MetricsServer::new(
            metrics.clone(),
            format!("{}:{}", config.server.bind, config.server.metrics_port),
        );
        tokio::spawn(async move {
            if let Err(e) = server.run().await {
                tracing::error!("Metrics server error: {}", e);
            }
        });
        metrics
    });

    let state = Arc::new(AppState {
        model,
        labels,
        metrics,
        started: Instant::now(),
    });

    let bind_addr: std::net::IpAddr = config
        .server
        .bind
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid bind address: {}", config.server.bind))?;

    let routes = api::routes(state, config.server.max_upload_bytes);

    info!(
        "Listening on {}:{}",
        config.server.bind, config.server.port
    );
    warp::serve(routes).run((bind_addr, config.server.port)).await;

    Ok(())
}

fn run_predict(config: &Config, image_path: &Path) -> Result<()> {
    let (model, labels) = load_artifacts(config)?;

    let bytes = std::fs::read(image_path)?;
    let tensor = preprocess(&bytes).map_err(|e| anyhow::anyhow!("{}", e))?;
    let prediction =
        classify(model.as_ref(), &labels, &tensor).map_err(|e| anyhow::anyhow!("{}", e))?;

    println!("{}", prediction.display());
    Ok(())
}
