//! Main binary for the gpuhud telemetry server

use clap::Parser;
use hud_core::spawn_sampler;
use hud_gpu::GpuSampler;
use hud_ollama::OllamaSampler;
use hud_server::{init_logging, AppState, Result, ServerConfig, ServerError};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "gpuhud")]
#[command(about = "GPU and Ollama telemetry over REST and WebSocket")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Address to listen on (overrides GPUHUD_BIND)
    #[arg(long, value_name = "ADDR")]
    bind: Option<SocketAddr>,

    /// Ollama endpoint (overrides OLLAMA_HOST)
    #[arg(long, value_name = "URL")]
    ollama_host: Option<String>,

    /// GPU polling interval in seconds
    #[arg(long, value_name = "SECS")]
    gpu_interval: Option<u64>,

    /// Ollama polling interval in seconds
    #[arg(long, value_name = "SECS")]
    ollama_interval: Option<u64>,

    /// Log level
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: String,

    /// Log format (text or json)
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ServerConfig::from_env();
    config.logging.level = cli.log_level;
    config.logging.format = cli.log_format;

    if let Some(bind) = cli.bind {
        config.bind_addr = bind;
    }
    if let Some(host) = cli.ollama_host {
        config.ollama = config
            .ollama
            .with_endpoint(&host)
            .map_err(|e| ServerError::Config(format!("invalid Ollama endpoint: {}", e)))?;
    }
    if let Some(secs) = cli.gpu_interval {
        config.gpu = config.gpu.with_polling_interval(Duration::from_secs(secs));
    }
    if let Some(secs) = cli.ollama_interval {
        config.ollama = config
            .ollama
            .with_polling_interval(Duration::from_secs(secs));
    }

    init_logging(&config.logging)?;
    config.validate().map_err(ServerError::Config)?;

    let gpu = Arc::new(GpuSampler::new(config.gpu.clone())?);
    let ollama = Arc::new(OllamaSampler::new(config.ollama.clone())?);

    let gpu_loop = spawn_sampler(Arc::clone(&gpu), gpu.polling_interval());
    let ollama_loop = spawn_sampler(Arc::clone(&ollama), ollama.polling_interval());

    let state = AppState {
        gpu,
        ollama,
        stream_interval: config.stream_interval,
    };

    let listener = TcpListener::bind(config.bind_addr).await?;
    hud_server::serve(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
    })
    .await?;

    info!("stopping samplers");
    gpu_loop.stop().await;
    ollama_loop.stop().await;

    Ok(())
}
