use anyhow::{Context, Result};
use clap::Parser;
use futures_util::FutureExt;
use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;
use wakecast_audio::{CaptureStream, DeviceManager};
use wakecast_core::AppConfig;
use wakecast_engine::EngineRegistry;
use wakecast_router::Supervisor;

#[derive(Parser)]
#[command(name = "wakecast", about = "Wake phrase detector with WebSocket notifications")]
struct Cli {
    /// Optional TOML configuration file; environment variables override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// List input devices and exit
    #[arg(long)]
    list_devices: bool,
}

fn init_tracing(log_level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::Registry::default().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false),
    );

    tracing::subscriber::set_global_default(subscriber).context("failed to set tracing subscriber")
}

fn list_devices() -> Result<()> {
    let devices = DeviceManager::new()
        .list_input_devices()
        .context("failed to enumerate input devices")?;
    for (name, _) in devices {
        println!("{name}");
    }
    Ok(())
}

/// Register the Ctrl-C handler now and return a future that resolves on the
/// first interrupt. Registration happens on first poll, so the returned
/// future has already been polled once and no SIGINT during startup is lost.
fn listen_for_interrupt() -> impl Future<Output = ()> {
    let mut ctrl_c = Box::pin(tokio::signal::ctrl_c());
    let early = (&mut ctrl_c).now_or_never();
    async move {
        let result = match early {
            Some(result) => result,
            None => ctrl_c.await,
        };
        match result {
            Ok(()) => tracing::info!("interrupt received"),
            Err(e) => {
                tracing::error!("failed to listen for ctrl-c: {e}");
                std::future::pending::<()>().await;
            }
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(cli.config.as_deref())
        .with_context(|| format!("failed to load configuration (file: {:?})", cli.config))
    {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::from(2);
        }
    };

    if let Err(e) = init_tracing(&config.general.log_level) {
        eprintln!("{e:#}");
        return ExitCode::from(2);
    }

    if cli.list_devices {
        return match list_devices() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!("{e:#}");
                ExitCode::from(2)
            }
        };
    }

    tracing::info!("wakecast starting");
    let interrupt = listen_for_interrupt();

    let device_name = config.audio.device_name.clone();
    let supervisor = Supervisor::new(config, EngineRegistry::new());
    let result = supervisor
        .run(
            move |sample_rate, block_size| {
                let device = DeviceManager::new().get_input_device(&device_name)?;
                tracing::info!(device = %device_name, sample_rate, block_size, "opening capture device");
                CaptureStream::open(&device, sample_rate, block_size)
            },
            interrupt,
        )
        .await;

    match result {
        Ok(()) => {
            tracing::info!("wakecast stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
