use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rptph::api::{create_router, AppState};
use rptph::config::{AcquireArgs, Cli, Command, ServeArgs};
use rptph::store::{connect_with_retry, RedisStore, Store};
use rptph::{Acquisition, Bme280, RppalBus};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Command::Acquire(args) => {
            // Reset and configuration block on the bus, so they run before the
            // runtime starts. Later reads block too; the bus belongs to this
            // one session, so they get a dedicated current-thread runtime.
            let sensor = open_sensor(&args)?;
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?
                .block_on(acquire(&cli.redis_url, args, sensor))
        }
        Command::Serve(args) => tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?
            .block_on(serve(&cli.redis_url, args)),
    }
}

fn open_sensor(args: &AcquireArgs) -> anyhow::Result<Bme280<RppalBus>> {
    info!(
        "Initializing BME280 on bus {} at address {:#04x}",
        args.i2c_bus, args.i2c_address
    );
    let bus = RppalBus::new(args.i2c_bus).context("failed to open I2C bus")?;
    Bme280::new(bus, args.i2c_address).context("failed to initialize BME280")
}

async fn acquire(
    redis_url: &str,
    args: AcquireArgs,
    sensor: Bme280<RppalBus>,
) -> anyhow::Result<()> {
    let store = connect_with_retry(
        || RedisStore::connect(redis_url),
        args.connect_retries,
        args.connect_delay(),
    )
    .await
    .context("failed to connect to store")?;

    let acquisition = Acquisition::new(sensor, store, args.sampler(), args.validator());
    let fatal = acquisition.run().await;
    Err(fatal).context("acquisition stopped")
}

async fn serve(redis_url: &str, args: ServeArgs) -> anyhow::Result<()> {
    let store: Arc<dyn Store> = Arc::new(RedisStore::open(redis_url)?);
    let app = create_router(AppState::new(store.clone()));

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    info!("Serving sensor data API on http://{}", args.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
