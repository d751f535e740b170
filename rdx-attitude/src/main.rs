use attitude::prelude::*;
use attitude::report::{render_read, render_system, render_total};
use attitude::{ENGINE_NAME, VERSION};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!(
        "{} v{} started at {}",
        ENGINE_NAME,
        VERSION,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );

    // 2. Load the configuration, falling back to the reference run.
    let config = AttitudeConfig::load().unwrap_or_else(|e| {
        warn!("{}. Using default configuration.", e);
        AttitudeConfig::default()
    });

    // 3. Create the engine.
    let engine = match AttitudeEngine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Cannot start engine: {}", e);
            return;
        }
    };

    // 4. Print what the tasks report while they run.
    let printer = spawn_event_printer(&engine);

    // 5. Run. Every failure is logged; the exit status stays zero.
    let outcome = engine.run().await;

    // Dropping the engine closes the channels, so the printer drains and ends.
    drop(engine);
    printer.await.ok();

    match outcome {
        Ok(summary) => println!("{}", render_total(summary.total_seconds())),
        Err(e) => error!("Run ended abnormally: {:#}", e),
    }
}

/// Spawns a task that prints every read and system event until the engine is dropped.
fn spawn_event_printer(engine: &AttitudeEngine) -> JoinHandle<()> {
    let mut read_rx = engine.subscribe_read_events();
    let mut system_rx = engine.subscribe_system_events();
    tokio::spawn(async move {
        let mut reads_open = true;
        let mut system_open = true;
        while reads_open || system_open {
            tokio::select! {
                event = read_rx.recv(), if reads_open => match event {
                    Ok(event) => println!("{}", render_read(&event)),
                    Err(RecvError::Lagged(missed)) => {
                        warn!("Console fell behind; {} reads not shown.", missed)
                    }
                    Err(RecvError::Closed) => reads_open = false,
                },
                event = system_rx.recv(), if system_open => match event {
                    Ok(event) => println!("{}", render_system(&event)),
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => system_open = false,
                },
            }
        }
    })
}
