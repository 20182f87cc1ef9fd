use chrono::Local;
use tokio::sync::broadcast;

use glimpse_core::Config;
use glimpse_detector::TriggerDetector;

use crate::capture::{CaptureInvoker, CaptureOutcome};
use crate::debounce::DebounceGate;
use crate::error::{io_err, DaemonError};
use crate::event_loop::EventLoop;
use crate::ownership::Ownership;
use crate::source::CommandLogSource;
use crate::store::ArtifactStore;

/// Output format for the daemon's own log records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Start the daemon and block the current thread until it exits.
///
/// Returns `Ok` only on a signal-initiated shutdown; stream loss and setup
/// failures come back as errors so the process exits non-zero.
pub fn start_blocking(config: Config, format: LogFormat) -> Result<(), DaemonError> {
    init_tracing(format);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config))
}

/// Run the daemon: resolve identity, prepare the artifact directory, follow
/// the log source, and stop on SIGINT/SIGTERM.
pub async fn run(config: Config) -> Result<(), DaemonError> {
    let owner = Ownership::resolve(&config.owner)?;
    let store = ArtifactStore::from_config(&config.artifacts, owner);
    store.ensure_directory()?;

    let detector = TriggerDetector::new(config.trigger.clone())?;
    let invoker = CaptureInvoker::from_config(&config.capture)?;
    let gate = DebounceGate::new(config.debounce_window());
    let source = CommandLogSource::spawn(&config.log_source.command)?;

    let (shutdown_tx, _) = broadcast::channel::<()>(4);
    let loop_shutdown = shutdown_tx.subscribe();

    let signal_handle = tokio::spawn(signal_task(shutdown_tx.clone(), shutdown_tx.subscribe()));

    let mut event_loop = EventLoop::new(source, detector, gate, invoker, store);
    let loop_result = event_loop.run(loop_shutdown).await;
    let _ = shutdown_tx.send(());

    let signal_result = handle_join("signal_handler", signal_handle.await);
    let stats = loop_result?;
    signal_result?;

    tracing::info!(
        lines = stats.lines,
        triggers = stats.triggers,
        suppressed = stats.suppressed,
        captured = stats.captured,
        failed = stats.failed,
        "daemon stopped",
    );
    Ok(())
}

/// One manual capture through the daemon's invoker and finalization path,
/// bypassing the trigger and debounce stages.
pub async fn capture_once(config: &Config) -> Result<CaptureOutcome, DaemonError> {
    let owner = Ownership::resolve(&config.owner)?;
    let store = ArtifactStore::from_config(&config.artifacts, owner);
    store.ensure_directory()?;

    let invoker = CaptureInvoker::from_config(&config.capture)?;
    let path = store.next_artifact_path(&Local::now());
    let outcome = invoker.capture(&path).await;
    if outcome.is_success() {
        store.finalize(&path)?;
    } else {
        store.discard_partial(&path);
    }
    Ok(outcome)
}

async fn signal_task(
    shutdown: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())
        .map_err(|err| DaemonError::Runtime(format!("SIGTERM handler failed: {err}")))?;

    tokio::select! {
        _ = shutdown_rx.recv() => Ok(()),
        _ = terminate.recv() => {
            tracing::info!("received SIGTERM, shutting down daemon");
            let _ = shutdown.send(());
            Ok(())
        }
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => {
                    tracing::info!("received ctrl-c, shutting down daemon");
                    let _ = shutdown.send(());
                    Ok(())
                }
                Err(err) => Err(DaemonError::Runtime(format!("ctrl-c handler failed: {err}"))),
            }
        }
    }
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Runtime(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(filter).with_target(false);
    let _ = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
