mod telemetry;

use subtrack_engine::{Application, Visibility};
use subtrack_infra::setup_context;
use telemetry::{get_subscriber, init_subscriber};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("subtrack".into(), "info".into());
    init_subscriber(subscriber);

    let context = setup_context().await?;

    let (visibility_tx, visibility_rx) = mpsc::channel(16);
    let app = Application::mount(context, visibility_rx);
    forward_visibility_signals(visibility_tx);

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    app.stopped().await;
    Ok(())
}

/// `SIGUSR1` reports that the application is visible again, `SIGUSR2` that it
/// went to the background
#[cfg(unix)]
fn forward_visibility_signals(visibility: mpsc::Sender<Visibility>) {
    use tokio::signal::unix::{signal, SignalKind};

    let signals = signal(SignalKind::user_defined1())
        .and_then(|visible| Ok((visible, signal(SignalKind::user_defined2())?)));
    let (mut visible, mut hidden) = match signals {
        Ok(signals) => signals,
        Err(e) => {
            warn!("Unable to listen for visibility signals: {:?}", e);
            return;
        }
    };

    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                Some(()) = visible.recv() => Visibility::Visible,
                Some(()) = hidden.recv() => Visibility::Hidden,
                else => break,
            };
            if visibility.send(event).await.is_err() {
                break;
            }
        }
    });
}

#[cfg(not(unix))]
fn forward_visibility_signals(_visibility: mpsc::Sender<Visibility>) {
    warn!("Visibility signals are only supported on unix");
}
