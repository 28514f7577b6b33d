//! SIGINT/SIGTERM to [`Event::Shutdown`].

use std::io;
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};

use cartreader_core::controller::Event;

/// Wait for Ctrl+C or SIGTERM on a dedicated thread and post a shutdown
/// event when either arrives.
pub fn spawn_listener(events: Sender<Event>) -> io::Result<JoinHandle<()>> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    Ok(thread::spawn(move || {
        rt.block_on(wait_for_signal());
        tracing::info!("shutdown signal received");
        let _ = events.send(Event::Shutdown);
    }))
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::warn!("failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = sigterm => {},
    }
}
