use std::io::Write;

use lib_kiosk::display::tty::render_screen;
use lib_kiosk::Frame;
use tokio::sync::{broadcast, watch};

use super::config::RenderMode;

/// Draws frames until shutdown.
///
/// `Tty` redraws the terminal on every frame. `Log` writes one summary line
/// whenever the summary text changes, so progress ticks do not flood the log.
pub async fn run(mode: RenderMode, mut frames: watch::Receiver<Frame>, mut shutdown: broadcast::Receiver<()>) {
    let mut last_summary = String::new();

    loop {
        let frame = frames.borrow_and_update().clone();
        match mode {
            RenderMode::Tty => {
                let mut stdout = std::io::stdout().lock();
                if let Err(e) = stdout.write_all(render_screen(&frame).as_bytes()).and_then(|_| stdout.flush()) {
                    log::error!("Terminal write failed, stopping renderer: {}", e);
                    return;
                }
            }
            RenderMode::Log => {
                let summary = frame.summary();
                if summary != last_summary {
                    log::info!("{}", summary);
                    last_summary = summary;
                }
            }
        }

        tokio::select! {
            _ = shutdown.recv() => {
                log::info!("Renderer shutting down.");
                return;
            }
            changed = frames.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}
