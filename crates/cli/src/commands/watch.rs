//! Live dashboard
//!
//! Activates the polling controller and re-renders on every published
//! view change. Typing `r` (or an empty line) triggers a manual refresh,
//! `q` or Ctrl-C tears the view down.

use anyhow::Result;
use console_lib::PollingController;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::dashboard::render_view;
use crate::output::{print_info, print_warning, OutputFormat};

/// Tears the view down however `watch` exits
struct TeardownOnExit<'a>(&'a PollingController);

impl Drop for TeardownOnExit<'_> {
    fn drop(&mut self) {
        self.0.teardown();
    }
}

pub async fn watch(controller: &Arc<PollingController>, format: OutputFormat) -> Result<()> {
    let _teardown = TeardownOnExit(controller);
    let mut rx = controller.subscribe();

    // Initial load runs in the background so the loading state renders
    let initial = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.activate().await })
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    print_info("Watching backend. [r]efresh, [q]uit");

    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = rx.borrow_and_update().clone();
                if matches!(format, OutputFormat::Table) {
                    // Clear screen between frames
                    print!("\x1B[2J\x1B[1;1H");
                }
                render_view(&view, format)?;
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(input)) => match input.trim() {
                        "" | "r" => {
                            controller.spawn_refresh();
                        }
                        "q" => break,
                        other => print_warning(&format!("Unknown input '{}'", other)),
                    },
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        debug!(error = %e, "stdin closed");
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    initial.abort();
    print_warning("Stopped watching");
    Ok(())
}
