use std::time::Duration;

use tokio::spawn;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::trace;

use crate::filters::FilterSpec;

/// Collapses bursts of filter edits into the last spec of each burst.
///
/// A spec is emitted once no further edit arrives within the quiet period. Dropping the
/// debouncer flushes the pending spec and closes the output channel.
pub struct FilterDebouncer {
    sender: mpsc::UnboundedSender<FilterSpec>
}

impl FilterDebouncer {
    pub fn spawn(quiet: Duration) -> (Self, mpsc::Receiver<FilterSpec>) {
        let (sender, mut input) = mpsc::unbounded_channel::<FilterSpec>();
        let (output, receiver) = mpsc::channel(1);

        spawn(async move {
            while let Some(mut latest) = input.recv().await {
                let mut collapsed = 0;

                loop {
                    match timeout(quiet, input.recv()).await {
                        Ok(Some(spec)) => {
                            latest = spec;
                            collapsed += 1;
                        }
                        Ok(None) | Err(_) => break
                    }
                }

                trace!("Emitting filter after collapsing [{collapsed}] earlier edits");

                if output.send(latest).await.is_err() {
                    break;
                }
            }
        });

        (Self { sender }, receiver)
    }

    /// Queues an edit. Returns false once the output side is gone.
    pub fn push(&self, filter: FilterSpec) -> bool {
        self.sender.send(filter).is_ok()
    }
}
