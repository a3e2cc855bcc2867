//! View-lifetime cancellation.
//!
//! A [`ViewScope`] lives as long as a dashboard view is on screen. Reads
//! started through [`ViewScope::run`] are dropped when the scope closes,
//! and [`ViewScope::is_closed`] lets callers discard results that finish
//! after the view is gone. Work that must not be interrupted, such as
//! recording an issued credential, is awaited outside `run`.

use std::future::Future;

use tokio::sync::watch;

/// The operation was abandoned because its view closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("view closed")]
pub struct Cancelled;

/// Cancellation handle shared by every operation a view starts.
#[derive(Debug, Clone)]
pub struct ViewScope {
    tx: std::sync::Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewScope {
    /// An open scope.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: std::sync::Arc::new(tx),
            rx,
        }
    }

    /// Close the scope. Idempotent.
    pub fn close(&self) {
        self.tx.send_replace(true);
    }

    /// Whether the scope has been closed.
    pub fn is_closed(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the scope is closed.
    pub async fn closed(&self) {
        let mut rx = self.rx.clone();
        // The sender lives in `self`, so `wait_for` cannot see a dropped channel.
        let _ = rx.wait_for(|closed| *closed).await;
    }

    /// Run `fut` until it completes or the scope closes, whichever comes
    /// first. A future that finishes after close is reported as
    /// [`Cancelled`] even if it raced the close.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, Cancelled>
    where
        F: Future,
    {
        if self.is_closed() {
            return Err(Cancelled);
        }
        tokio::select! {
            biased;
            () = self.closed() => Err(Cancelled),
            out = fut => {
                if self.is_closed() {
                    Err(Cancelled)
                } else {
                    Ok(out)
                }
            }
        }
    }
}
