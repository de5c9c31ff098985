use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct SignalOfStop {
    // Shared state between clones
    token: CancellationToken,
}

impl SignalOfStop {
    pub fn new() -> SignalOfStop {
        SignalOfStop {
            token: CancellationToken::new(),
        }
    }

    /// Request shutdown. Idempotent and safe from any thread, including
    /// an OS signal handler thread.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until shutdown has been requested. Completes immediately when
    /// it already was.
    pub async fn wait_cancellation(&self) {
        self.token.cancelled().await;
    }
}

// Implementing the Clone trait
impl Clone for SignalOfStop {
    fn clone(&self) -> SignalOfStop {
        SignalOfStop {
            token: self.token.clone(),
        }
    }
}
