//! Delay sources for the poll engine

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// Waits between status checks
///
/// Swapping the implementation lets tests run the poll loop without real
/// waiting.
#[async_trait]
pub trait Sleeper: Send + Sync + std::fmt::Debug {
    async fn sleep(&self, delay: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Returns immediately and remembers every requested delay
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order
    pub fn delays(&self) -> Vec<Duration> {
        match self.delays.lock() {
            Ok(delays) => delays.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        match self.delays.lock() {
            Ok(mut delays) => delays.push(delay),
            Err(poisoned) => poisoned.into_inner().push(delay),
        }
    }
}
