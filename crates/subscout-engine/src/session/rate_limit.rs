//! Fixed-window request limiter shared by all sources.
//!
//! Unlike a middleware that rejects excess requests, callers here wait for the
//! next window. Waiters are served in arrival order (tokio's mutex is fair).

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Requests allowed per window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Maximum requests allowed within the window.
    pub max_requests: u32,
    /// Time window duration.
    pub window: Duration,
}

impl RateLimitConfig {
    pub fn per_second(max_requests: u32) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(1),
        }
    }
}

#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Mutex<Window>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config: RateLimitConfig {
                max_requests: config.max_requests.max(1),
                ..config
            },
            state: Mutex::new(Window {
                started: Instant::now(),
                count: 0,
            }),
        }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Wait until a request slot is available in the current window
    pub async fn acquire(&self) {
        let mut window = self.state.lock().await;
        loop {
            if window.started.elapsed() >= self.config.window {
                // Reset window
                window.started = Instant::now();
                window.count = 0;
            }

            if window.count < self.config.max_requests {
                window.count += 1;
                return;
            }

            let remaining = self
                .config
                .window
                .saturating_sub(window.started.elapsed());
            tokio::time::sleep(remaining).await;
        }
    }
}
