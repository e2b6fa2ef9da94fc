use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::{sync::Mutex, task::JoinHandle};

use crate::error::AppError;
use crate::AppState;

const MIN_PURGE_PERIOD: Duration = Duration::from_secs(1);

/// Fixed-window request counter keyed by caller, for single-instance deployments.
#[derive(Clone)]
pub struct RateLimiter {
    entries: Arc<Mutex<HashMap<String, Window>>>,
    max_requests: u32,
    window: Duration,
}

struct Window {
    count: u32,
    started: Instant,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    /// Count one request for `key`. Returns the remaining allowance, or how
    /// long until the window resets once the key is exhausted.
    pub async fn check(&self, key: &str) -> Result<u32, Duration> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        let entry = entries.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(entry.started) > self.window {
            entry.count = 0;
            entry.started = now;
        }

        if entry.count >= self.max_requests {
            return Err(self.window.saturating_sub(now.duration_since(entry.started)));
        }

        entry.count += 1;
        Ok(self.max_requests - entry.count)
    }

    /// Drop windows idle for more than two periods.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        let now = Instant::now();
        let keep_for = self.window * 2;
        entries.retain(|_, entry| now.duration_since(entry.started) < keep_for);
        before - entries.len()
    }

    pub fn spawn_purger(&self) -> JoinHandle<()> {
        let limiter = self.clone();
        // interval() panics on a zero period
        let every = self.window.max(MIN_PURGE_PERIOD);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let purged = limiter.purge_expired().await;
                if purged > 0 {
                    tracing::debug!(purged, "Purged idle rate limit windows");
                }
            }
        })
    }
}

/// Limits login/register/refresh attempts per client IP and path.
pub async fn limit_auth_attempts(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = addr.ip().to_string();
    let path = req.uri().path().to_string();
    let key = format!("{}:{}", ip, path);

    match state.rate_limiter.check(&key).await {
        Ok(remaining) => {
            tracing::debug!(ip = %ip, path = %path, remaining, "Rate limit check passed");
            Ok(next.run(req).await)
        }
        Err(retry_after) => {
            tracing::warn!(
                ip = %ip,
                path = %path,
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );
            Err(AppError::RateLimited)
        }
    }
}
