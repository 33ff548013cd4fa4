use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::warn;

const WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug)]
struct Window {
    start: Instant,
    count: u32,
}

/// Fixed one-second window shared by every route it is layered on.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    per_second: u32,
    window: Arc<Mutex<Window>>,
}

impl RateLimiter {
    pub fn per_second(limit: u32) -> Self {
        Self {
            per_second: limit.max(1),
            window: Arc::new(Mutex::new(Window {
                start: Instant::now(),
                count: 0,
            })),
        }
    }

    /// Counts one request. `Err` carries the time left in the current window.
    fn acquire(&self) -> Result<(), Duration> {
        let mut window = self.window.lock().expect("rate limiter mutex poisoned");
        let elapsed = window.start.elapsed();
        if elapsed >= WINDOW {
            window.start = Instant::now();
            window.count = 0;
        }
        if window.count < self.per_second {
            window.count += 1;
            Ok(())
        } else {
            Err(WINDOW.saturating_sub(elapsed))
        }
    }
}

pub async fn limit_requests(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Err(wait) = limiter.acquire() {
        warn!(path = %req.uri().path(), "Rate limit exceeded");
        let retry_after = wait.as_secs().max(1).to_string();
        return (
            StatusCode::TOO_MANY_REQUESTS,
            [(header::RETRY_AFTER, retry_after)],
            Json(json!({ "error": "Too many requests, please slow down" })),
        )
            .into_response();
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_refuses_past_budget() {
        let limiter = RateLimiter::per_second(2);
        assert!(limiter.acquire().is_ok());
        assert!(limiter.acquire().is_ok());
        let wait = limiter.acquire().unwrap_err();
        assert!(wait <= WINDOW);
    }

    #[test]
    fn zero_budget_still_admits_one() {
        let limiter = RateLimiter::per_second(0);
        assert!(limiter.acquire().is_ok());
        assert!(limiter.acquire().is_err());
    }
}
