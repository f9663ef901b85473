use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tokio::task::JoinHandle;

#[derive(Debug)]
struct Visitor {
    count: u32,
    window_start: Instant,
    last_seen: Instant,
}

struct Inner {
    limit: u32,
    window: Duration,
    visitors: Mutex<HashMap<IpAddr, Visitor>>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

enum Decision {
    Allowed,
    Limited { retry_after_secs: u64 },
}

/// Per-IP fixed-window counter. Constructed and injected where the router is
/// assembled; the background sweep task has an explicit start/stop lifecycle
/// so tests can run limiters side by side without leakage.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                limit: limit.max(1),
                window,
                visitors: Mutex::new(HashMap::new()),
                sweeper: Mutex::new(None),
            }),
        }
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    fn check(&self, ip: IpAddr) -> Decision {
        let now = Instant::now();
        let mut visitors = self
            .inner
            .visitors
            .lock()
            .expect("rate limiter mutex poisoned");

        let visitor = visitors.entry(ip).or_insert(Visitor {
            count: 0,
            window_start: now,
            last_seen: now,
        });

        if now.duration_since(visitor.window_start) > self.inner.window {
            visitor.count = 0;
            visitor.window_start = now;
        }
        visitor.last_seen = now;

        if visitor.count >= self.inner.limit {
            let elapsed = now.duration_since(visitor.window_start);
            let remaining = self.inner.window.saturating_sub(elapsed);
            return Decision::Limited {
                retry_after_secs: remaining.as_secs().max(1),
            };
        }

        visitor.count += 1;
        Decision::Allowed
    }

    /// Spawns the sweep task; idle entries are dropped after five windows.
    /// Idempotent.
    pub fn start_sweeper(&self) {
        let mut guard = self.inner.sweeper.lock().expect("sweeper mutex poisoned");
        if guard.is_some() {
            return;
        }
        let inner = Arc::clone(&self.inner);
        let sweep_every = inner.window * 2;
        let idle_ttl = inner.window * 5;
        *guard = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(sweep_every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let now = Instant::now();
                let mut visitors = inner.visitors.lock().expect("rate limiter mutex poisoned");
                visitors.retain(|_, v| now.duration_since(v.last_seen) <= idle_ttl);
            }
        }));
    }

    pub fn stop_sweeper(&self) {
        if let Some(handle) = self
            .inner
            .sweeper
            .lock()
            .expect("sweeper mutex poisoned")
            .take()
        {
            handle.abort();
        }
    }

    #[cfg(test)]
    fn tracked_ips(&self) -> usize {
        self.inner.visitors.lock().unwrap().len()
    }
}

fn client_ip(req: &Request<Body>) -> IpAddr {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            if let Ok(ip) = first.trim().parse() {
                return ip;
            }
        }
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match limiter.check(client_ip(&req)) {
        Decision::Allowed => next.run(req).await,
        Decision::Limited { retry_after_secs } => (
            StatusCode::TOO_MANY_REQUESTS,
            [("Retry-After", retry_after_secs.to_string())],
            Json(json!({"error": "Too many requests. Try again later."})),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(10, 0, 0, last))
    }

    #[test]
    fn blocks_after_limit_within_window() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(matches!(limiter.check(ip(1)), Decision::Allowed));
        }
        assert!(matches!(limiter.check(ip(1)), Decision::Limited { .. }));
        // Other addresses keep their own window.
        assert!(matches!(limiter.check(ip(2)), Decision::Allowed));
    }

    #[test]
    fn window_resets_counter() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));
        assert!(matches!(limiter.check(ip(1)), Decision::Allowed));
        assert!(matches!(limiter.check(ip(1)), Decision::Limited { .. }));
        std::thread::sleep(Duration::from_millis(30));
        assert!(matches!(limiter.check(ip(1)), Decision::Allowed));
    }

    #[tokio::test]
    async fn sweeper_drops_idle_entries() {
        // window 10ms -> sweep every 20ms, idle TTL 50ms
        let limiter = RateLimiter::new(5, Duration::from_millis(10));
        limiter.check(ip(1));
        limiter.start_sweeper();
        assert_eq!(limiter.tracked_ips(), 1);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(limiter.tracked_ips(), 0);
        limiter.stop_sweeper();
    }
}
