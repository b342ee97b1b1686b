//! Per-client request throttling.
//!
//! Token bucket per client IP: a request takes one token, tokens refill at
//! `requests_per_second` and accumulate up to `burst_capacity`. A client
//! with an empty bucket gets 429 without reaching the handler.

use crate::errors::AppError;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::{Arc, Mutex},
    time::Instant,
};
use tracing::warn;

/// Bucket map size that triggers pruning of idle clients.
const PRUNE_THRESHOLD: usize = 1024;

#[derive(Clone, Copy)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Shared throttle state; clones observe the same buckets.
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<IpAddr, Bucket>>>,
    requests_per_second: u32,
    burst_capacity: u32,
}

impl RateLimiter {
    pub fn new(requests_per_second: u32, burst_capacity: u32) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            requests_per_second,
            burst_capacity,
        }
    }

    /// Take one token for `client`. New clients start with a full bucket.
    pub fn try_acquire(&self, client: IpAddr) -> bool {
        self.try_acquire_at(client, Instant::now())
    }

    fn try_acquire_at(&self, client: IpAddr, now: Instant) -> bool {
        let mut buckets = self
            .buckets
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let rate = f64::from(self.requests_per_second);
        let burst = f64::from(self.burst_capacity);

        // A full bucket is indistinguishable from a fresh one, so idle
        // clients can be dropped once the map grows.
        if buckets.len() >= PRUNE_THRESHOLD && !buckets.contains_key(&client) {
            buckets.retain(|_, bucket| {
                let refilled =
                    bucket.tokens + rate * now.duration_since(bucket.last_refill).as_secs_f64();
                refilled < burst
            });
        }

        let bucket = buckets.entry(client).or_insert(Bucket {
            tokens: burst,
            last_refill: now,
        });

        let elapsed = now.duration_since(bucket.last_refill).as_secs_f64();
        bucket.tokens = (bucket.tokens + rate * elapsed).min(burst);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Gate a request on the client's token bucket.
pub async fn throttle(
    State(limiter): State<RateLimiter>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    if limiter.try_acquire(addr.ip()) {
        next.run(request).await
    } else {
        warn!("throttled {} on {}", addr.ip(), request.uri().path());
        AppError::too_many_requests().into_response()
    }
}
