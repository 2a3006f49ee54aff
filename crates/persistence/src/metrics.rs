//! Query timing and connection pool gauges.
//!
//! Every repository query is wrapped in a [`QueryTimer`]; the pool gauges are
//! refreshed by the health endpoint.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Records how long a named query took.
pub fn record_query_duration(query: &'static str, duration_secs: f64) {
    histogram!("db_query_duration_seconds", "query" => query).record(duration_secs);
}

/// Pool occupancy at the time of the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolUsage {
    pub size: u32,
    pub idle: u32,
}

impl PoolUsage {
    pub fn active(&self) -> u32 {
        self.size.saturating_sub(self.idle)
    }
}

/// Publishes pool gauges and returns the sampled usage.
pub fn record_pool_metrics(pool: &PgPool) -> PoolUsage {
    let usage = PoolUsage {
        size: pool.size(),
        idle: pool.num_idle() as u32,
    };

    gauge!("db_pool_connections", "state" => "active").set(usage.active() as f64);
    gauge!("db_pool_connections", "state" => "idle").set(usage.idle as f64);
    gauge!("db_pool_size").set(usage.size as f64);
    usage
}

/// Times one query:
///
/// ```ignore
/// let timer = QueryTimer::new("find_screen_by_screen_id");
/// let result = sqlx::query_as::<_, ScreenEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// result
/// ```
pub struct QueryTimer {
    query: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            start: Instant::now(),
        }
    }

    /// Records the elapsed time and returns it in seconds.
    pub fn record(self) -> f64 {
        let elapsed = self.start.elapsed().as_secs_f64();
        record_query_duration(self.query, elapsed);
        elapsed
    }
}
