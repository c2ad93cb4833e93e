//! Fixed pacing between navigations.
//!
//! Delays are mandatory sleeps between successive fetches, never retries.

use std::time::Duration;
use tracing::debug;

use crate::types::config::ScrapeSettings;

/// Sleeps between page fetches and between queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    /// Delay between pages of one query
    pub page_delay: Duration,

    /// Delay between queries
    pub query_delay: Duration,
}

impl Pacer {
    pub fn new(page_delay: Duration, query_delay: Duration) -> Self {
        Self {
            page_delay,
            query_delay,
        }
    }

    /// A pacer that never sleeps.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn from_settings(settings: &ScrapeSettings) -> Self {
        Self::new(settings.page_delay(), settings.query_delay())
    }

    /// Wait before fetching the next page of the same query.
    pub async fn between_pages(&self) {
        pause("page", self.page_delay).await;
    }

    /// Wait before starting the next query.
    pub async fn between_queries(&self) {
        pause("query", self.query_delay).await;
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::from_settings(&ScrapeSettings::default())
    }
}

async fn pause(kind: &str, delay: Duration) {
    if delay.is_zero() {
        return;
    }
    debug!("Pacing {} for {:?}", kind, delay);
    tokio::time::sleep(delay).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_from_settings() {
        let pacer = Pacer::from_settings(&ScrapeSettings::default());
        assert_eq!(pacer.page_delay, Duration::from_millis(2000));
        assert_eq!(pacer.query_delay, Duration::from_millis(3000));
    }

    #[tokio::test]
    async fn test_zero_delay_returns_immediately() {
        let started = Instant::now();
        Pacer::none().between_pages().await;
        Pacer::none().between_queries().await;
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_sleeps_for_configured_delay() {
        let pacer = Pacer::new(Duration::from_millis(20), Duration::ZERO);
        let started = Instant::now();
        pacer.between_pages().await;
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
