use super::Revalidator;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Routes marked stale since the caching layer last collected them.
#[derive(Clone, Default)]
pub struct StaleRoutes {
    routes: Arc<DashMap<String, DateTime<Utc>>>,
}

impl StaleRoutes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stale(&self, route: &str) -> bool {
        self.routes.contains_key(route)
    }

    /// Drains and returns the stale routes, oldest first.
    pub fn take_stale(&self) -> Vec<(String, DateTime<Utc>)> {
        let keys: Vec<String> = self.routes.iter().map(|e| e.key().clone()).collect();
        let mut drained: Vec<(String, DateTime<Utc>)> = keys
            .into_iter()
            .filter_map(|key| self.routes.remove(&key))
            .collect();
        drained.sort_by_key(|(_, at)| *at);
        drained
    }
}

impl Revalidator for StaleRoutes {
    fn revalidate(&self, route: &str) {
        tracing::debug!(route, "View marked stale");
        self.routes
            .entry(route.to_string())
            .or_insert_with(Utc::now);
    }
}
