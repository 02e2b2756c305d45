mod stale_routes;

pub use stale_routes::StaleRoutes;

/// Told which rendered views are out of date after a mutation commits.
pub trait Revalidator: Send + Sync {
    fn revalidate(&self, route: &str);
}
