pub mod config;
pub mod domain;

pub mod application;
pub mod infrastructure;

mod app_context;

pub use app_context::AppContext;
pub use config::AppConfig;

#[cfg(test)]
pub(crate) mod test_support;
