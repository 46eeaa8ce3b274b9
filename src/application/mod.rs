// Application layer - Dashboard use cases and the state they share
pub mod configurator;
pub mod dashboard_service;
pub mod error;
pub mod export_service;
pub mod file_store;
pub mod generation;
pub mod history_service;
pub mod renderer;
pub mod session;
pub mod state;
pub mod upload_service;

#[cfg(test)]
pub(crate) mod testing;
