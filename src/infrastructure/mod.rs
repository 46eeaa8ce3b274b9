// Infrastructure layer - External dependencies and adapters
pub mod chart_canvas;
pub mod config;
pub mod export_formats;
pub mod http_file_store;
