// Spreadsheet charting dashboard client
pub mod application;
pub mod domain;
pub mod infrastructure;
