// Domain layer - plain data shared by every dashboard component
pub mod chart;
pub mod dataset;
pub mod history;
