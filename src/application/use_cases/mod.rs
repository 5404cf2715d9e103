pub mod chat;
pub mod dashboard;
pub mod dataset_analysis;
pub mod date_filter;
pub mod sampler;
pub mod stats;
