// Durable per-domain state

pub mod gateway;
pub mod models;
pub mod store;


pub use gateway::StateGateway;
pub use models::{
    AlertFlags, Metric, MetricSnapshot, MetricValues, ServiceStatus, StatusRecord, TaskHistory,
    TaskRecord, DISPLAY_TIME_FORMAT,
};
pub use store::JsonStore;
