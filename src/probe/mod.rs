// Host observations feeding the alert flows

pub mod connectivity;
pub mod metrics;
pub mod service;

pub use connectivity::ConnectivityProbe;
pub use metrics::{parse_vcgencmd_temp, round1, MetricsProbe};
pub use service::SystemdProbe;
