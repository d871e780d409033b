// Status-change alerting

pub mod threshold;
pub mod transition;


pub use threshold::{evaluate, Evaluation, ALERT_HEADER};
pub use transition::{detect, Observation, Transition};
