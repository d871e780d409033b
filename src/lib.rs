// Piwatch - Pi-hole status alerting and remote maintenance
// Library root

pub mod alert;
pub mod bot;
pub mod checks;
pub mod config;
pub mod error;
pub mod logging;
pub mod notify;
pub mod probe;
pub mod process;
pub mod resilience;
pub mod state;
pub mod tasks;
pub mod telegram;
pub mod version;
