// One-shot scheduled flows: load state, observe, decide, notify, persist

pub mod down_alert;
pub mod maintenance;
pub mod monitor;

#[cfg(test)]
mod tests;
