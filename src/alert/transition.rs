// Service and connectivity transition detection

use crate::state::{ServiceStatus, StatusRecord};

/// A change between two consecutive observations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    ServiceUp,
    ServiceDown,
    InternetRestored,
    InternetLost,
}

impl Transition {
    pub fn message(&self, service_name: &str) -> String {
        match self {
            Transition::ServiceUp => format!("✅ {} is BACK UP!", service_name),
            Transition::ServiceDown => format!("⚠️ {} is DOWN!", service_name),
            Transition::InternetRestored => "✅ Internet connection RESTORED!".to_string(),
            Transition::InternetLost => "⚠️ Internet connection LOST!".to_string(),
        }
    }
}

/// A fresh probe result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub service_up: bool,
    pub internet_up: bool,
}

/// Compare `observation` with the stored record.
///
/// Returns the transitions (service first, then internet) and the record to
/// persist. Persisting the returned record is what keeps the next run quiet.
pub fn detect(previous: &StatusRecord, observation: Observation) -> (Vec<Transition>, StatusRecord) {
    let mut transitions = Vec::with_capacity(2);
    let mut next = previous.clone();

    let service_status = ServiceStatus::from_observation(observation.service_up);
    if previous.service_status != service_status {
        transitions.push(if observation.service_up {
            Transition::ServiceUp
        } else {
            Transition::ServiceDown
        });
        next.service_status = service_status;
    }

    if previous.internet_reachable != observation.internet_up {
        transitions.push(if observation.internet_up {
            Transition::InternetRestored
        } else {
            Transition::InternetLost
        });
        next.internet_reachable = observation.internet_up;
    }

    (transitions, next)
}
