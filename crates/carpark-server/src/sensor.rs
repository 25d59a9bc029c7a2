//! Sensor identifier selection
//!
//! Every successful invocation is tagged with one sensor id taken from a fixed
//! configured list. Which one is picked is a policy decision, injected into
//! the command service as a [`SensorPolicy`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use carpark_core::prelude::*;

use crate::config::{SensorPolicyKind, SensorSettings};

/// Chooses the sensor id reported for an invocation
pub trait SensorPolicy: Send + Sync + std::fmt::Debug {
    fn select(&self, command: &str) -> String;
}

/// Always reports the first configured sensor
#[derive(Debug, Clone)]
pub struct FirstSensor {
    id: String,
}

impl FirstSensor {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl SensorPolicy for FirstSensor {
    fn select(&self, _command: &str) -> String {
        self.id.clone()
    }
}

/// Cycles through the configured sensors, one per invocation
#[derive(Debug)]
pub struct RoundRobinSensor {
    ids: Vec<String>,
    next: AtomicUsize,
}

impl RoundRobinSensor {
    /// Returns `None` when `ids` is empty
    pub fn new(ids: Vec<String>) -> Option<Self> {
        if ids.is_empty() {
            return None;
        }
        Some(Self {
            ids,
            next: AtomicUsize::new(0),
        })
    }
}

impl SensorPolicy for RoundRobinSensor {
    fn select(&self, _command: &str) -> String {
        let slot = self.next.fetch_add(1, Ordering::Relaxed) % self.ids.len();
        self.ids[slot].clone()
    }
}

/// Build the policy described by the `[sensors]` section
pub fn policy_from_settings(settings: &SensorSettings) -> Result<Arc<dyn SensorPolicy>> {
    let first = settings
        .ids
        .first()
        .ok_or_else(|| Error::config_invalid("sensors.ids must not be empty"))?;

    let policy: Arc<dyn SensorPolicy> = match settings.policy {
        SensorPolicyKind::First => Arc::new(FirstSensor::new(first.clone())),
        SensorPolicyKind::RoundRobin => Arc::new(
            RoundRobinSensor::new(settings.ids.clone())
                .ok_or_else(|| Error::config_invalid("sensors.ids must not be empty"))?,
        ),
    };

    debug!("Sensor policy: {:?}", policy);
    Ok(policy)
}
