//! Virtualization fact resolver
//!
//! Computes the hypervisor once per resolver and publishes it as the
//! `hypervisor`, `virtual` and `is_virtual` facts.

use crate::detector::VirtualizationDetector;
use crate::evidence::{Evidence, HostEvidence};
use crate::facts::{self, FactCollection};
use crate::probes::Probe;
use crate::vm;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::OnceLock;

/// Resolved virtualization facts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualizationData {
    /// Raw identifier, empty on bare metal
    pub hypervisor: String,

    /// Identifier, or `physical`
    #[serde(rename = "virtual")]
    pub virtual_name: String,

    pub is_virtual: bool,

    /// Probe that decided, if any
    pub probe: Option<Probe>,
}

pub struct VirtualizationResolver<E: Evidence = HostEvidence> {
    detector: VirtualizationDetector<E>,
    resolved: OnceLock<VirtualizationData>,
}

impl<E: Evidence> VirtualizationResolver<E> {
    pub fn new(detector: VirtualizationDetector<E>) -> Self {
        Self {
            detector,
            resolved: OnceLock::new(),
        }
    }

    /// Resolve (first call only) and publish into `facts`
    pub fn resolve(&self, facts: &mut dyn FactCollection) -> VirtualizationData {
        let data = self
            .resolved
            .get_or_init(|| {
                let detection = self.detector.detect(&*facts);
                VirtualizationData {
                    virtual_name: vm::virtual_name(&detection.hypervisor).to_string(),
                    is_virtual: vm::is_virtual(&detection.hypervisor),
                    hypervisor: detection.hypervisor,
                    probe: detection.probe,
                }
            })
            .clone();

        facts.add(facts::HYPERVISOR, Value::String(data.hypervisor.clone()));
        facts.add(facts::VIRTUAL, Value::String(data.virtual_name.clone()));
        facts.add(facts::IS_VIRTUAL, Value::Bool(data.is_virtual));
        data
    }

    /// Forget the cached result so the next `resolve` probes again
    pub fn invalidate(&mut self) {
        self.resolved.take();
    }
}
