//! DMI product name, the last resort

use super::{contains_word, read_evidence, DMI_PRODUCT_NAME};
use crate::evidence::Evidence;
use crate::facts::{self, FactCollection};
use crate::vm;
use tracing::debug;

/// Known product names, checked in order
const PRODUCT_NAMES: &[(&str, &str)] = &[
    ("VMware", vm::VMWARE),
    ("VirtualBox", vm::VIRTUALBOX),
    ("Parallels", vm::PARALLELS),
    ("KVM", vm::KVM),
    ("Virtual Machine", vm::HYPERV),
    ("RHEV Hypervisor", vm::REDHAT_EV),
    ("oVirt Node", vm::OVIRT),
    ("HVM domU", vm::XEN_HARDWARE),
    ("Bochs", vm::BOCHS),
    ("OpenBSD", vm::VMM),
    ("BHYVE", vm::BHYVE),
    ("Google Compute Engine", vm::GCE),
];

pub fn probe<E: Evidence + ?Sized>(evidence: &E, facts: &dyn FactCollection) -> String {
    let product_name = facts
        .get_str(facts::PRODUCT_NAME)
        .or_else(|| read_evidence(evidence, DMI_PRODUCT_NAME));

    let Some(product_name) = product_name else {
        return String::new();
    };

    match lookup(product_name.trim()) {
        Some(token) => {
            debug!("product name {:?} maps to {}", product_name.trim(), token);
            token.to_string()
        }
        None => String::new(),
    }
}

/// Map a product name to its identifier
pub fn lookup(product_name: &str) -> Option<&'static str> {
    PRODUCT_NAMES
        .iter()
        .find(|(marker, _)| contains_word(product_name, marker))
        .map(|(_, token)| *token)
}
