//! Xen domains

use super::read_evidence;
use crate::evidence::Evidence;
use crate::vm;

const XEN_CAPABILITIES: &str = "/proc/xen/capabilities";
const XEN_EVTCHN: &str = "/dev/xen/evtchn";
const HYPERVISOR_TYPE: &str = "/sys/hypervisor/type";
const HYPERVISOR_GUEST_TYPE: &str = "/sys/hypervisor/guest_type";
const PROC_XEN: &str = "/proc/xen";
const XEN_BLOCK_DEVICE: &str = "/dev/xvda1";

pub fn probe<E: Evidence + ?Sized>(evidence: &E) -> String {
    // A readable capabilities file is authoritative; the evtchn device
    // also exists in guests running the xen-evtchn driver
    let privileged = match read_evidence(evidence, XEN_CAPABILITIES) {
        Some(caps) => caps
            .split(|c: char| c == ',' || c.is_whitespace())
            .any(|c| c == "control_d"),
        None => evidence.exists(XEN_EVTCHN),
    };
    if privileged {
        return vm::XEN_PRIVILEGED.to_string();
    }

    let hypervisor = read_evidence(evidence, HYPERVISOR_TYPE);
    if hypervisor.as_deref().map(str::trim) == Some("xen") {
        let guest_type = read_evidence(evidence, HYPERVISOR_GUEST_TYPE);
        match guest_type.as_deref().map(str::trim) {
            Some("HVM") => return vm::XEN_HARDWARE.to_string(),
            Some("PV") | Some("PVH") => return vm::XEN_UNPRIVILEGED.to_string(),
            _ => {}
        }
    }

    if evidence.exists(PROC_XEN) || evidence.exists(XEN_BLOCK_DEVICE) {
        return vm::XEN_UNPRIVILEGED.to_string();
    }
    String::new()
}
