//! OpenVZ containers and hardware nodes

use super::{read_evidence, status_field, PROC_SELF_STATUS};
use crate::evidence::Evidence;
use crate::vm;

const PROC_VZ: &str = "/proc/vz";
const PROC_VZ_VERSION: &str = "/proc/vz/version";
const PROC_VZ_VEINFO: &str = "/proc/vz/veinfo";
/// CloudLinux LVE exposes /proc/vz too
const PROC_LVE_LIST: &str = "/proc/lve/list";

pub fn probe<E: Evidence + ?Sized>(evidence: &E) -> String {
    if !evidence.is_dir(PROC_VZ) || evidence.is_file(PROC_LVE_LIST) {
        return String::new();
    }
    if evidence.dir_is_empty(PROC_VZ).unwrap_or(true) {
        return String::new();
    }

    let env_id = read_evidence(evidence, PROC_SELF_STATUS)
        .and_then(|status| status_field(&status, &["envID:"]).map(str::to_string));

    match env_id.as_deref() {
        Some("0") => vm::OPENVZ_HN.to_string(),
        Some(_) => vm::OPENVZ_VE.to_string(),
        // Kernels without envID in status: the node has version, containers veinfo
        None if evidence.exists(PROC_VZ_VERSION) => vm::OPENVZ_HN.to_string(),
        None if evidence.exists(PROC_VZ_VEINFO) => vm::OPENVZ_VE.to_string(),
        None => String::new(),
    }
}
