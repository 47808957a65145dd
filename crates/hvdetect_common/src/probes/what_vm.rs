//! virt-what style identification helper

use super::{run_helper, vserver};
use crate::evidence::Evidence;
use crate::vm;
use tracing::debug;

/// Diagnostics some virt-what versions print on stdout
const DIAGNOSTIC_PREFIX: &str = "virt-what:";

pub fn probe<E: Evidence + ?Sized>(evidence: &E, program: &str) -> String {
    let Some(output) = run_helper(evidence, program, &[]) else {
        return String::new();
    };

    let Some(line) = output
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with(DIAGNOSTIC_PREFIX))
        .find(|line| !line.is_empty())
    else {
        return String::new();
    };

    let reported = line.to_lowercase();
    debug!("{} reported {}", program, reported);

    match reported.as_str() {
        "linux_vserver" => vserver::probe(evidence),
        "xen-hvm" => vm::XEN_HARDWARE.to_string(),
        "xen-dom0" => vm::XEN_PRIVILEGED.to_string(),
        "xen-domu" => vm::XEN_UNPRIVILEGED.to_string(),
        "ibm_systemz" => vm::ZLINUX.to_string(),
        _ => reported,
    }
}
