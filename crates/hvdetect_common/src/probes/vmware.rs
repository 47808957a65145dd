//! VMware guests (DMI) and hosts (`vmware -v`)

use super::{contains_word, read_evidence, run_helper, DMI_PRODUCT_NAME, DMI_SYS_VENDOR};
use crate::evidence::Evidence;
use crate::vm;
use tracing::debug;

const MARKER: &str = "VMware";

pub fn probe<E: Evidence + ?Sized>(evidence: &E, program: &str) -> String {
    for path in [DMI_SYS_VENDOR, DMI_PRODUCT_NAME] {
        if let Some(value) = read_evidence(evidence, path) {
            if contains_word(value.trim(), MARKER) {
                debug!("vmware probe: {} is {:?}", path, value.trim());
                return vm::VMWARE.to_string();
            }
        }
    }

    run_helper(evidence, program, &["-v"])
        .and_then(|output| product_token(&output))
        .unwrap_or_default()
}

/// `VMware Workstation 17.0.0 build-20800274` -> `vmware_workstation`.
/// Only the first two words count; the version and build that follow are ignored.
fn product_token(output: &str) -> Option<String> {
    let mut parts = output.lines().next()?.split_whitespace();
    let (vendor, product) = (parts.next()?, parts.next()?);
    if !vendor.eq_ignore_ascii_case(MARKER) || !product.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(format!("{}_{}", vm::VMWARE, product.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::MemoryEvidence;

    #[test]
    fn test_dmi_vendor() {
        let evidence = MemoryEvidence::new().file(DMI_SYS_VENDOR, "VMware, Inc.\n");
        assert_eq!(probe(&evidence, "vmware"), "vmware");
    }

    #[test]
    fn test_dmi_product_name() {
        let evidence = MemoryEvidence::new()
            .file(DMI_SYS_VENDOR, "Unknown\n")
            .file(DMI_PRODUCT_NAME, "VMware7,1\n");
        assert_eq!(probe(&evidence, "vmware"), "vmware");
    }

    #[test]
    fn test_dmi_overlap_is_not_vmware() {
        let evidence = MemoryEvidence::new()
            .file(DMI_SYS_VENDOR, "NotVMware Systems\n")
            .file(DMI_PRODUCT_NAME, "VMwareless Appliance\n");
        assert_eq!(probe(&evidence, "vmware"), "");
    }

    #[test]
    fn test_host_tools() {
        let evidence = MemoryEvidence::new()
            .file(DMI_SYS_VENDOR, "Dell Inc.\n")
            .command("vmware -v", "VMware Workstation 17.0.0 build-20800274\n");
        assert_eq!(probe(&evidence, "vmware"), "vmware_workstation");

        let evidence = MemoryEvidence::new().command("vmware -v", "VmWare Server\n");
        assert_eq!(probe(&evidence, "vmware"), "vmware_server");
    }

    #[test]
    fn test_trailing_version_is_ignored() {
        let evidence = MemoryEvidence::new().command("vmware -v", "vmware fusion 7.1\n");
        assert_eq!(probe(&evidence, "vmware"), "vmware_fusion");
    }

    #[test]
    fn test_unexpected_tool_output() {
        let evidence = MemoryEvidence::new().command("vmware -v", "vmware\n");
        assert_eq!(probe(&evidence, "vmware"), "");

        let evidence = MemoryEvidence::new().command("vmware -v", "Fusion VMware 13\n");
        assert_eq!(probe(&evidence, "vmware"), "");
    }

    #[test]
    fn test_nothing_available() {
        assert_eq!(probe(&MemoryEvidence::new(), "vmware"), "");
        let evidence = MemoryEvidence::new().failing_command("vmware -v", 127);
        assert_eq!(probe(&evidence, "vmware"), "");
    }
}
