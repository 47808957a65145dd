//! Hypervisor identifiers
//!
//! Tokens published as the `virtual` fact. An empty identifier means no
//! probe found evidence; it is never a technology name.

pub const DOCKER: &str = "docker";
pub const LXC: &str = "lxc";
pub const PODMAN: &str = "podman";

pub const VMWARE: &str = "vmware";
pub const VMWARE_SERVER: &str = "vmware_server";
pub const VMWARE_WORKSTATION: &str = "vmware_workstation";
pub const VIRTUALBOX: &str = "virtualbox";
pub const PARALLELS: &str = "parallels";
pub const KVM: &str = "kvm";
pub const HYPERV: &str = "hyperv";
pub const REDHAT_EV: &str = "rhev";
pub const OVIRT: &str = "ovirt";
pub const BOCHS: &str = "bochs";
pub const VMM: &str = "vmm";
pub const BHYVE: &str = "bhyve";

pub const XEN_HARDWARE: &str = "xenhvm";
pub const XEN_PRIVILEGED: &str = "xen0";
pub const XEN_UNPRIVILEGED: &str = "xenu";

pub const OPENVZ_HN: &str = "openvzhn";
pub const OPENVZ_VE: &str = "openvzve";

pub const VSERVER: &str = "vserver";
pub const VSERVER_HOST: &str = "vserver_host";

pub const ZLINUX: &str = "zlinux";
pub const GCE: &str = "gce";

/// Published for `virtual` when nothing was detected
pub const PHYSICAL: &str = "physical";

/// Identifiers naming a host or privileged domain rather than a guest
const NON_VIRTUAL: &[&str] = &[
    PHYSICAL,
    XEN_PRIVILEGED,
    VMWARE_SERVER,
    VMWARE_WORKSTATION,
    OPENVZ_HN,
    VSERVER_HOST,
];

/// Whether `hypervisor` means this system runs as a guest
pub fn is_virtual(hypervisor: &str) -> bool {
    !hypervisor.is_empty() && !NON_VIRTUAL.contains(&hypervisor)
}

/// Value for the `virtual` fact: the identifier, or `physical` when empty
pub fn virtual_name(hypervisor: &str) -> &str {
    if hypervisor.is_empty() {
        PHYSICAL
    } else {
        hypervisor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_tokens_are_virtual() {
        for token in [DOCKER, LXC, VMWARE, XEN_UNPRIVILEGED, XEN_HARDWARE, OPENVZ_VE, VSERVER, GCE, KVM] {
            assert!(is_virtual(token), "{} should be virtual", token);
        }
    }

    #[test]
    fn test_host_tokens_are_not_virtual() {
        for token in NON_VIRTUAL {
            assert!(!is_virtual(token), "{} should not be virtual", token);
        }
        assert!(!is_virtual(""));
    }

    #[test]
    fn test_virtual_name() {
        assert_eq!(virtual_name(""), PHYSICAL);
        assert_eq!(virtual_name(XEN_PRIVILEGED), "xen0");
    }
}
