//! Probes - one virtualization technology per submodule.
//!
//! Each probe is a plain function of the evidence (and, for the fact-based
//! probes, the fact collection) returning a hypervisor identifier, or an
//! empty string when its evidence is absent or inconclusive. `Probe` lists
//! them in precedence order.

pub mod cgroup;
pub mod gce;
pub mod openvz;
pub mod product_name;
pub mod vmware;
pub mod vserver;
pub mod what_vm;
pub mod xen;

use crate::evidence::Evidence;
use crate::facts::FactCollection;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// DMI identification strings exposed by the kernel
pub const DMI_SYS_VENDOR: &str = "/sys/class/dmi/id/sys_vendor";
pub const DMI_PRODUCT_NAME: &str = "/sys/class/dmi/id/product_name";

/// Per-process status, carries the VServer and OpenVZ context ids
pub const PROC_SELF_STATUS: &str = "/proc/self/status";

/// Helper programs the probes may invoke
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperCommands {
    /// virt-what style identification helper
    pub what_vm: String,
    /// VMware host tools, queried with `-v`
    pub vmware: String,
}

impl Default for HelperCommands {
    fn default() -> Self {
        Self {
            what_vm: "virt-what".to_string(),
            vmware: "vmware".to_string(),
        }
    }
}

/// Detection probes, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Probe {
    Cgroup,
    WhatVm,
    Vserver,
    Vmware,
    Openvz,
    Xen,
    Gce,
    ProductName,
}

impl Probe {
    /// Every probe, most trusted first
    pub const ALL: [Probe; 8] = [
        Probe::Cgroup,
        Probe::WhatVm,
        Probe::Vserver,
        Probe::Vmware,
        Probe::Openvz,
        Probe::Xen,
        Probe::Gce,
        Probe::ProductName,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cgroup => "cgroup",
            Self::WhatVm => "what_vm",
            Self::Vserver => "vserver",
            Self::Vmware => "vmware",
            Self::Openvz => "openvz",
            Self::Xen => "xen",
            Self::Gce => "gce",
            Self::ProductName => "product_name",
        }
    }

    /// Run this probe
    pub fn run<E: Evidence + ?Sized>(
        self,
        evidence: &E,
        facts: &dyn FactCollection,
        commands: &HelperCommands,
    ) -> String {
        match self {
            Self::Cgroup => cgroup::probe(evidence),
            Self::WhatVm => what_vm::probe(evidence, &commands.what_vm),
            Self::Vserver => vserver::probe(evidence),
            Self::Vmware => vmware::probe(evidence, &commands.vmware),
            Self::Openvz => openvz::probe(evidence),
            Self::Xen => xen::probe(evidence),
            Self::Gce => gce::probe(facts),
            Self::ProductName => product_name::probe(evidence, facts),
        }
    }
}

impl fmt::Display for Probe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Probe {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Probe::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| anyhow::anyhow!("Unknown probe: '{}'", s))
    }
}

/// Read a pseudo-file, absorbing failures. Missing files are expected and
/// only logged at debug level.
pub(crate) fn read_evidence<E: Evidence + ?Sized>(evidence: &E, path: &str) -> Option<String> {
    match evidence.read_to_string(path) {
        Ok(contents) => Some(contents),
        Err(e) if e.is_absent() => {
            debug!("{}", e);
            None
        }
        Err(e) => {
            warn!("Ignoring unreadable evidence: {}", e);
            None
        }
    }
}

/// Run a helper, absorbing failures the same way as `read_evidence`
pub(crate) fn run_helper<E: Evidence + ?Sized>(
    evidence: &E,
    program: &str,
    args: &[&str],
) -> Option<String> {
    match evidence.run(program, args) {
        Ok(output) => Some(output),
        Err(e) if e.is_absent() => {
            debug!("{}", e);
            None
        }
        Err(e) => {
            warn!("Ignoring helper failure: {}", e);
            None
        }
    }
}

/// Value of the first `name value` line in a /proc status file whose
/// name is one of `names`
pub(crate) fn status_field<'a>(contents: &'a str, names: &[&str]) -> Option<&'a str> {
    contents.lines().find_map(|line| {
        let mut parts = line.split_whitespace();
        let (name, value) = (parts.next()?, parts.next()?);
        if parts.next().is_some() || !names.contains(&name) {
            return None;
        }
        Some(value)
    })
}

/// Whether `needle` occurs in `haystack` as a whole word.
///
/// The match must not be preceded by an alphanumeric character nor followed
/// by a letter, so `VMware7,1` contains `VMware` but `VMwareX` and `NotKVM`
/// do not.
pub fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(|c| c.is_alphanumeric()) && !after.is_some_and(|c| c.is_alphabetic())
    })
}
