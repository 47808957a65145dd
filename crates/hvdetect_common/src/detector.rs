//! Virtualization Detector
//!
//! Runs the probes in precedence order and keeps the first conclusive
//! answer. Kernel-asserted evidence (cgroups) comes first, vendor-set DMI
//! product names last.

use crate::config::DetectorConfig;
use crate::evidence::{Evidence, HostEvidence};
use crate::facts::FactCollection;
use crate::probes::{HelperCommands, Probe};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Outcome of a detection run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    /// Identifier of the detected technology, empty if none
    pub hypervisor: String,

    /// Probe that produced the identifier
    pub probe: Option<Probe>,
}

/// Linux virtualization detector
pub struct VirtualizationDetector<E: Evidence = HostEvidence> {
    evidence: E,
    commands: HelperCommands,
    disabled: Vec<Probe>,
}

impl VirtualizationDetector<HostEvidence> {
    /// Detector over the running system
    pub fn new() -> Self {
        Self::with_evidence(HostEvidence::new())
    }

    /// Detector configured from `config`
    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::with_evidence(config.evidence())
            .commands(config.helper_commands())
            .disable(&config.disabled_probes)
    }
}

impl Default for VirtualizationDetector<HostEvidence> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Evidence> VirtualizationDetector<E> {
    pub fn with_evidence(evidence: E) -> Self {
        Self {
            evidence,
            commands: HelperCommands::default(),
            disabled: Vec::new(),
        }
    }

    pub fn commands(mut self, commands: HelperCommands) -> Self {
        self.commands = commands;
        self
    }

    /// Skip `probes`; the rest keep their order
    pub fn disable(mut self, probes: &[Probe]) -> Self {
        self.disabled.extend_from_slice(probes);
        self
    }

    pub fn evidence(&self) -> &E {
        &self.evidence
    }

    /// Probes that will run, in order
    pub fn enabled_probes(&self) -> impl Iterator<Item = Probe> + '_ {
        Probe::ALL
            .into_iter()
            .filter(move |probe| !self.disabled.contains(probe))
    }

    /// Name of the hypervisor, or an empty string when none was detected
    pub fn get_hypervisor(&self, facts: &dyn FactCollection) -> String {
        self.detect(facts).hypervisor
    }

    /// First conclusive probe result, with the probe that produced it
    pub fn detect(&self, facts: &dyn FactCollection) -> Detection {
        for probe in self.enabled_probes() {
            let hypervisor = probe.run(&self.evidence, facts, &self.commands);
            if !hypervisor.is_empty() {
                info!("Detected {} via {} probe", hypervisor, probe);
                return Detection {
                    hypervisor,
                    probe: Some(probe),
                };
            }
            debug!("{} probe inconclusive", probe);
        }

        info!("No virtualization detected");
        Detection {
            hypervisor: String::new(),
            probe: None,
        }
    }

    /// Run every enabled probe regardless of precedence
    pub fn run_all(&self, facts: &dyn FactCollection) -> Vec<(Probe, String)> {
        self.enabled_probes()
            .map(|probe| (probe, probe.run(&self.evidence, facts, &self.commands)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::MemoryEvidence;
    use crate::facts::{self, Facts};
    use crate::probes::{DMI_PRODUCT_NAME, DMI_SYS_VENDOR};

    fn detector(evidence: MemoryEvidence) -> VirtualizationDetector<MemoryEvidence> {
        VirtualizationDetector::with_evidence(evidence)
    }

    #[test]
    fn test_nothing_detected() {
        let evidence = MemoryEvidence::new()
            .file("/proc/self/cgroup", "0::/user.slice\n")
            .file("/proc/self/status", "Name:\tsh\n")
            .file(DMI_SYS_VENDOR, "LENOVO\n")
            .file(DMI_PRODUCT_NAME, "20XW004GUS\n");
        let detection = detector(evidence).detect(&Facts::new().with(facts::GCE, false));

        assert_eq!(detection.hypervisor, "");
        assert_eq!(detection.probe, None);
    }

    #[test]
    fn test_cgroup_beats_dmi() {
        let evidence = MemoryEvidence::new()
            .file("/proc/self/cgroup", "0::/system.slice/docker-ab12.scope\n")
            .file(DMI_SYS_VENDOR, "VMware, Inc.\n")
            .file(DMI_PRODUCT_NAME, "VMware Virtual Platform\n");
        let detection = detector(evidence).detect(&Facts::new());

        assert_eq!(detection.hypervisor, "docker");
        assert_eq!(detection.probe, Some(Probe::Cgroup));
    }

    #[test]
    fn test_helper_beats_vmware_dmi() {
        let evidence = MemoryEvidence::new()
            .command("virt-what", "vmware\n")
            .file(DMI_SYS_VENDOR, "VMware, Inc.\n");
        let detection = detector(evidence).detect(&Facts::new());
        assert_eq!(detection.probe, Some(Probe::WhatVm));
    }

    #[test]
    fn test_gce_fact_beats_product_name() {
        let evidence = MemoryEvidence::new().file(DMI_PRODUCT_NAME, "KVM\n");
        let facts = Facts::new().with(facts::GCE, true);
        assert_eq!(detector(evidence).get_hypervisor(&facts), "gce");
    }

    #[test]
    fn test_disabled_probe_is_skipped() {
        let evidence = MemoryEvidence::new()
            .file("/proc/self/cgroup", "4:cpu:/lxc/web01\n")
            .file(DMI_PRODUCT_NAME, "VirtualBox\n");
        let detector = detector(evidence).disable(&[Probe::Cgroup]);

        let detection = detector.detect(&Facts::new());
        assert_eq!(detection.hypervisor, "virtualbox");
        assert_eq!(detection.probe, Some(Probe::ProductName));
        assert_eq!(detector.enabled_probes().count(), 7);
    }

    #[test]
    fn test_custom_helper_commands() {
        let evidence = MemoryEvidence::new().command("/opt/bin/virt-what", "bhyve\n");
        let detector = detector(evidence).commands(HelperCommands {
            what_vm: "/opt/bin/virt-what".to_string(),
            vmware: "vmware".to_string(),
        });
        assert_eq!(detector.get_hypervisor(&Facts::new()), "bhyve");
    }

    #[test]
    fn test_run_all_reports_every_probe() {
        let evidence = MemoryEvidence::new()
            .file("/proc/self/cgroup", "4:cpu:/lxc/web01\n")
            .file(DMI_SYS_VENDOR, "VMware, Inc.\n");
        let results = detector(evidence).run_all(&Facts::new());

        assert_eq!(results.len(), Probe::ALL.len());
        assert_eq!(results[0], (Probe::Cgroup, "lxc".to_string()));
        assert_eq!(results[3], (Probe::Vmware, "vmware".to_string()));
        assert_eq!(results[5], (Probe::Xen, String::new()));
    }
}
