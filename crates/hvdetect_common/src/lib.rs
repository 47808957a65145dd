//! hvdetect common - Linux virtualization detection
//!
//! Works out whether the host is a VM or container guest, and which
//! technology hosts it, from cgroups, /proc, DMI strings, helper tools and
//! previously resolved facts.

pub mod config;
pub mod detector;
pub mod error;
pub mod evidence;
pub mod facts;
pub mod probes;
pub mod resolver;
pub mod vm;

pub use config::DetectorConfig;
pub use detector::{Detection, VirtualizationDetector};
pub use error::EvidenceError;
pub use evidence::{Evidence, HostEvidence, MemoryEvidence};
pub use facts::{FactCollection, Facts};
pub use probes::{HelperCommands, Probe};
pub use resolver::{VirtualizationData, VirtualizationResolver};
