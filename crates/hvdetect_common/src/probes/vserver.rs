//! Linux-VServer context id

use super::{read_evidence, status_field, PROC_SELF_STATUS};
use crate::evidence::Evidence;
use crate::vm;

/// Older kernels use s_context, newer ones VxID
const CONTEXT_FIELDS: &[&str] = &["s_context:", "VxID:"];

pub fn probe<E: Evidence + ?Sized>(evidence: &E) -> String {
    let Some(status) = read_evidence(evidence, PROC_SELF_STATUS) else {
        return String::new();
    };

    match status_field(&status, CONTEXT_FIELDS) {
        Some("0") => vm::VSERVER_HOST.to_string(),
        Some(_) => vm::VSERVER.to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::MemoryEvidence;

    fn with_status(status: &str) -> MemoryEvidence {
        MemoryEvidence::new().file(PROC_SELF_STATUS, status)
    }

    #[test]
    fn test_guest_context() {
        assert_eq!(probe(&with_status("Name:\tsh\nVxID:\t40012\n")), "vserver");
        assert_eq!(probe(&with_status("Name:\tsh\ns_context: 12\n")), "vserver");
    }

    #[test]
    fn test_host_context() {
        assert_eq!(probe(&with_status("Name:\tsh\nVxID:\t0\n")), "vserver_host");
    }

    #[test]
    fn test_stock_kernel_has_no_context() {
        assert_eq!(probe(&with_status("Name:\tsh\nState:\tR (running)\nPid:\t42\n")), "");
    }

    #[test]
    fn test_unreadable_status() {
        assert_eq!(probe(&MemoryEvidence::new()), "");
        assert_eq!(probe(&MemoryEvidence::new().unreadable(PROC_SELF_STATUS)), "");
    }
}
