//! Container runtimes visible in cgroup membership

use super::read_evidence;
use crate::evidence::Evidence;
use crate::vm;
use tracing::debug;

/// Own membership first, then init's when ours carries no marker
const CGROUP_FILES: &[&str] = &["/proc/self/cgroup", "/proc/1/cgroup"];

pub fn probe<E: Evidence + ?Sized>(evidence: &E) -> String {
    for path in CGROUP_FILES {
        let Some(contents) = read_evidence(evidence, path) else {
            continue;
        };
        if let Some(runtime) = scan(&contents) {
            debug!("cgroup probe: {} in {}", runtime, path);
            return runtime.to_string();
        }
    }
    String::new()
}

/// Find a container marker in `id:controllers:path` lines
pub fn scan(contents: &str) -> Option<&'static str> {
    contents
        .lines()
        .filter_map(|line| line.splitn(3, ':').nth(2))
        .flat_map(|path| path.split('/'))
        .find_map(classify_segment)
}

fn classify_segment(segment: &str) -> Option<&'static str> {
    // docker.service is the daemon on the host, not a container
    if segment == "docker" || (segment.starts_with("docker-") && segment.ends_with(".scope")) {
        return Some(vm::DOCKER);
    }
    if segment == "lxc" || segment.starts_with("lxc.payload") || segment.starts_with("lxc.monitor") {
        return Some(vm::LXC);
    }
    // conmon runs on the host in libpod-conmon-<id>.scope
    if segment == "libpod_parent"
        || (segment.starts_with("libpod-") && !segment.starts_with("libpod-conmon-"))
    {
        return Some(vm::PODMAN);
    }
    None
}
