//! Version history reconstruction.
//!
//! The file manager answers point lookups ("version N of this file") but
//! cannot enumerate a feed. History is rebuilt by probing forward from
//! version 0, and by scanning backward from the head when the forward
//! probe finds nothing but the head. Sparse or pruned feeds can still be
//! undercounted; the bounds below are heuristics.

use std::collections::BTreeMap;

use swarmdesk_sdk::{FileInfo, FileManager, SdkErrorKind};
use tracing::debug;

/// Bounds for [`reconstruct_history`].
#[derive(Debug, Clone)]
pub struct HistoryLimits {
    /// Highest version the forward probe will request.
    pub forward_probe_limit: u64,
    /// Consecutive failed lookups tolerated by the backward scan.
    pub max_consecutive_misses: u32,
    /// Hard cap on the number of versions returned.
    pub max_versions: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            forward_probe_limit: 2048,
            max_consecutive_misses: 8,
            max_versions: 4096,
        }
    }
}

/// Lists every reachable version of `head`, newest first.
///
/// The head is always part of the result. Lookup failures are treated as
/// missing versions, never as errors.
pub async fn reconstruct_history(
    fm: &dyn FileManager,
    head: &FileInfo,
    limits: &HistoryLimits,
) -> Vec<FileInfo> {
    let mut found: BTreeMap<u64, FileInfo> = BTreeMap::new();
    found.insert(head.version, head.clone());

    let forward_end = head.version.min(limits.forward_probe_limit);
    for v in 0..=forward_end {
        if found.len() >= limits.max_versions {
            break;
        }
        if v == head.version {
            continue;
        }
        match fm.get_version(head, Some(v)).await {
            Ok(info) => {
                found.insert(info.version, info);
            }
            Err(e) => {
                log_miss(head, v, e.kind);
                break;
            }
        }
    }

    if found.len() == 1 && head.version > 0 {
        let mut misses = 0u32;
        let mut v = head.version;
        while v > 0 && found.len() < limits.max_versions {
            v -= 1;
            match fm.get_version(head, Some(v)).await {
                Ok(info) => {
                    misses = 0;
                    found.insert(info.version, info);
                }
                Err(e) => {
                    log_miss(head, v, e.kind);
                    misses += 1;
                    if misses >= limits.max_consecutive_misses {
                        debug!(topic = %head.topic, at = v, "backward scan gave up");
                        break;
                    }
                }
            }
        }
    }

    debug!(topic = %head.topic, versions = found.len(), "history reconstructed");
    found.into_values().rev().collect()
}

fn log_miss(head: &FileInfo, version: u64, kind: SdkErrorKind) {
    if kind != SdkErrorKind::NotFound {
        debug!(topic = %head.topic, version, kind = ?kind, "version lookup failed");
    }
}
