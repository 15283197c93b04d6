// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! System gauges reported at check-in.

use armada_core::WorkerStats;
use std::path::Path;
use sysinfo::{Disks, System};

/// Collect the current system gauges. Counters stay zero; they are
/// maintained by the primary, which merges only the gauges.
pub fn collect(content_dir: &Path) -> WorkerStats {
    let mut system = System::new();
    system.refresh_memory();
    system.refresh_cpu_usage();

    let load = System::load_average();
    let total_memory = system.total_memory();
    let memory_percent = if total_memory > 0 {
        (system.used_memory() as f64 / total_memory as f64) * 100.0
    } else {
        0.0
    };

    let (disk_percent, disk_free_gb) = disk_usage(content_dir);

    WorkerStats {
        load_1m: load.one,
        cpu_percent: system.global_cpu_usage() as f64,
        memory_percent,
        memory_available_mb: system.available_memory() / (1024 * 1024),
        disk_percent,
        disk_free_gb,
        ..Default::default()
    }
}

/// Usage of the disk holding the content directory.
fn disk_usage(content_dir: &Path) -> (f64, u64) {
    let disks = Disks::new_with_refreshed_list();
    let best = disks
        .list()
        .iter()
        .filter(|d| content_dir.starts_with(d.mount_point()))
        .max_by_key(|d| d.mount_point().as_os_str().len());
    match best {
        Some(disk) if disk.total_space() > 0 => {
            let used = disk.total_space() - disk.available_space();
            let percent = (used as f64 / disk.total_space() as f64) * 100.0;
            (percent, disk.available_space() / (1024 * 1024 * 1024))
        }
        _ => (0.0, 0),
    }
}
