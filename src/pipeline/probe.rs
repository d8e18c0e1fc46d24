//! Host resource sampling (CPU and memory percentages)

use std::time::{Duration, Instant};

use sysinfo::System;

/// Resource usage at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceSample {
    /// Global CPU usage, 0-100
    pub cpu_percent: f64,
    /// Used memory over total memory, 0-100
    pub mem_percent: f64,
}

/// Source of resource samples, read once per recorded iteration.
pub trait ResourceProbe {
    /// Take a sample.
    fn sample(&mut self) -> ResourceSample;
}

/// Probe backed by `sysinfo`.
///
/// CPU usage is computed between consecutive refreshes, so CPU reads as zero
/// until the first refresh after construction. Refreshes closer together than
/// `min_interval` (default [`sysinfo::MINIMUM_CPU_UPDATE_INTERVAL`]) return
/// the cached sample instead of touching the OS.
pub struct SysinfoProbe {
    system: System,
    last: ResourceSample,
    refreshed_at: Instant,
    min_interval: Duration,
    refreshes: u64,
}

impl SysinfoProbe {
    /// Create a probe and take the baseline CPU and memory reading.
    #[must_use]
    pub fn new() -> Self {
        let mut probe = Self {
            system: System::new(),
            last: ResourceSample::default(),
            refreshed_at: Instant::now(),
            min_interval: sysinfo::MINIMUM_CPU_UPDATE_INTERVAL,
            refreshes: 0,
        };
        probe.last = probe.refresh();
        probe
    }

    /// Override the minimum time between OS refreshes.
    #[must_use]
    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// OS refreshes taken by [`ResourceProbe::sample`] so far.
    #[must_use]
    pub const fn refreshes(&self) -> u64 {
        self.refreshes
    }

    #[allow(clippy::cast_precision_loss)]
    fn refresh(&mut self) -> ResourceSample {
        self.system.refresh_cpu_usage();
        self.system.refresh_memory();

        let total = self.system.total_memory();
        let mem_percent = if total == 0 {
            0.0
        } else {
            self.system.used_memory() as f64 / total as f64 * 100.0
        };

        ResourceSample {
            cpu_percent: f64::from(self.system.global_cpu_usage()),
            mem_percent,
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceProbe for SysinfoProbe {
    fn sample(&mut self) -> ResourceSample {
        if self.refreshed_at.elapsed() < self.min_interval {
            return self.last;
        }
        self.last = self.refresh();
        self.refreshed_at = Instant::now();
        self.refreshes += 1;
        self.last
    }
}

/// Probe returning a constant sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedProbe(pub ResourceSample);

impl ResourceProbe for FixedProbe {
    fn sample(&mut self) -> ResourceSample {
        self.0
    }
}
