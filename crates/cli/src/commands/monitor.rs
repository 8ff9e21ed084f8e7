use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use sysinfo::{Disks, System};

use crate::ui;

/// Percentage thresholds for the colored readouts.
const WARN_PCT: f32 = 70.0;
const CRIT_PCT: f32 = 90.0;

/// Watch system resource usage
#[derive(Args)]
pub struct MonitorCommand {
    /// Only show processes whose name contains this string
    #[arg(long)]
    service: Option<String>,

    /// Seconds between samples
    #[arg(long, default_value_t = 5)]
    interval: u64,

    /// Number of samples to take
    #[arg(long, default_value_t = 1)]
    count: u32,

    /// Append samples as CSV to this file
    #[arg(long, value_name = "FILE")]
    output: Option<String>,
}

/// One resource sample.
pub(crate) struct Snapshot {
    pub cpu_pct: f32,
    pub mem_pct: f32,
    pub disk_pct: f32,
}

pub(crate) fn snapshot(sys: &mut System) -> Snapshot {
    sys.refresh_cpu_usage();
    sys.refresh_memory();

    let mem_pct = if sys.total_memory() == 0 {
        0.0
    } else {
        sys.used_memory() as f32 / sys.total_memory() as f32 * 100.0
    };

    let disks = Disks::new_with_refreshed_list();
    let (total, available) = disks
        .iter()
        .fold((0u64, 0u64), |(t, a), d| (t + d.total_space(), a + d.available_space()));
    let disk_pct = if total == 0 {
        0.0
    } else {
        (total - available) as f32 / total as f32 * 100.0
    };

    Snapshot {
        cpu_pct: sys.global_cpu_usage(),
        mem_pct,
        disk_pct,
    }
}

pub(crate) fn colored_pct(pct: f32) -> String {
    let rendered = format!("{pct:5.1}%");
    if pct >= CRIT_PCT {
        rendered.red().bold().to_string()
    } else if pct >= WARN_PCT {
        rendered.yellow().to_string()
    } else {
        rendered.green().to_string()
    }
}

impl MonitorCommand {
    pub fn run(&self) -> Result<()> {
        let mut sys = System::new_all();
        // First CPU reading is meaningless; prime it.
        sys.refresh_cpu_usage();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);

        let mut csv = match &self.output {
            Some(path) => {
                let file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .with_context(|| format!("cannot open {path}"))?;
                Some(file)
            }
            None => None,
        };

        for sample in 0..self.count {
            if sample > 0 {
                std::thread::sleep(Duration::from_secs(self.interval));
            }
            let snap = snapshot(&mut sys);

            println!(
                "{}  cpu {}  mem {}  disk {}",
                chrono::Local::now().format("%H:%M:%S").to_string().bright_black(),
                colored_pct(snap.cpu_pct),
                colored_pct(snap.mem_pct),
                colored_pct(snap.disk_pct)
            );

            if let Some(service) = &self.service {
                sys.refresh_all();
                let needle = service.to_lowercase();
                let mut found = false;
                for process in sys.processes().values() {
                    let name = process.name().to_string_lossy().to_lowercase();
                    if !name.contains(&needle) {
                        continue;
                    }
                    found = true;
                    println!(
                        "    {:<24} cpu {:5.1}%  mem {} MiB",
                        process.name().to_string_lossy(),
                        process.cpu_usage(),
                        process.memory() / 1024 / 1024
                    );
                }
                if !found {
                    ui::print_warning(&format!("No process matching '{service}'"));
                }
            }

            if let Some(file) = &mut csv {
                writeln!(
                    file,
                    "{},{:.1},{:.1},{:.1}",
                    chrono::Utc::now().to_rfc3339(),
                    snap.cpu_pct,
                    snap.mem_pct,
                    snap.disk_pct
                )?;
            }
        }

        if let Some(path) = &self.output {
            ui::print_info(&format!("Samples appended to {path}"));
        }
        Ok(())
    }
}
