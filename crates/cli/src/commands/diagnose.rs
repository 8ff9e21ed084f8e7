use std::process::Command;

use anyhow::Result;
use clap::Args;
use sysinfo::System;

use crate::commands::monitor::{colored_pct, snapshot};
use crate::ui;

/// Summarize system and service health
#[derive(Args)]
pub struct DiagnoseCommand {
    /// Also check one systemd service
    #[arg(long)]
    service: Option<String>,

    /// Include recent service logs
    #[arg(long)]
    logs: bool,
}

impl DiagnoseCommand {
    pub fn run(&self) -> Result<()> {
        ui::print_section("System diagnosis");

        let mut sys = System::new_all();
        sys.refresh_cpu_usage();
        std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
        let snap = snapshot(&mut sys);

        ui::print_detail("cpu", &colored_pct(snap.cpu_pct));
        ui::print_detail("memory", &colored_pct(snap.mem_pct));
        ui::print_detail("disk", &colored_pct(snap.disk_pct));

        let mut suggestions = Vec::new();
        if snap.mem_pct >= 90.0 {
            suggestions.push("memory is nearly exhausted, check for leaking processes");
        }
        if snap.disk_pct >= 90.0 {
            suggestions.push("disk is nearly full, clear logs or old deployments");
        }
        if snap.cpu_pct >= 90.0 {
            suggestions.push("CPU is saturated, inspect heavy processes with 'stratus monitor'");
        }

        if let Some(service) = &self.service {
            println!();
            ui::print_step(&format!("Service {service}"));
            run_and_print("systemctl", &["status", service, "--no-pager", "-n", "0"]);
            if self.logs {
                println!();
                ui::print_step("Recent logs");
                run_and_print("journalctl", &["-u", service, "-n", "20", "--no-pager"]);
            }
        }

        println!();
        if suggestions.is_empty() {
            ui::print_success("No resource problems detected");
        } else {
            for suggestion in suggestions {
                ui::print_warning(suggestion);
            }
        }
        Ok(())
    }
}

/// Best-effort external diagnostic; a missing tool is reported, not
/// fatal.
fn run_and_print(program: &str, args: &[&str]) {
    match Command::new(program).args(args).output() {
        Ok(output) => {
            print!("{}", String::from_utf8_lossy(&output.stdout));
            if !output.status.success() {
                print!("{}", String::from_utf8_lossy(&output.stderr));
            }
        }
        Err(_) => ui::print_warning(&format!("'{program}' is not available")),
    }
}
