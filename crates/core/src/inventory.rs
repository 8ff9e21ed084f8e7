//! Temporary ansible inventories.
//!
//! One inventory file is written per install run and removed when the
//! returned handle drops, so callers must keep it alive for the
//! duration of the playbook run.

use std::io::Write;

use tempfile::NamedTempFile;

use crate::record::InstanceRef;
use crate::Result;

/// Write a single-host INI inventory for `instance`.
///
/// The host lands in the `target` group to match the playbooks' `hosts:
/// target` convention.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created or written.
pub fn write_inventory(
    instance: &InstanceRef,
    user: &str,
    ssh_key: Option<&str>,
) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "[target]")?;
    match ssh_key {
        Some(key) => writeln!(
            file,
            "{} ansible_user={user} ansible_ssh_private_key_file={key}",
            instance.ip
        )?,
        None => writeln!(file, "{} ansible_user={user}", instance.ip)?,
    }
    writeln!(file)?;
    writeln!(file, "[all:vars]")?;
    writeln!(file, "ansible_python_interpreter=/usr/bin/python3")?;
    file.flush()?;
    Ok(file)
}
