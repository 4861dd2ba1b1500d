// Run lock
//
// A PID file keeps two schedulers from booking against the same account.
// Stale files (dead or unreadable PID) are replaced; the file is removed on
// release or drop.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Held for the lifetime of a `run` process
#[derive(Debug)]
pub struct RunLock {
    pid_file: PathBuf,
    released: bool,
}

impl RunLock {
    /// Take the lock, refusing when the file names a live process
    pub fn acquire(pid_file: impl Into<PathBuf>) -> Result<Self> {
        let pid_file = pid_file.into();

        if let Some(parent) = pid_file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        if pid_file.exists() {
            match read_pid(&pid_file) {
                Ok(pid) if pid != std::process::id() && process_exists(pid) => {
                    bail!(
                        "courtbook is already running (pid {}, lock {})",
                        pid,
                        pid_file.display()
                    );
                }
                Ok(pid) => {
                    info!(pid = pid, "Removing stale PID file");
                }
                Err(e) => {
                    warn!("Unreadable PID file ({}). Replacing...", e);
                }
            }
        }

        let pid = std::process::id();
        fs::write(&pid_file, pid.to_string())
            .with_context(|| format!("Failed to write PID file: {}", pid_file.display()))?;
        info!(pid = pid, path = %pid_file.display(), "Run lock acquired");

        Ok(Self {
            pid_file,
            released: false,
        })
    }

    pub fn pid_file(&self) -> &Path {
        &self.pid_file
    }

    /// Remove the PID file
    pub fn release(mut self) -> Result<()> {
        self.remove()
    }

    fn remove(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        // Only our own file is removed
        if matches!(read_pid(&self.pid_file), Ok(pid) if pid == std::process::id()) {
            fs::remove_file(&self.pid_file).with_context(|| {
                format!("Failed to remove PID file: {}", self.pid_file.display())
            })?;
            info!("Run lock released");
        }
        Ok(())
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = self.remove() {
            warn!("{:#}", e);
        }
    }
}

/// PID recorded in a lock file
pub fn read_pid(pid_file: &Path) -> Result<u32> {
    let pid_str = fs::read_to_string(pid_file)
        .with_context(|| format!("Failed to read PID file: {}", pid_file.display()))?;
    pid_str
        .trim()
        .parse()
        .with_context(|| format!("Invalid PID in file: {}", pid_str.trim()))
}

/// Check if a process with the given PID exists
#[cfg(target_family = "unix")]
fn process_exists(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    // 0 and negative values address process groups, not a process
    let raw = match i32::try_from(pid) {
        Ok(raw) if raw > 0 => raw,
        _ => return false,
    };

    // signal 0 probes without delivering anything
    kill(Pid::from_raw(raw), None).is_ok()
}

#[cfg(target_family = "windows")]
fn process_exists(pid: u32) -> bool {
    use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

    if pid == 0 {
        return false;
    }

    let mut system = System::new();
    system.refresh_processes_specifics(ProcessesToUpdate::All, ProcessRefreshKind::nothing());
    system.process(Pid::from(pid as usize)).is_some()
}
