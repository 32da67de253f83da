//! Resident memory of the current process, sampled through sysinfo

use sysinfo::{Pid, System};

pub struct ProcessMemory {
    system: System,
    pid: Option<Pid>,
}

impl ProcessMemory {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::debug!("memory sampling unavailable: {e}");
                None
            }
        };
        Self {
            system: System::new(),
            pid,
        }
    }

    /// Resident set size in bytes, or `None` where the platform cannot report it.
    pub fn resident(&mut self) -> Option<u64> {
        let pid = self.pid?;
        if !self.system.refresh_process(pid) {
            return None;
        }
        self.system.process(pid).map(|process| process.memory())
    }
}

impl Default for ProcessMemory {
    fn default() -> Self {
        Self::new()
    }
}
