use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Benchmark scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// One large text sealed as a single stream envelope
    Block,
    /// Many small texts, each sealed as its own stream envelope
    Chunks,
    /// Many small texts through two-tier entity-key wrapping
    Items,
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scenario::Block => write!(f, "block"),
            Scenario::Chunks => write!(f, "chunks"),
            Scenario::Items => write!(f, "items"),
        }
    }
}

/// A timed phase of a benchmark run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Init,
    Encrypt,
    Decrypt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub phase: Phase,
    pub elapsed: Duration,
    /// Bytes processed in this phase (0 for init)
    pub bytes: u64,
    /// Process resident memory in bytes, sampled around the phase
    #[serde(default)]
    pub memory_before: Option<u64>,
    #[serde(default)]
    pub memory_after: Option<u64>,
}

impl PhaseTiming {
    /// Throughput in MiB/s, or `None` for phases that process no data
    pub fn throughput_mib_s(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        if self.bytes == 0 || secs == 0.0 {
            return None;
        }
        Some(self.bytes as f64 / (1024.0 * 1024.0) / secs)
    }

    /// Resident memory change across the phase, when both samples exist
    pub fn memory_delta(&self) -> Option<i64> {
        Some(self.memory_after? as i64 - self.memory_before? as i64)
    }
}

/// Outcome of one scenario run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    pub items: usize,
    pub plaintext_bytes: u64,
    pub envelope_bytes: u64,
    pub failures: usize,
    pub phases: Vec<PhaseTiming>,
    /// Resident memory once the scenario's buffers have been dropped
    #[serde(default)]
    pub memory_settled: Option<u64>,
}

impl ScenarioReport {
    pub fn phase(&self, phase: Phase) -> Option<&PhaseTiming> {
        self.phases.iter().find(|t| t.phase == phase)
    }

    /// Envelope bytes per plaintext byte
    pub fn expansion(&self) -> f64 {
        if self.plaintext_bytes == 0 {
            return 0.0;
        }
        self.envelope_bytes as f64 / self.plaintext_bytes as f64
    }
}
