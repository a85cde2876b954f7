use serde::{Deserialize, Serialize};

/// Exit code reported when the process never produced an exit status.
pub const NO_EXIT_CODE: i32 = -1;

/// A failure of the harness itself, as opposed to a failing solution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HarnessFault {
    Timeout { seconds: f64 },
    Launch { message: String },
    Io { message: String },
}

impl HarnessFault {
    pub fn label(&self) -> String {
        match self {
            HarnessFault::Timeout { seconds } => format!("timed out after {}s", seconds),
            HarnessFault::Launch { message } => format!("failed to launch: {}", message),
            HarnessFault::Io { message } => format!("stream capture failed: {}", message),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub index: usize,
    pub input: String,
    pub expected_output: String,
    pub actual_output: String,
    pub passed: bool,
    pub stderr_text: String,
    pub exit_code: i32,
    pub duration_ms: f64,
    #[serde(default)]
    pub fault: Option<HarnessFault>,
}

impl ExecutionResult {
    pub fn is_fault(&self) -> bool {
        self.fault.is_some()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub passed: u32,
    pub failed: u32,
    pub faulted: u32,
    pub total: u32,
}

impl ExecutionSummary {
    pub fn from_results(results: &[ExecutionResult]) -> Self {
        let passed = results.iter().filter(|r| r.passed).count() as u32;
        let faulted = results.iter().filter(|r| r.is_fault()).count() as u32;
        let total = results.len() as u32;

        Self {
            passed,
            failed: total.saturating_sub(passed + faulted),
            faulted,
            total,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.total > 0 && self.passed == self.total
    }
}
