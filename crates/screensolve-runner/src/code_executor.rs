use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use screensolve_core::execution::NO_EXIT_CODE;
use screensolve_core::{Example, ExecutionResult, HarnessFault, Language};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};

#[derive(Debug)]
struct ProcessOutput {
    stdout: String,
    stderr: String,
    exit_code: i32,
}

/// Runs a solution program once per example, strictly one at a time.
///
/// Each run is an isolated child process fed the example input on stdin.
/// Non-zero exits and stderr output are reported, not treated as faults;
/// only a failed launch, broken stream capture or a timeout is a
/// [`HarnessFault`].
#[derive(Debug, Clone, Default)]
pub struct CodeExecutor {
    language: Option<Language>,
}

impl CodeExecutor {
    /// `language` forces an interpreter; `None` picks one from the file
    /// extension and executes unknown files directly.
    pub fn new(language: Option<Language>) -> Self {
        Self { language }
    }

    pub async fn run_on_examples(
        &self,
        solution: &Path,
        examples: &[Example],
        timeout: Duration,
    ) -> Vec<ExecutionResult> {
        let mut results = Vec::with_capacity(examples.len());

        for (idx, example) in examples.iter().enumerate() {
            let result = self
                .run_example(solution, idx + 1, example, timeout)
                .await;
            results.push(result);
        }

        results
    }

    /// Runs one example; `index` is its 1-based position in the batch.
    pub async fn run_example(
        &self,
        solution: &Path,
        index: usize,
        example: &Example,
        timeout: Duration,
    ) -> ExecutionResult {
        let start = Instant::now();
        let output = self.execute(solution, &example.input, timeout).await;
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        let result = Self::build_result(index, example, output, duration_ms);
        match &result.fault {
            Some(fault) => tracing::warn!("Example {}: {}", index, fault.label()),
            None => tracing::debug!(
                "Example {}: passed={} exit={} ({:.1}ms)",
                index,
                result.passed,
                result.exit_code,
                duration_ms
            ),
        }
        result
    }

    fn command_for(&self, solution: &Path) -> Command {
        let mut cmd = match self.language.or_else(|| Language::from_path(solution)) {
            Some(language) => {
                let (program, args) = language.launch_command();
                let mut cmd = Command::new(program);
                cmd.args(args).arg(solution);
                cmd
            }
            None => Command::new(executable_path(solution)),
        };

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        cmd
    }

    async fn execute(
        &self,
        solution: &Path,
        input: &str,
        timeout: Duration,
    ) -> Result<ProcessOutput, HarnessFault> {
        if tokio::fs::metadata(solution).await.is_err() {
            return Err(HarnessFault::Launch {
                message: format!("{}: solution file not found", solution.display()),
            });
        }

        let mut child = self
            .command_for(solution)
            .spawn()
            .map_err(|e| HarnessFault::Launch {
                message: format!("{}: {}", solution.display(), e),
            })?;

        let _group = ProcessGroup::new(child.id());

        let result = tokio::time::timeout(timeout, collect_output(&mut child, input)).await;

        match result {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => {
                terminate(&mut child).await;
                Err(HarnessFault::Io {
                    message: e.to_string(),
                })
            }
            Err(_) => {
                terminate(&mut child).await;
                Err(HarnessFault::Timeout {
                    seconds: timeout.as_secs_f64(),
                })
            }
        }
    }

    fn build_result(
        index: usize,
        example: &Example,
        output: Result<ProcessOutput, HarnessFault>,
        duration_ms: f64,
    ) -> ExecutionResult {
        let expected_output = example.output.trim().to_string();

        match output {
            Ok(output) => {
                let actual_output = output.stdout.trim().to_string();
                ExecutionResult {
                    index,
                    input: example.input.trim().to_string(),
                    passed: outputs_match(&actual_output, &expected_output),
                    expected_output,
                    actual_output,
                    stderr_text: output.stderr.trim().to_string(),
                    exit_code: output.exit_code,
                    duration_ms,
                    fault: None,
                }
            }
            Err(fault) => ExecutionResult {
                index,
                input: example.input.trim().to_string(),
                expected_output,
                actual_output: String::new(),
                passed: false,
                stderr_text: String::new(),
                exit_code: NO_EXIT_CODE,
                duration_ms,
                fault: Some(fault),
            },
        }
    }
}

/// Runs `solution` against `examples` with the interpreter implied by its
/// extension.
pub async fn run_on_examples(
    solution: &Path,
    examples: &[Example],
    timeout: Duration,
) -> Vec<ExecutionResult> {
    CodeExecutor::default()
        .run_on_examples(solution, examples, timeout)
        .await
}

/// Exact match after an outer trim. `"[0, 1]"` and `"[0,1]"` differ.
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    actual.trim() == expected.trim()
}

/// A bare file name would be looked up on PATH; anchor it to the cwd.
fn executable_path(solution: &Path) -> PathBuf {
    match solution.components().count() {
        1 if solution.is_relative() => Path::new(".").join(solution),
        _ => solution.to_path_buf(),
    }
}

async fn collect_output(child: &mut Child, input: &str) -> std::io::Result<ProcessOutput> {
    let stdin = child.stdin.take();
    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("stdout not captured"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::other("stderr not captured"))?;

    let write_input = async move {
        if let Some(mut stdin) = stdin {
            match stdin.write_all(input.as_bytes()).await {
                Err(e) if e.kind() != std::io::ErrorKind::BrokenPipe => return Err(e),
                _ => {}
            }
        }
        Ok::<(), std::io::Error>(())
    };

    let mut out = Vec::new();
    let mut err = Vec::new();
    let (_, _, _, status) = tokio::try_join!(
        write_input,
        stdout.read_to_end(&mut out),
        stderr.read_to_end(&mut err),
        child.wait(),
    )?;

    Ok(ProcessOutput {
        stdout: String::from_utf8_lossy(&out).into_owned(),
        stderr: String::from_utf8_lossy(&err).into_owned(),
        exit_code: exit_code(status),
    })
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }

    NO_EXIT_CODE
}

/// Kills and reaps the direct child.
async fn terminate(child: &mut Child) {
    if let Err(e) = child.kill().await {
        tracing::warn!("Failed to kill solution process: {}", e);
    }
}

/// Kills whatever is left of the child's process group when dropped, so
/// grandchildren do not outlive the run on any exit path, including the
/// caller dropping the future.
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Some(pgid) = self.pgid.take() {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            if let Err(e) = killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
                tracing::trace!("killpg({}): {}", pgid, e);
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;
    use tempfile::TempDir;

    const LIMIT: Duration = Duration::from_secs(10);

    fn script(dir: &TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[tokio::test]
    async fn test_echo_passes_when_input_equals_output() {
        let dir = TempDir::new().unwrap();
        let echo = script(&dir, "echo.sh", "cat\n");
        let examples = vec![Example::new("hello", "hello"), Example::new("1 2 3", "1 2 3")];

        let results = run_on_examples(&echo, &examples, LIMIT).await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.passed));
        assert!(results.iter().all(|r| r.exit_code == 0 && r.fault.is_none()));
        assert_eq!(results[0].actual_output, "hello");
    }

    #[tokio::test]
    async fn test_results_keep_input_order() {
        let dir = TempDir::new().unwrap();
        let sleeper = script(&dir, "sleepy.sh", "read n\nsleep \"$n\"\necho \"$n\"\n");
        let examples = vec![
            Example::new("0.3", "0.3"),
            Example::new("0", "0"),
            Example::new("0.1", "0.1"),
        ];

        let results = run_on_examples(&sleeper, &examples, LIMIT).await;

        let indices: Vec<usize> = results.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        let inputs: Vec<&str> = results.iter().map(|r| r.input.as_str()).collect();
        assert_eq!(inputs, vec!["0.3", "0", "0.1"]);
        assert!(results.iter().all(|r| r.passed));
    }

    #[tokio::test]
    async fn test_timeout_is_a_fault_and_does_not_block_next_example() {
        let dir = TempDir::new().unwrap();
        let spin = script(&dir, "spin.sh", "read x\nif [ \"$x\" = loop ]; then while :; do :; done; fi\necho \"$x\"\n");
        let examples = vec![Example::new("loop", ""), Example::new("ok", "ok")];

        let start = Instant::now();
        let results = run_on_examples(&spin, &examples, Duration::from_secs(1)).await;

        assert!(start.elapsed() < Duration::from_secs(8));
        assert_eq!(results[0].fault, Some(HarnessFault::Timeout { seconds: 1.0 }));
        assert!(!results[0].passed);
        assert_eq!(results[0].exit_code, NO_EXIT_CODE);
        assert!(results[1].passed);
        assert!(results[1].fault.is_none());
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_timeout_kills_grandchildren() {
        let dir = TempDir::new().unwrap();
        let pidfile = dir.path().join("sleep.pid");
        let nested = script(
            &dir,
            "nested.sh",
            &format!("sleep 30 &\necho $! > '{}'\nwait\n", pidfile.display()),
        );

        let start = Instant::now();
        let results = run_on_examples(&nested, &[Example::new("", "")], Duration::from_secs(1)).await;

        assert!(start.elapsed() < Duration::from_secs(8));
        assert!(matches!(results[0].fault, Some(HarnessFault::Timeout { .. })));

        let pid = crate::process_check::read_pid(&pidfile);
        assert!(
            crate::process_check::wait_for_exit(pid, Duration::from_secs(2)).await,
            "grandchild {} outlived the timed-out run",
            pid
        );
    }

    #[tokio::test]
    async fn test_sub_second_timeout() {
        let dir = TempDir::new().unwrap();
        let slow = script(&dir, "slow.sh", "sleep 5\necho late\n");

        let start = Instant::now();
        let results = run_on_examples(&slow, &[Example::new("", "late")], Duration::from_millis(300)).await;

        assert!(start.elapsed() < Duration::from_secs(3));
        assert_eq!(results[0].fault, Some(HarnessFault::Timeout { seconds: 0.3 }));
    }

    #[tokio::test]
    async fn test_trailing_whitespace_is_trimmed_but_format_is_exact() {
        let dir = TempDir::new().unwrap();
        let five = script(&dir, "five.sh", "printf '5 \\n'\n");
        let examples = vec![Example::new("", "5"), Example::new("", "5.0")];

        let results = run_on_examples(&five, &examples, LIMIT).await;

        assert!(results[0].passed);
        assert!(!results[1].passed);
        assert_eq!(results[1].actual_output, "5");
        assert!(results[1].fault.is_none());
    }

    #[tokio::test]
    async fn test_nonzero_exit_and_stderr_are_reported_not_faults() {
        let dir = TempDir::new().unwrap();
        let failing = script(&dir, "fail.sh", "echo partial\necho boom >&2\nexit 3\n");

        let results = run_on_examples(&failing, &[Example::new("x", "partial")], LIMIT).await;

        assert!(results[0].fault.is_none());
        assert!(results[0].passed);
        assert_eq!(results[0].exit_code, 3);
        assert_eq!(results[0].stderr_text, "boom");
    }

    #[tokio::test]
    async fn test_solution_that_ignores_stdin() {
        let dir = TempDir::new().unwrap();
        let ignore = script(&dir, "ignore.sh", "echo done\n");
        let big_input = "x".repeat(1 << 20);

        let results = run_on_examples(&ignore, &[Example::new(&big_input, "done")], LIMIT).await;

        assert!(results[0].fault.is_none());
        assert!(results[0].passed);
    }

    #[tokio::test]
    async fn test_missing_solution_faults_every_example() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let examples = vec![Example::new("1", "1"), Example::new("2", "2")];

        let results = run_on_examples(&missing, &examples, LIMIT).await;

        assert_eq!(results.len(), 2);
        assert!(results
            .iter()
            .all(|r| matches!(r.fault, Some(HarnessFault::Launch { .. }))));
    }

    #[tokio::test]
    async fn test_language_override() {
        let dir = TempDir::new().unwrap();
        let no_ext = script(&dir, "solution", "read a b\necho $((a + b))\n");
        let executor = CodeExecutor::new(Some(Language::Shell));

        let results = executor
            .run_on_examples(&no_ext, &[Example::new("2 3", "5")], LIMIT)
            .await;

        assert!(results[0].passed, "{:?}", results[0]);
    }

    #[tokio::test]
    async fn test_does_not_modify_inputs() {
        let dir = TempDir::new().unwrap();
        let echo = script(&dir, "echo.sh", "cat\n");
        let examples = vec![Example::new("a", "b")];
        let before = std::fs::read_to_string(&echo).unwrap();

        let results = run_on_examples(&echo, &examples, LIMIT).await;

        assert!(!results[0].passed);
        assert_eq!(examples, vec![Example::new("a", "b")]);
        assert_eq!(std::fs::read_to_string(&echo).unwrap(), before);
    }

    #[test]
    fn test_outputs_match_is_exact() {
        assert!(outputs_match("5 ", "5"));
        assert!(outputs_match("\n[0,1]\n", "[0,1]"));
        assert!(!outputs_match("[0, 1]", "[0,1]"));
        assert!(!outputs_match("5.0", "5"));
    }
}
