use std::path::{Path, PathBuf};

use screensolve_core::{
    Example, ExecutionResult, ExecutionSummary, ProblemRecord, Result, ScreenCapture,
    SolutionGenerator, SolverConfig, TextExtractor,
};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::code_executor::CodeExecutor;
use crate::solution::write_solution;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SolveEvent {
    Parsed { title: String, examples: u32 },
    NoExamples,
    GeneratingSolution,
    SolutionWritten { path: PathBuf },
    ExecutingExamples { total: u32 },
    ExampleResult { result: ExecutionResult },
    Done { summary: ExecutionSummary },
    Cancelled,
    Error { message: String },
}

/// Capture → OCR → parse → generate → execute, over pluggable collaborators.
pub struct SolvePipeline {
    config: SolverConfig,
    capture: Box<dyn ScreenCapture>,
    ocr: Box<dyn TextExtractor>,
    generator: Box<dyn SolutionGenerator>,
    executor: CodeExecutor,
}

impl SolvePipeline {
    pub fn new(
        config: SolverConfig,
        capture: Box<dyn ScreenCapture>,
        ocr: Box<dyn TextExtractor>,
        generator: Box<dyn SolutionGenerator>,
    ) -> Self {
        let executor = CodeExecutor::new(Some(config.defaults.language));
        Self {
            config,
            capture,
            ocr,
            generator,
            executor,
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn generator_name(&self) -> &str {
        self.generator.name()
    }

    pub async fn capture(&self) -> Result<PathBuf> {
        self.capture.capture(&self.config.paths.screenshot).await
    }

    /// OCR each image in order and join the non-empty texts.
    pub async fn extract(&self, images: &[PathBuf]) -> Result<String> {
        let mut texts = Vec::with_capacity(images.len());

        for image in images {
            let text = self.ocr.extract_text(image).await?;
            match text.trim() {
                "" => tracing::warn!("No text extracted from {}", image.display()),
                trimmed => texts.push(trimmed.to_string()),
            }
        }

        Ok(texts.join("\n"))
    }

    pub fn parse(&self, problem_text: &str) -> ProblemRecord {
        screensolve_parser::parse_problem(problem_text)
    }

    /// Generates a solution for the full problem text and writes it to the
    /// solution path.
    pub async fn generate(&self, problem_text: &str) -> Result<PathBuf> {
        let language = self.config.defaults.language;
        tracing::info!(
            "Generating {} solution with {}",
            language.label(),
            self.generator.name()
        );

        let source = self
            .generator
            .generate_solution(problem_text, language)
            .await?;
        let path = self.config.solution_path();
        write_solution(&path, &source).await?;
        Ok(path)
    }

    pub async fn execute(&self, solution: &Path, examples: &[Example]) -> Vec<ExecutionResult> {
        self.executor
            .run_on_examples(solution, examples, self.config.timeout())
            .await
    }

    pub async fn run_streaming(
        &self,
        problem_text: &str,
        cancel_token: CancellationToken,
        tx: mpsc::Sender<SolveEvent>,
    ) {
        if cancel_token.is_cancelled() {
            let _ = tx.send(SolveEvent::Cancelled).await;
            return;
        }

        let record = self.parse(problem_text);
        let _ = tx
            .send(SolveEvent::Parsed {
                title: record.title.clone(),
                examples: record.example_count() as u32,
            })
            .await;

        let examples = match record.examples.is_empty() {
            true => {
                let _ = tx.send(SolveEvent::NoExamples).await;
                vec![whole_text_example(problem_text)]
            }
            false => record.examples,
        };

        let _ = tx.send(SolveEvent::GeneratingSolution).await;
        let generated = tokio::select! {
            _ = cancel_token.cancelled() => {
                let _ = tx.send(SolveEvent::Cancelled).await;
                return;
            }
            generated = self.generate(problem_text) => generated,
        };

        let solution = match generated {
            Ok(path) => path,
            Err(e) => {
                let _ = tx
                    .send(SolveEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
                return;
            }
        };
        let _ = tx
            .send(SolveEvent::SolutionWritten {
                path: solution.clone(),
            })
            .await;

        let total = examples.len() as u32;
        let _ = tx.send(SolveEvent::ExecutingExamples { total }).await;

        let timeout = self.config.timeout();
        let mut results = Vec::with_capacity(examples.len());

        for (idx, example) in examples.iter().enumerate() {
            // Dropping the in-flight run kills the child and its process group.
            let result = tokio::select! {
                _ = cancel_token.cancelled() => {
                    let _ = tx.send(SolveEvent::Cancelled).await;
                    return;
                }
                result = self.executor.run_example(&solution, idx + 1, example, timeout) => result,
            };

            let _ = tx
                .send(SolveEvent::ExampleResult {
                    result: result.clone(),
                })
                .await;
            results.push(result);
        }

        let summary = ExecutionSummary::from_results(&results);
        tracing::info!("Examples passed: {}/{}", summary.passed, summary.total);
        let _ = tx.send(SolveEvent::Done { summary }).await;
    }
}

/// With nothing parsed, the whole text is fed as input with no expected output.
pub fn whole_text_example(problem_text: &str) -> Example {
    Example::new(problem_text, "")
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use screensolve_core::{Language, SolverError};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    struct FakeCapture;

    #[async_trait]
    impl ScreenCapture for FakeCapture {
        async fn capture(&self, output: &Path) -> Result<PathBuf> {
            Ok(output.to_path_buf())
        }
    }

    struct FakeOcr(HashMap<PathBuf, String>);

    #[async_trait]
    impl TextExtractor for FakeOcr {
        async fn extract_text(&self, image: &Path) -> Result<String> {
            Ok(self.0.get(image).cloned().unwrap_or_default())
        }
    }

    struct FakeGenerator {
        source: std::result::Result<String, String>,
        prompts: Arc<Mutex<Vec<String>>>,
    }

    impl FakeGenerator {
        fn ok(source: &str) -> Self {
            Self {
                source: Ok(source.to_string()),
                prompts: Arc::default(),
            }
        }
    }

    #[async_trait]
    impl SolutionGenerator for FakeGenerator {
        fn name(&self) -> &str {
            "fake"
        }

        async fn generate_solution(&self, problem_text: &str, _language: Language) -> Result<String> {
            self.prompts.lock().unwrap().push(problem_text.to_string());
            self.source.clone().map_err(SolverError::Generation)
        }
    }

    fn pipeline(dir: &TempDir, generator: FakeGenerator, ocr: FakeOcr) -> SolvePipeline {
        let mut config = SolverConfig::default();
        config.defaults.language = Language::Shell;
        config.defaults.timeout_secs = 5.0;
        config.paths.solution = dir.path().join("solutions").join("solution.py");
        config.paths.screenshot = dir.path().join("shot.png");
        SolvePipeline::new(config, Box::new(FakeCapture), Box::new(ocr), Box::new(generator))
    }

    async fn collect(pipeline: &SolvePipeline, text: &str, token: CancellationToken) -> Vec<SolveEvent> {
        let (tx, mut rx) = mpsc::channel(64);
        pipeline.run_streaming(text, token, tx).await;
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_full_run_streams_results_in_order() {
        let dir = TempDir::new().unwrap();
        let p = pipeline(&dir, FakeGenerator::ok("cat\n"), FakeOcr(HashMap::new()));
        let text = "Echo the input back. Example 1: Input: abc Output: abc Example 2: Input: x Output: y";

        let events = collect(&p, text, CancellationToken::new()).await;

        assert!(matches!(&events[0], SolveEvent::Parsed { examples: 2, .. }));
        assert!(matches!(events[1], SolveEvent::GeneratingSolution));
        match &events[2] {
            SolveEvent::SolutionWritten { path } => {
                assert_eq!(path, &dir.path().join("solutions").join("solution.sh"));
                assert_eq!(std::fs::read_to_string(path).unwrap(), "cat\n");
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert!(matches!(events[3], SolveEvent::ExecutingExamples { total: 2 }));
        match (&events[4], &events[5]) {
            (SolveEvent::ExampleResult { result: first }, SolveEvent::ExampleResult { result: second }) => {
                assert_eq!((first.index, first.passed), (1, true));
                assert_eq!((second.index, second.passed), (2, false));
            }
            other => panic!("unexpected events {:?}", other),
        }
        match &events[6] {
            SolveEvent::Done { summary } => assert_eq!((summary.passed, summary.total), (1, 2)),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_examples_falls_back_to_whole_text() {
        let dir = TempDir::new().unwrap();
        let p = pipeline(&dir, FakeGenerator::ok("cat > /dev/null\n"), FakeOcr(HashMap::new()));

        let events = collect(&p, "just some prose", CancellationToken::new()).await;

        assert!(matches!(&events[0], SolveEvent::Parsed { examples: 0, .. }));
        assert!(matches!(events[1], SolveEvent::NoExamples));
        let result = events
            .iter()
            .find_map(|e| match e {
                SolveEvent::ExampleResult { result } => Some(result.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(result.input, "just some prose");
        assert_eq!(result.expected_output, "");
        assert!(result.passed);
    }

    #[tokio::test]
    async fn test_generator_receives_full_text() {
        let dir = TempDir::new().unwrap();
        let generator = FakeGenerator::ok("cat\n");
        let prompts = generator.prompts.clone();
        let p = pipeline(&dir, generator, FakeOcr(HashMap::new()));
        let text = "Raw text Premium\nExample 1: Input: 1 Output: 1";

        let path = p.generate(text).await.unwrap();

        assert_eq!(*prompts.lock().unwrap(), vec![text.to_string()]);
        assert_eq!(std::fs::read_to_string(path).unwrap(), "cat\n");
    }

    #[tokio::test]
    async fn test_generation_error_is_reported() {
        let dir = TempDir::new().unwrap();
        let generator = FakeGenerator {
            source: Err("model unavailable".to_string()),
            prompts: Arc::default(),
        };
        let p = pipeline(&dir, generator, FakeOcr(HashMap::new()));

        let events = collect(&p, "Input: 1 Output: 1", CancellationToken::new()).await;

        match events.last() {
            Some(SolveEvent::Error { message }) => assert!(message.contains("model unavailable")),
            other => panic!("unexpected event {:?}", other),
        }
        assert!(!events.iter().any(|e| matches!(e, SolveEvent::ExecutingExamples { .. })));
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let dir = TempDir::new().unwrap();
        let p = pipeline(&dir, FakeGenerator::ok("cat\n"), FakeOcr(HashMap::new()));
        let token = CancellationToken::new();
        token.cancel();

        let events = collect(&p, "Input: 1 Output: 1", token).await;

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SolveEvent::Cancelled));
    }

    #[tokio::test]
    async fn test_cancel_during_execution_stops_run() {
        let dir = TempDir::new().unwrap();
        let pidfile = dir.path().join("sleep.pid");
        let source = format!("sleep 30 &\necho $! > '{}'\nwait\n", pidfile.display());
        let p = pipeline(&dir, FakeGenerator::ok(&source), FakeOcr(HashMap::new()));
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
            canceller.cancel();
        });

        let start = std::time::Instant::now();
        let events = collect(&p, "Input: 1 Output: 1", token).await;

        assert!(start.elapsed() < std::time::Duration::from_secs(4));
        assert!(matches!(events.last(), Some(SolveEvent::Cancelled)));

        #[cfg(target_os = "linux")]
        {
            let pid = crate::process_check::read_pid(&pidfile);
            assert!(
                crate::process_check::wait_for_exit(pid, std::time::Duration::from_secs(2)).await,
                "grandchild {} outlived the cancelled run",
                pid
            );
        }
    }

    #[tokio::test]
    async fn test_extract_joins_non_empty_texts() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        let c = dir.path().join("c.png");
        let ocr = FakeOcr(HashMap::from([
            (a.clone(), "  first part \n".to_string()),
            (c.clone(), "second part".to_string()),
        ]));
        let p = pipeline(&dir, FakeGenerator::ok(""), ocr);

        let text = p.extract(&[a, b, c]).await.unwrap();
        assert_eq!(text, "first part\nsecond part");
    }
}
