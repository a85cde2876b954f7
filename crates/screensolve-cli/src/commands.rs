use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use screensolve_core::{
    Example, ExecutionSummary, Language, LlmProvider, ScreenCapture, SolverConfig, TextExtractor,
};
use screensolve_llm::OllamaGenerator;
use screensolve_runner::{
    load_examples, whole_text_example, CodeExecutor, CommandCapture, SolvePipeline, TesseractOcr,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::output::{self, OutputFormat};

pub fn build_pipeline(config: SolverConfig) -> SolvePipeline {
    let capture = Box::new(CommandCapture::new(&config.capture));
    let ocr = Box::new(TesseractOcr::new(&config.ocr));
    let generator = screensolve_llm::build_generator(&config.llm);
    SolvePipeline::new(config, capture, ocr, generator)
}

/// Reads the file, or all of stdin when no file is given.
pub fn read_text(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

/// Parsed examples, or the whole text as a single input when none parse.
pub fn examples_from_text(text: &str) -> Vec<Example> {
    let record = screensolve_parser::parse_problem(text);
    match record.examples.is_empty() {
        true => vec![whole_text_example(text)],
        false => record.examples,
    }
}

pub fn cmd_parse(file: Option<&Path>, format: OutputFormat) -> Result<()> {
    let text = read_text(file)?;
    let record = screensolve_parser::parse_problem(&text);
    output::print_record(&record, format)
}

pub async fn cmd_run(
    config: &SolverConfig,
    solution: &Path,
    examples: Option<&Path>,
    problem: Option<&Path>,
    language: Option<Language>,
    format: OutputFormat,
) -> Result<()> {
    let examples = match (examples, problem) {
        (Some(path), _) => load_examples(path)
            .with_context(|| format!("Failed to load examples from {}", path.display()))?,
        (None, Some(path)) => examples_from_text(&read_text(Some(path))?),
        (None, None) => bail!("Either --examples or --problem is required"),
    };
    if examples.is_empty() {
        bail!("No examples to run");
    }

    let executor = CodeExecutor::new(language);
    let results = executor
        .run_on_examples(solution, &examples, config.timeout())
        .await;
    output::print_results(&results, format)?;

    let summary = ExecutionSummary::from_results(&results);
    if !summary.all_passed() {
        bail!(
            "{} of {} example(s) did not pass",
            summary.total - summary.passed,
            summary.total
        );
    }
    Ok(())
}

pub async fn cmd_ocr(config: &SolverConfig, images: &[PathBuf]) -> Result<()> {
    let ocr = TesseractOcr::new(&config.ocr);
    for image in images {
        let text = ocr.extract_text(image).await?;
        if images.len() > 1 {
            println!("== {} ==", image.display());
        }
        println!("{}", text.trim_end());
    }
    Ok(())
}

pub async fn cmd_capture(config: &SolverConfig, output: Option<PathBuf>) -> Result<()> {
    let target = output.unwrap_or_else(|| config.paths.screenshot.clone());
    let path = CommandCapture::new(&config.capture).capture(&target).await?;
    println!("Screenshot saved to {}", path.display());
    Ok(())
}

/// `explicit_language` is set when `--language` was passed; otherwise an
/// `--output` extension picks the language.
pub async fn cmd_generate(
    mut config: SolverConfig,
    file: Option<&Path>,
    output: Option<PathBuf>,
    explicit_language: bool,
) -> Result<()> {
    let text = read_text(file)?;
    if text.trim().is_empty() {
        bail!("Problem text is empty");
    }

    if let Some(path) = output {
        if !explicit_language {
            if let Some(language) = Language::from_path(&path) {
                config.defaults.language = language;
            }
        }
        config.paths.solution = path;
    }

    let pipeline = build_pipeline(config);
    let path = pipeline.generate(&text).await?;
    println!("Solution written to {}", path.display());
    Ok(())
}

pub async fn cmd_solve(
    config: SolverConfig,
    images: Vec<PathBuf>,
    text_file: Option<&Path>,
    capture: bool,
) -> Result<()> {
    let pipeline = build_pipeline(config);

    let text = match (text_file, capture) {
        (Some(path), _) => read_text(Some(path))?,
        (None, true) => {
            let shot = pipeline.capture().await?;
            println!("Screenshot saved to {}", shot.display());
            pipeline.extract(&[shot]).await?
        }
        (None, false) if !images.is_empty() => pipeline.extract(&images).await?,
        (None, false) => bail!("Nothing to solve: pass --image, --text or --capture"),
    };

    if text.trim().is_empty() {
        bail!("No text extracted");
    }

    let cancel_token = CancellationToken::new();
    let ctrl_c_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, cancelling");
            ctrl_c_token.cancel();
        }
    });

    let (tx, mut rx) = mpsc::channel(32);
    let run = pipeline.run_streaming(&text, cancel_token.clone(), tx);
    let report = async {
        let mut summary = None;
        while let Some(event) = rx.recv().await {
            if let Some(done) = output::print_event(&event) {
                summary = Some(done);
            }
        }
        summary
    };

    let ((), summary) = tokio::join!(run, report);

    match summary {
        Some(summary) if summary.all_passed() => Ok(()),
        Some(summary) => bail!(
            "{} of {} example(s) did not pass",
            summary.total - summary.passed,
            summary.total
        ),
        None if cancel_token.is_cancelled() => bail!("Cancelled"),
        None => bail!("Solve did not complete"),
    }
}

pub fn cmd_config(config: &SolverConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

pub async fn cmd_status(config: &SolverConfig) {
    println!("System Status:");
    println!("{:-<40}", "");
    println!("  Language:    {}", config.defaults.language.label());
    println!("  Timeout:     {}s", config.defaults.timeout_secs);
    println!("  Model:       {}", config.llm.model);

    match config.llm.provider {
        LlmProvider::OpenAi => {
            let key = match std::env::var("OPENAI_API_KEY") {
                Ok(k) if !k.is_empty() => "set",
                _ => "missing",
            };
            println!("  Provider:    OpenAI (OPENAI_API_KEY {})", key);
        }
        LlmProvider::Ollama => {
            println!("  Provider:    Ollama ({})", config.llm.ollama_host);
            match OllamaGenerator::new(&config.llm).list_models().await {
                Ok(models) => {
                    let loaded = models.iter().any(|m| m == &config.llm.model);
                    println!(
                        "  Ollama:      connected ({} models, {} {})",
                        models.len(),
                        config.llm.model,
                        if loaded { "available" } else { "not pulled" }
                    );
                }
                Err(e) => println!("  Ollama:      disconnected ({})", e),
            }
        }
    }

    println!("  OCR:         {} (-l {})", config.ocr.command, config.ocr.language);
    println!("  Capture:     {}", config.capture.resolved_command().join(" "));
    println!("  Solution:    {}", config.solution_path().display());
}
