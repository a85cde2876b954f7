mod commands;
mod interactive;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use screensolve_core::{Language, LlmProvider, SolverConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use output::OutputFormat;

const DEFAULT_LOG_FILTER: &str = "screensolve_cli=info,screensolve_runner=info,screensolve_llm=info";

#[derive(Parser)]
#[command(name = "screensolve")]
#[command(about = "ScreenSolve - solve coding problems straight from a screenshot", long_about = None)]
struct Cli {
    /// Config file (JSON); defaults to <config dir>/screensolve/config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model used for solution generation
    #[arg(long, global = true)]
    model: Option<String>,

    /// LLM provider (openai, ollama)
    #[arg(long, global = true, value_parser = parse_provider)]
    provider: Option<LlmProvider>,

    /// Solution language (python, javascript, go, shell)
    #[arg(short, long, global = true, value_parser = parse_language)]
    language: Option<Language>,

    /// Per-example timeout in seconds (fractions allowed, e.g. 0.5)
    #[arg(short, long, global = true, value_parser = parse_timeout)]
    timeout: Option<f64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse problem text into title, description and examples
    Parse {
        /// Text file to parse (stdin when absent)
        file: Option<PathBuf>,

        /// Output format (table, json)
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Run a solution against examples
    Run {
        /// Solution file to execute
        #[arg(short, long)]
        solution: PathBuf,

        /// JSON file with [{"input": ..., "output": ...}] examples
        #[arg(short, long, conflicts_with = "problem", required_unless_present = "problem")]
        examples: Option<PathBuf>,

        /// Problem text file; examples are parsed from it
        #[arg(short, long)]
        problem: Option<PathBuf>,

        /// Output format (table, json)
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Extract text from screenshots
    Ocr {
        /// Image files, processed in order
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// Take a screenshot
    Capture {
        /// Where to save it (defaults to the configured screenshot path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a solution for a problem and write it to disk
    Generate {
        /// Problem text file (stdin when absent)
        file: Option<PathBuf>,

        /// Solution path (defaults to the configured solution path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Capture or OCR, parse, generate and run in one go
    Solve {
        /// Screenshot(s) to OCR
        #[arg(short, long, conflicts_with_all = ["text", "capture"])]
        image: Vec<PathBuf>,

        /// Problem text file
        #[arg(long, conflicts_with = "capture")]
        text: Option<PathBuf>,

        /// Take a fresh screenshot first
        #[arg(long)]
        capture: bool,
    },

    /// Print the effective configuration
    Config,

    /// Show generator and OCR status
    Status,
}

impl Cli {
    fn apply_overrides(&self, config: &mut SolverConfig) {
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(provider) = self.provider {
            config.llm.provider = provider;
        }
        if let Some(language) = self.language {
            config.defaults.language = language;
        }
        if let Some(timeout) = self.timeout {
            config.defaults.timeout_secs = timeout;
        }
    }
}

fn parse_language(value: &str) -> std::result::Result<Language, String> {
    Language::from_name(value).ok_or_else(|| {
        let known: Vec<&str> = Language::all().iter().map(|l| l.label()).collect();
        format!("unknown language '{}' (expected one of: {})", value, known.join(", "))
    })
}

fn parse_timeout(value: &str) -> std::result::Result<f64, String> {
    screensolve_core::parse_timeout_secs(value)
        .ok_or_else(|| format!("invalid timeout '{}' (expected a positive number of seconds)", value))
}

fn parse_provider(value: &str) -> std::result::Result<LlmProvider, String> {
    LlmProvider::parse(value).ok_or_else(|| format!("unknown provider '{}' (expected openai or ollama)", value))
}

fn init_tracing(config: &SolverConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr));

    let Some(path) = &config.log_file else {
        registry.init();
        return None;
    };
    let Some(file_name) = path.file_name() else {
        registry.init();
        tracing::warn!("log_file has no file name: {}", path.display());
        return None;
    };

    let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    registry
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = SolverConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    let _log_guard = init_tracing(&config);

    match cli.command {
        Some(Commands::Parse { file, format }) => commands::cmd_parse(file.as_deref(), format)?,
        Some(Commands::Run {
            solution,
            examples,
            problem,
            format,
        }) => {
            commands::cmd_run(
                &config,
                &solution,
                examples.as_deref(),
                problem.as_deref(),
                cli.language,
                format,
            )
            .await?
        }
        Some(Commands::Ocr { images }) => commands::cmd_ocr(&config, &images).await?,
        Some(Commands::Capture { output }) => commands::cmd_capture(&config, output).await?,
        Some(Commands::Generate { file, output }) => {
            commands::cmd_generate(config, file.as_deref(), output, cli.language.is_some()).await?
        }
        Some(Commands::Solve {
            image,
            text,
            capture,
        }) => commands::cmd_solve(config, image, text.as_deref(), capture).await?,
        Some(Commands::Config) => commands::cmd_config(&config)?,
        Some(Commands::Status) => commands::cmd_status(&config).await,
        None => interactive::run_interactive(config).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_requires_examples_or_problem() {
        assert!(Cli::try_parse_from(["screensolve", "run", "-s", "a.py"]).is_err());
        assert!(Cli::try_parse_from(["screensolve", "run", "-s", "a.py", "-e", "ex.json"]).is_ok());
        assert!(Cli::try_parse_from(["screensolve", "run", "-s", "a.py", "-p", "p.txt"]).is_ok());
        assert!(Cli::try_parse_from([
            "screensolve", "run", "-s", "a.py", "-e", "ex.json", "-p", "p.txt"
        ])
        .is_err());
    }

    #[test]
    fn test_global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from([
            "screensolve", "run", "-s", "a.js", "-e", "ex.json", "--timeout", "2.5", "--language", "javascript",
        ])
        .unwrap();

        let mut config = SolverConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.defaults.timeout_secs, 2.5);
        assert_eq!(config.defaults.language, Language::JavaScript);
        assert_eq!(config.llm.model, "gpt-4o-mini");
    }

    #[test]
    fn test_unknown_language_rejected() {
        assert!(parse_language("cobol").is_err());
        assert_eq!(parse_language("PY"), Ok(Language::Python));
    }

    #[test]
    fn test_non_positive_timeout_rejected() {
        assert!(Cli::try_parse_from(["screensolve", "--timeout", "0", "config"]).is_err());
        assert!(Cli::try_parse_from(["screensolve", "--timeout", "-2", "config"]).is_err());
    }

    #[test]
    fn test_provider_flag() {
        let cli = Cli::try_parse_from(["screensolve", "--provider", "ollama", "--model", "qwen2.5-coder", "config"]).unwrap();
        let mut config = SolverConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.llm.provider, LlmProvider::Ollama);
        assert_eq!(config.llm.model, "qwen2.5-coder");
    }

    #[test]
    fn test_solve_sources_are_exclusive() {
        assert!(Cli::try_parse_from(["screensolve", "solve", "--capture"]).is_ok());
        assert!(Cli::try_parse_from(["screensolve", "solve", "-i", "a.png", "-i", "b.png"]).is_ok());
        assert!(Cli::try_parse_from(["screensolve", "solve", "-i", "a.png", "--capture"]).is_err());
    }
}
