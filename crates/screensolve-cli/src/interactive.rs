use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use screensolve_core::{ProblemRecord, SolverConfig};
use screensolve_runner::{whole_text_example, SolvePipeline};

use crate::commands::{self, build_pipeline};
use crate::output::{self, OutputFormat};

/// Problem text and artifacts carried between prompt commands.
struct Session {
    pipeline: SolvePipeline,
    text: String,
    record: Option<ProblemRecord>,
    solution: Option<PathBuf>,
}

impl Session {
    fn new(config: SolverConfig) -> Self {
        Self {
            pipeline: build_pipeline(config),
            text: String::new(),
            record: None,
            solution: None,
        }
    }

    fn append_text(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        self.text.push_str(text);
        self.record = None;
    }

    fn reset(&mut self) {
        self.text.clear();
        self.record = None;
        self.solution = None;
    }

    async fn capture(&mut self) -> Result<()> {
        let path = self.pipeline.capture().await?;
        println!("Screenshot saved to {}", path.display());
        println!("Run 'extract' to OCR it.");
        Ok(())
    }

    async fn extract(&mut self, args: &[&str]) -> Result<()> {
        let images: Vec<PathBuf> = match args.is_empty() {
            true => vec![self.pipeline.config().paths.screenshot.clone()],
            false => args.iter().map(|a| PathBuf::from(*a)).collect(),
        };

        let text = self.pipeline.extract(&images).await?;
        if text.trim().is_empty() {
            println!("No text extracted.");
            return Ok(());
        }

        self.append_text(&text);
        println!("Extracted {} characters ({} total).", text.len(), self.text.len());
        Ok(())
    }

    fn load(&mut self, args: &[&str]) -> Result<()> {
        let Some(path) = args.first() else {
            bail!("Usage: load <file>");
        };
        let text = commands::read_text(Some(Path::new(path)))?;
        self.append_text(&text);
        println!("Loaded {} ({} characters total).", path, self.text.len());
        Ok(())
    }

    fn paste(&mut self) -> Result<()> {
        println!("Paste problem text; finish with a line containing only '.'");
        let stdin = io::stdin();
        let mut pasted = String::new();

        for line in stdin.lock().lines() {
            let line = line?;
            if line.trim() == "." {
                break;
            }
            pasted.push_str(&line);
            pasted.push('\n');
        }

        self.append_text(&pasted);
        println!("{} characters of problem text.", self.text.len());
        Ok(())
    }

    fn show(&self) {
        match self.text.is_empty() {
            true => println!("Problem text is empty."),
            false => println!("{}", self.text),
        }
    }

    fn parse(&mut self) -> Result<()> {
        if self.text.trim().is_empty() {
            bail!("Problem text is empty. Use 'extract', 'load' or 'paste' first.");
        }

        let record = self.pipeline.parse(&self.text);
        output::print_record(&record, OutputFormat::Table)?;
        self.record = Some(record);
        Ok(())
    }

    async fn generate(&mut self) -> Result<()> {
        if self.text.trim().is_empty() {
            bail!("Problem text is empty. Nothing to generate from.");
        }

        println!("Generating solution with {}...", self.pipeline.generator_name());
        let path = self.pipeline.generate(&self.text).await?;
        println!("Solution written to {}", path.display());
        self.solution = Some(path);
        Ok(())
    }

    async fn run(&mut self) -> Result<()> {
        let solution = self
            .solution
            .clone()
            .unwrap_or_else(|| self.pipeline.config().solution_path());
        if !solution.exists() {
            bail!("No solution file found. Run 'generate' first.");
        }

        if self.record.is_none() && !self.text.trim().is_empty() {
            self.record = Some(self.pipeline.parse(&self.text));
        }

        let examples = match &self.record {
            Some(record) if !record.examples.is_empty() => record.examples.clone(),
            _ if self.text.trim().is_empty() => bail!("Problem text is empty. Nothing to run."),
            _ => {
                println!("No examples available. Running with the entire problem text as input.");
                vec![whole_text_example(&self.text)]
            }
        };

        println!("Running {} example(s) against {}...", examples.len(), solution.display());
        println!();
        let results = self.pipeline.execute(&solution, &examples).await;
        output::print_results(&results, OutputFormat::Table)
    }
}

pub async fn run_interactive(config: SolverConfig) -> Result<()> {
    display_welcome();
    commands::cmd_status(&config).await;
    println!();

    let mut session = Session::new(config);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let parts: Vec<&str> = trimmed.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();
        let args = &parts[1..];

        let outcome = match cmd.as_str() {
            "help" | "h" | "?" => {
                display_help();
                Ok(())
            }
            "capture" | "c" => session.capture().await,
            "extract" | "e" => session.extract(args).await,
            "load" => session.load(args),
            "paste" => session.paste(),
            "show" => {
                session.show();
                Ok(())
            }
            "parse" | "p" => session.parse(),
            "generate" | "g" => session.generate().await,
            "run" | "r" => session.run().await,
            "status" | "s" => {
                commands::cmd_status(session.pipeline.config()).await;
                Ok(())
            }
            "reset" => {
                session.reset();
                println!("Problem text cleared.");
                Ok(())
            }
            "clear" | "cls" => {
                print!("\x1B[2J\x1B[1;1H");
                stdout.flush().map_err(anyhow::Error::from)
            }
            "exit" | "quit" | "q" => break,
            _ => {
                println!("Unknown command: {}. Type 'help' for available commands.", cmd);
                Ok(())
            }
        };

        if let Err(e) = outcome {
            println!("Error: {}", e);
        }
    }

    Ok(())
}

fn display_welcome() {
    println!();
    println!("  ScreenSolve");
    println!();
    println!("  Capture a problem, extract its text, generate and run a solution:");
    println!();
    println!("  capture, c      # Take a screenshot");
    println!("  extract, e      # OCR the screenshot into the problem text");
    println!("  parse, p        # Show title and examples");
    println!("  generate, g     # Generate a solution");
    println!("  run, r          # Run the solution against the examples");
    println!("  help            # Show all command options");
    println!("  exit, quit, q   # Leave");
    println!();
}

fn display_help() {
    println!();
    println!("Available Commands:");
    println!("  capture, c            Take a screenshot to the configured path");
    println!("  extract, e [IMG...]   OCR images (default: last screenshot) and append the text");
    println!("  load <file>           Append problem text from a file");
    println!("  paste                 Append pasted text, ending with a '.' line");
    println!("  show                  Print the current problem text");
    println!("  parse, p              Parse title, description and examples");
    println!("  generate, g           Generate a solution from the problem text");
    println!("  run, r                Run the solution against the parsed examples");
    println!("  status, s             Show generator and OCR status");
    println!("  reset                 Clear the problem text and solution");
    println!("  clear, cls            Clear screen");
    println!("  help, h               Show this help message");
    println!("  exit, quit, q         Leave");
    println!();
}
