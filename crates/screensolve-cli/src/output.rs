use anyhow::Result;
use clap::ValueEnum;
use screensolve_core::{ExecutionResult, ExecutionSummary, ProblemRecord};
use screensolve_runner::SolveEvent;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

pub fn print_record(record: &ProblemRecord, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(record)?),
        OutputFormat::Table => {
            println!("Title:       {}", display_or_dash(&record.title));
            println!("Description: {}", display_or_dash(&record.description));
            println!("Examples:    {}", record.examples.len());
            println!("{:-<40}", "");
            for (idx, example) in record.examples.iter().enumerate() {
                println!("  Example {}", idx + 1);
                println!("    input:  {}", example.input);
                println!("    output: {}", example.output);
            }
            if record.examples.is_empty() {
                println!("  No examples detected. You can still generate a solution.");
            }
        }
    }
    Ok(())
}

pub fn print_result(result: &ExecutionResult) {
    let mark = match (&result.fault, result.passed) {
        (Some(_), _) => "FAULT",
        (None, true) => "PASS",
        (None, false) => "FAIL",
    };

    println!("Example {}: {}", result.index, mark);
    println!("  input:    {}", result.input);
    println!("  expected: {}", result.expected_output);
    println!("  got:      {}", result.actual_output);
    if let Some(fault) = &result.fault {
        println!("  fault:    {}", fault.label());
    }
    if result.fault.is_none() && result.exit_code != 0 {
        println!("  exit:     {}", result.exit_code);
    }
    if !result.stderr_text.is_empty() {
        println!("  stderr:   {}", result.stderr_text);
    }
}

pub fn print_summary(summary: &ExecutionSummary) {
    println!("{:-<40}", "");
    println!(
        "  Passed: {}/{}  Failed: {}  Faults: {}",
        summary.passed, summary.total, summary.failed, summary.faulted
    );
}

pub fn print_results(results: &[ExecutionResult], format: OutputFormat) -> Result<()> {
    let summary = ExecutionSummary::from_results(results);
    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({ "results": results, "summary": summary });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Table => {
            results.iter().for_each(print_result);
            print_summary(&summary);
        }
    }
    Ok(())
}

/// Prints one pipeline event. Returns the summary once the run is done.
pub fn print_event(event: &SolveEvent) -> Option<ExecutionSummary> {
    match event {
        SolveEvent::Parsed { title, examples } => {
            println!("Parsed title: {}", display_or_dash(title));
            println!("Found {} example(s).", examples);
        }
        SolveEvent::NoExamples => {
            println!("No examples available. Running with the entire problem text as input.");
        }
        SolveEvent::GeneratingSolution => println!("Generating solution..."),
        SolveEvent::SolutionWritten { path } => {
            println!("Solution written to {}", path.display());
        }
        SolveEvent::ExecutingExamples { total } => {
            println!("Running {} example(s)...", total);
            println!();
        }
        SolveEvent::ExampleResult { result } => print_result(result),
        SolveEvent::Done { summary } => {
            print_summary(summary);
            return Some(*summary);
        }
        SolveEvent::Cancelled => println!("Cancelled."),
        SolveEvent::Error { message } => println!("Error: {}", message),
    }
    None
}

fn display_or_dash(s: &str) -> &str {
    match s.is_empty() {
        true => "-",
        false => s,
    }
}
