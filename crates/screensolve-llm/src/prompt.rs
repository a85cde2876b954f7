use once_cell::sync::Lazy;
use regex::Regex;
use screensolve_core::{Language, Result, SolverError};

pub const SYSTEM_PROMPT: &str =
    "You are an AI that solves coding problems. Always return only working code.";

static CODE_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[^\n]*\n(.*?)```").expect("code fence pattern")
});

pub fn build_user_prompt(problem_text: &str, language: Language) -> String {
    format!(
        "Solve this problem and provide only the {} solution code:\n\n{}",
        language.label(),
        problem_text
    )
}

/// Models wrap code in markdown fences despite being told not to. Returns the
/// body of the first fenced block, or the whole reply when there is none.
pub fn strip_code_fences(reply: &str) -> Result<String> {
    let code = match CODE_FENCE.captures(reply) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()).trim(),
        None => reply.trim(),
    };

    match code.is_empty() {
        true => Err(SolverError::Generation("model returned no code".to_string())),
        false => Ok(format!("{}\n", code)),
    }
}
