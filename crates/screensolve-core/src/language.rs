use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Python,
    JavaScript,
    Go,
    Shell,
}

impl Language {
    pub fn label(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::Go => "Go",
            Language::Shell => "Shell",
        }
    }

    pub fn file_extension(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::JavaScript => "js",
            Language::Go => "go",
            Language::Shell => "sh",
        }
    }

    pub fn all() -> &'static [Language] {
        &[
            Language::Python,
            Language::JavaScript,
            Language::Go,
            Language::Shell,
        ]
    }

    /// Interpreter program and the arguments that precede the solution path.
    pub fn launch_command(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            Language::Python => ("python3", &[]),
            Language::JavaScript => ("node", &[]),
            Language::Go => ("go", &["run"]),
            Language::Shell => ("sh", &[]),
        }
    }

    pub fn from_path(path: &Path) -> Option<Language> {
        let ext = path.extension()?.to_str()?;
        Language::all()
            .iter()
            .copied()
            .find(|lang| lang.file_extension().eq_ignore_ascii_case(ext))
    }

    pub fn from_name(name: &str) -> Option<Language> {
        let name = name.trim();
        Language::all().iter().copied().find(|lang| {
            lang.label().eq_ignore_ascii_case(name) || lang.file_extension().eq_ignore_ascii_case(name)
        })
    }
}
