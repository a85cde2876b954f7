use once_cell::sync::Lazy;
use regex::Regex;

/// Typographic variants OCR tends to produce, mapped to plain ASCII.
const CHAR_MAP: &[(&str, &str)] = &[
    ("\u{2014}", "-"),
    ("\u{2013}", "-"),
    ("\u{2019}", "'"),
    ("\u{2018}", "'"),
    ("\u{201C}", "\""),
    ("\u{201D}", "\""),
];

/// Judge-site chrome that leaks into screenshots. Applied in order.
const UI_NOISE_PATTERNS: &[&str] = &[
    r"(?is)\bDescription\b.*?\bCode\b",
    r"(?i)\bSolutions\b",
    r"(?i)\bSubmissions\b",
    r"(?i)\bPremium\b",
    r"(?i)\bHint\b",
    r"(?is)\bTopics?\b.*?\bCompanies\b",
];

enum Rule {
    Literal { from: &'static str, to: &'static str },
    Pattern { regex: Regex, to: &'static str },
}

impl Rule {
    fn pattern(pattern: &str, to: &'static str) -> Self {
        Rule::Pattern {
            regex: Regex::new(pattern).expect("normalizer pattern must compile"),
            to,
        }
    }

    fn apply(&self, text: String) -> String {
        match self {
            Rule::Literal { from, to } => match text.contains(from) {
                true => text.replace(from, to),
                false => text,
            },
            Rule::Pattern { regex, to } => match regex.is_match(&text) {
                true => regex.replace_all(&text, *to).into_owned(),
                false => text,
            },
        }
    }
}

/// Character fixes, then noise removal, then whitespace collapse. Noise spans
/// may cross line breaks, so they are removed before newlines disappear.
static PIPELINE: Lazy<Vec<Rule>> = Lazy::new(|| {
    let mut rules: Vec<Rule> = CHAR_MAP
        .iter()
        .map(|&(from, to)| Rule::Literal { from, to })
        .collect();

    rules.push(Rule::Literal { from: "\r", to: "" });
    rules.push(Rule::pattern(r"[\t\x0B\x0C]+", " "));
    rules.push(Rule::Literal {
        from: "\u{200B}",
        to: "",
    });
    rules.extend(UI_NOISE_PATTERNS.iter().map(|p| Rule::pattern(p, " ")));
    rules.push(Rule::pattern(r"\s+", " "));
    rules
});

/// Cleans raw OCR text. Total over all inputs; empty in, empty out.
pub fn normalize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let cleaned = PIPELINE
        .iter()
        .fold(raw.to_string(), |text, rule| rule.apply(text));
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOISY: &[&str] = &[
        "",
        "   \n\t  ",
        "Two Sum\r\n\r\nGiven an array\tof integers\u{200B} nums…",
        "Description Editorial Solutions Submissions\nCode\n1. Two Sum Easy Topics\nArray Companies Hint",
        "It\u{2019}s \u{201C}quoted\u{201D} \u{2014} and \u{2013} dashed",
        "Example 1:\nInput: nums = [2,7]\nOutput: [0,1]\nExplanation: Because nums[0] + nums[1] == 9",
        "Premium\x0B\x0C lock  Hints HintHint hint",
        "Topic only, no closing marker. Description without the other word.",
    ];

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(" \r\n\t"), "");
    }

    #[test]
    fn test_homoglyphs_replaced() {
        assert_eq!(
            normalize("It\u{2019}s \u{201C}quoted\u{201D} \u{2014} and \u{2013} dashed \u{2018}x\u{2019}"),
            "It's \"quoted\" - and - dashed 'x'"
        );
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(normalize("a\r\n\n b\t\t c\x0B\x0Cd\u{200B}e"), "a b c de");
    }

    #[test]
    fn test_ui_noise_removed() {
        let raw = "Description Editorial Solutions\nSubmissions Code\n1. Two Sum\nEasy Topics Array Hash Table Companies\nGiven an array. Premium Hint";
        assert_eq!(normalize(raw), "1. Two Sum Easy Given an array.");
    }

    #[test]
    fn test_noise_words_need_word_boundaries() {
        assert_eq!(normalize("Hints and Codes"), "Hints and Codes");
        assert_eq!(normalize("Use a hint."), "Use a .");
    }

    #[test]
    fn test_idempotent() {
        for sample in NOISY {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }
}
