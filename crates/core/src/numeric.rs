use std::sync::OnceLock;

use regex::Regex;

static MILLIONS: OnceLock<Regex> = OnceLock::new();
static THOUSANDS_K: OnceLock<Regex> = OnceLock::new();
static THOUSANDS_WORD: OnceLock<Regex> = OnceLock::new();
static PLAIN_NUMBER: OnceLock<Regex> = OnceLock::new();

fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("static numeric pattern compiles"))
}

/// Pulls a single magnitude out of free text.
///
/// Scaled forms win over bare numbers regardless of position, so
/// "over 100 feet worth 2 million" yields 2,000,000.
#[derive(Clone, Copy, Debug, Default)]
pub struct NumericExtractor;

impl NumericExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, text: &str) -> Option<f64> {
        let lowered = text.to_lowercase();

        let scaled_forms = [
            (&MILLIONS, r"(\d+(?:\.\d+)?)\s*million", 1e6),
            (&THOUSANDS_K, r"(\d+(?:\.\d+)?)\s*k\b", 1e3),
            (&THOUSANDS_WORD, r"(\d+(?:\.\d+)?)\s*thousand", 1e3),
        ];
        for (cell, source, multiplier) in scaled_forms {
            if let Some(value) = scaled(&lowered, pattern(cell, source), multiplier) {
                return Some(value);
            }
        }

        let captures = pattern(&PLAIN_NUMBER, r"\$?(\d[\d,]*(?:\.\d+)?)").captures(&lowered)?;
        let digits = captures.get(1)?.as_str().replace(',', "");
        digits.parse::<f64>().ok().filter(|value| value.is_finite())
    }
}

fn scaled(text: &str, pattern: &Regex, multiplier: f64) -> Option<f64> {
    let captures = pattern.captures(text)?;
    let value = captures.get(1)?.as_str().parse::<f64>().ok()?;
    Some(value * multiplier).filter(|value| value.is_finite())
}
