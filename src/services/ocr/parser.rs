use crate::error::FieldParseError;
use regex::Regex;
use std::sync::OnceLock;

fn integer_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    // Whole cell must be one signed ASCII integer
    PATTERN
        .get_or_init(|| Regex::new(r"^\s*([+-]?[0-9]+)\s*$").ok())
        .as_ref()
}

/// Parse a numeric scoreboard cell as a base-10 integer
/// Expected format: "12", " 12 ", "1,250", "-3". Misreads such as "1O" are errors.
pub fn parse_stat_value(text: &str) -> Result<i64, FieldParseError> {
    let cleaned = text.replace(',', "");

    integer_pattern()
        .and_then(|re| re.captures(&cleaned))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .ok_or_else(|| FieldParseError {
            raw: text.to_string(),
        })
}

/// Clean a name cell: collapse whitespace and strip non-alphanumeric edge noise
/// Example: " |TeamA   PlayerOne. " → "TeamA PlayerOne"
pub fn clean_name_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_string()
}

/// Matching key: lowercase, letters and digits only
pub fn match_key(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
