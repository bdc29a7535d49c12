//! Recovery of a JSON value from free-form model output.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// How a JSON object is located inside surrounding text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonRecovery {
    /// Parse the span from the first `{` to the last `}`.
    #[default]
    OuterBraces,
    /// Parse the first brace-balanced object, ignoring braces inside strings.
    Balanced,
}

impl std::fmt::Display for JsonRecovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonRecovery::OuterBraces => write!(f, "outer_braces"),
            JsonRecovery::Balanced => write!(f, "balanced"),
        }
    }
}

impl FromStr for JsonRecovery {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "outer_braces" => Ok(JsonRecovery::OuterBraces),
            "balanced" => Ok(JsonRecovery::Balanced),
            other => Err(format!("unknown JSON recovery strategy '{}'", other)),
        }
    }
}

/// Recover a JSON value from `text`. Never fails; `None` means nothing usable.
///
/// The whole trimmed text is tried first, then the object located by `strategy`.
pub fn recover_json(text: &str, strategy: JsonRecovery) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let recovered = match strategy {
        JsonRecovery::OuterBraces => outer_braces(trimmed),
        JsonRecovery::Balanced => first_balanced(trimmed),
    };

    if recovered.is_none() {
        debug!("No JSON object recovered from {} chars of output", trimmed.len());
    }
    recovered
}

fn outer_braces(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn first_balanced(text: &str) -> Option<Value> {
    text.match_indices('{').find_map(|(start, _)| {
        let end = balanced_end(&text[start..])?;
        serde_json::from_str(&text[start..start + end]).ok()
    })
}

/// Byte length of the brace-balanced object at the start of `text`.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }
    None
}
