use crate::types::{MAX_OPTIONS, MIN_OPTIONS};
use tracing::debug;

const QUESTION_MARKER: &str = "Question";
const OPTIONS_START: &str = "1)";

/// Question and options extracted from generated text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPoll {
    pub question: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("no line starts with \"Question:\"")]
    MissingQuestion,

    #[error("question text after \"Question:\" is empty")]
    EmptyQuestion,

    #[error("no enumerated options block starting with \"1)\"")]
    MissingOptions,

    #[error("found {found} option(s), need at least 2")]
    TooFewOptions { found: usize },
}

/// Extract a poll from the raw output of the generation service.
///
/// Expects a `Question:` line with the question on the same line (emphasis
/// markup such as `**` around the marker or before the colon is tolerated) and an options block whose first line starts with
/// `1)`. Every non-empty line from the start of that block on becomes an
/// option once its `N)` enumerator is removed; at most four are kept.
pub fn parse_poll_text(raw: &str) -> Result<ParsedPoll, ParseError> {
    let lines: Vec<&str> = raw.lines().map(str::trim).collect();

    let question_line = lines
        .iter()
        .find_map(|line| strip_question_marker(line))
        .ok_or(ParseError::MissingQuestion)?;

    let question = strip_emphasis(question_line);
    if question.is_empty() {
        return Err(ParseError::EmptyQuestion);
    }

    let options_start = lines
        .iter()
        .position(|line| line.starts_with(OPTIONS_START))
        .ok_or(ParseError::MissingOptions)?;

    let options: Vec<String> = lines[options_start..]
        .iter()
        .map(|line| strip_enumerator(line).trim())
        .filter(|option| !option.is_empty())
        .take(MAX_OPTIONS)
        .map(str::to_string)
        .collect();

    if options.len() < MIN_OPTIONS {
        return Err(ParseError::TooFewOptions {
            found: options.len(),
        });
    }

    debug!("Parsed poll question with {} options", options.len());

    Ok(ParsedPoll {
        question: question.to_string(),
        options,
    })
}

/// Text after the `Question:` marker if `line` is a question line.
fn strip_question_marker(line: &str) -> Option<&str> {
    strip_emphasis(line)
        .strip_prefix(QUESTION_MARKER)?
        .trim_start_matches(|c: char| c == '*' || c == '_')
        .strip_prefix(':')
}

fn strip_emphasis(text: &str) -> &str {
    text.trim()
        .trim_matches(|c: char| c == '*' || c == '_')
        .trim()
}

/// Remove a leading `N)` enumerator; lines without one are returned as is.
fn strip_enumerator(line: &str) -> &str {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return line;
    }
    line[digits..].strip_prefix(')').unwrap_or(line)
}
