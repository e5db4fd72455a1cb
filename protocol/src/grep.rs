use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::Location;

/// One structured match from a line-oriented search tool speaking the
/// `file:line:column:content` protocol (ripgrep `--vimgrep` and friends).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GrepMatch {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
    pub content: String,
}

impl GrepMatch {
    pub fn location(&self) -> Location {
        Location {
            file: self.file.clone(),
            line: self.line,
            column: self.column,
        }
    }
}

/// Parse a single `file:line:column:content` line.
///
/// The file portion may itself contain colons (Windows drive letters), so
/// the split point is the first `:` whose following two fields are both
/// numeric. Returns `None` for lines that do not fit the protocol.
pub fn parse_grep_line(line: &str) -> Option<GrepMatch> {
    let mut search_from = 0;
    while let Some(rel) = line[search_from..].find(':') {
        let file_end = search_from + rel;
        let rest = &line[file_end + 1..];
        if let Some(parsed) = parse_tail(&line[..file_end], rest) {
            return Some(parsed);
        }
        search_from = file_end + 1;
        if search_from >= line.len() {
            break;
        }
    }
    None
}

fn parse_tail(file: &str, rest: &str) -> Option<GrepMatch> {
    if file.is_empty() {
        return None;
    }
    let (line_str, rest) = rest.split_once(':')?;
    let (column_str, content) = rest.split_once(':')?;
    let line = line_str.parse::<u32>().ok()?;
    let column = column_str.parse::<u32>().ok()?;
    Some(GrepMatch {
        file: PathBuf::from(file),
        line,
        column,
        content: content.to_string(),
    })
}

/// Parse a whole tool output, skipping malformed lines and stopping once
/// `max_results` matches have been collected.
pub fn parse_grep_output(output: &str, max_results: usize) -> Vec<GrepMatch> {
    let mut matches = Vec::new();
    for line in output.lines() {
        if matches.len() >= max_results {
            break;
        }
        if let Some(m) = parse_grep_line(line) {
            matches.push(m);
        }
    }
    matches
}
