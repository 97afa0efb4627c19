//! Documentation segmentation.
//!
//! Engine docstrings are plain text with an `Args:` section listing one
//! `name: description` entry per parameter and a `Returns:` section. The text
//! is split by a three-state line machine; anything that does not fit the
//! expected shape falls back to body text.

use std::collections::BTreeMap;

const ARGS_MARKER: &str = "Args:";
const RETURNS_MARKER: &str = "Returns:";
/// Lines indented at most this far may start a parameter entry or be a marker.
const SHALLOW_INDENT: usize = 4;
const SEPARATOR: char = ':';

/// Segmented documentation of one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Documentation {
    /// Summary and commentary lines joined by newlines.
    pub body: String,
    /// Parameter name to joined description.
    pub args: BTreeMap<String, String>,
    /// Joined return description.
    pub returns: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Body,
    Args,
    Returns,
}

impl Documentation {
    /// Segment `text`; `None` yields empty documentation.
    pub fn parse(text: Option<&str>) -> Self {
        let Some(text) = text else {
            return Self::default();
        };

        let mut state = State::Body;
        let mut body: Vec<&str> = Vec::new();
        let mut args: Vec<(String, Vec<String>)> = Vec::new();
        let mut returns: Vec<String> = Vec::new();

        for line in text.split('\n') {
            let indent = indent_width(line);
            let content = line.trim();
            if indent <= SHALLOW_INDENT && content == ARGS_MARKER {
                state = State::Args;
                continue;
            }
            if indent <= SHALLOW_INDENT && content == RETURNS_MARKER {
                state = State::Returns;
                continue;
            }

            match state {
                State::Body => body.push(line),
                State::Args => {
                    if content.is_empty() {
                        continue;
                    }
                    if indent <= SHALLOW_INDENT
                        && let Some((name, rest)) = content.split_once(SEPARATOR)
                    {
                        args.push((name.trim().to_string(), fragment(rest)));
                    } else if let Some((_, fragments)) = args.last_mut() {
                        fragments.push(content.to_string());
                    } else {
                        body.push(content);
                    }
                }
                State::Returns => {
                    if !content.is_empty() {
                        returns.push(content.to_string());
                    }
                }
            }
        }

        Self {
            body: body.join("\n"),
            args: args
                .into_iter()
                .map(|(name, fragments)| (name, fragments.join(" ")))
                .collect(),
            returns: returns.join(" "),
        }
    }

    /// Description of parameter `name`, if documented and non-empty.
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args
            .get(name)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Leading whitespace width in characters.
fn indent_width(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

fn fragment(rest: &str) -> Vec<String> {
    let rest = rest.trim();
    if rest.is_empty() {
        Vec::new()
    } else {
        vec![rest.to_string()]
    }
}
