//! Pattern and region rules
//!
//! Rule types consumed by the tokenizer. Rules live in a [`RuleSet`] in
//! declaration order; when several rules could match at the same offset,
//! the one declared earlier wins.

use regex::Regex;

use super::category::Category;
use crate::error::{HighlightError, Result};

/// Cheap first-character filter so the tokenizer only tries rules that
/// could possibly match at the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Identifier start (letter or underscore)
    Word,
    /// Digit, or `.` for leading-dot floats
    Number,
    /// One specific character
    Char(char),
    /// Any operator symbol character
    Operator,
    /// Space or tab
    Whitespace,
    /// Always try this rule
    Any,
}

impl Trigger {
    /// Check whether a rule with this trigger applies at a character
    pub fn applies(&self, ch: char) -> bool {
        match self {
            Trigger::Word => ch.is_alphabetic() || ch == '_',
            Trigger::Number => ch.is_ascii_digit() || ch == '.',
            Trigger::Char(c) => ch == *c,
            Trigger::Operator => "+-*/%@&|^~<>=!:".contains(ch),
            Trigger::Whitespace => ch == ' ' || ch == '\t',
            Trigger::Any => true,
        }
    }
}

/// Structural condition a rule match must satisfy
///
/// Checked by the tokenizer against the surrounding text, since the
/// regex alone cannot see statement boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchContext {
    /// No condition
    #[default]
    Any,
    /// Only whitespace before the match on its line
    StatementStart,
    /// Statement start, and the rest of the line ends with a colon
    /// (soft keywords)
    StatementStartWithColon,
    /// Preceding token looks like a type expression (union separator)
    UnionPosition,
}

/// A single-match pattern rule
pub struct PatternRule {
    /// Name for debugging and error messages
    pub name: &'static str,
    /// Compiled regex pattern
    pub pattern: Regex,
    /// Category to assign to matches
    pub category: Category,
    /// Capture group the token covers (0 = whole match)
    pub group: usize,
    /// First-character filter
    pub trigger: Trigger,
    /// Structural condition
    pub context: MatchContext,
    /// Never match directly after a `.` (attribute access)
    pub suppress_after_dot: bool,
}

impl PatternRule {
    /// Create a new pattern rule
    pub fn new(name: &'static str, pattern: &str, category: Category) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|source| HighlightError::Pattern { name, source })?;
        Ok(Self {
            name,
            pattern,
            category,
            group: 0,
            trigger: Trigger::Any,
            context: MatchContext::Any,
            suppress_after_dot: false,
        })
    }

    /// Builder: token covers a capture group instead of the whole match
    pub fn with_group(mut self, group: usize) -> Self {
        self.group = group;
        self
    }

    /// Builder: set the first-character filter
    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = trigger;
        self
    }

    /// Builder: set the structural condition
    pub fn with_context(mut self, context: MatchContext) -> Self {
        self.context = context;
        self
    }

    /// Builder: suppress this rule after a member-access dot
    pub fn suppressed_after_dot(mut self) -> Self {
        self.suppress_after_dot = true;
        self
    }

    /// Match this rule exactly at a position
    ///
    /// Returns the byte range of the token (the configured capture
    /// group) if the whole match starts at `pos`. Word boundaries see
    /// the real surrounding text because the search runs over the full
    /// haystack, not a slice.
    pub fn match_at(&self, text: &str, pos: usize) -> Option<(usize, usize)> {
        let caps = self.pattern.captures_at(text, pos)?;
        let whole = caps.get(0)?;
        if whole.start() != pos {
            return None;
        }
        let group = caps.get(self.group)?;
        Some((group.start(), group.end()))
    }
}

/// What may be sub-tokenized inside a region
#[derive(Debug, Clone, Copy, Default)]
pub struct Contains {
    /// Backslash escape sequences
    pub escapes: bool,
    /// f-string replacement fields
    pub fields: bool,
    /// `>>>` doctest lines
    pub doctests: bool,
    /// %-format directives
    pub percent: bool,
}

/// Result of searching for a region's end delimiter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionEnd {
    /// End of the region's interior (start of the delimiter, or where
    /// the region was cut off)
    pub content_end: usize,
    /// End of the whole region token (after the delimiter)
    pub token_end: usize,
    /// Whether the end delimiter was actually found
    pub terminated: bool,
}

/// A delimited region rule (string literals)
///
/// The start is a regex (it covers prefix variants like `rb'`); the end
/// is the literal quote that opened the region. Regions never fail: a
/// missing end delimiter extends the region to the end of input, or to
/// the end of the line for single-line regions.
pub struct RegionRule {
    /// Name for debugging and error messages
    pub name: &'static str,
    /// Pattern that starts the region
    pub start: Regex,
    /// Literal delimiter that ends the region
    pub end: &'static str,
    /// Category for the region token
    pub category: Category,
    /// Whether a backslash keeps the end delimiter from terminating
    pub escapable: bool,
    /// Whether an (unescaped) newline cuts the region off
    pub single_line: bool,
    /// Whether this region becomes a docstring in docstring position
    pub docstring_eligible: bool,
    /// Permitted sub-tokens
    pub contains: Contains,
}

impl RegionRule {
    /// Create a new region rule
    pub fn new(
        name: &'static str,
        start_pattern: &str,
        end: &'static str,
        category: Category,
    ) -> Result<Self> {
        let start = Regex::new(start_pattern)
            .map_err(|source| HighlightError::Pattern { name, source })?;
        Ok(Self {
            name,
            start,
            end,
            category,
            escapable: true,
            single_line: false,
            docstring_eligible: false,
            contains: Contains::default(),
        })
    }

    /// Builder: region is cut off at an unescaped newline
    pub fn single_line(mut self) -> Self {
        self.single_line = true;
        self
    }

    /// Builder: region may be classified as a docstring
    pub fn docstring_eligible(mut self) -> Self {
        self.docstring_eligible = true;
        self
    }

    /// Builder: set permitted sub-tokens
    pub fn with_contains(mut self, contains: Contains) -> Self {
        self.contains = contains;
        self
    }

    /// Match the start delimiter exactly at a position
    ///
    /// Returns the end of the start delimiter. Start delimiters are at
    /// most five chars, so the search is bounded and a miss never scans
    /// the rest of the input.
    pub fn match_start_at(&self, text: &str, pos: usize) -> Option<usize> {
        let mut window = pos;
        for _ in 0..6 {
            if window < text.len() {
                window += char_len(text, window);
            }
        }
        let m = self.start.find_at(&text[..window], pos)?;
        (m.start() == pos).then(|| m.end())
    }

    /// Find the end of this region, scanning from `from`
    ///
    /// Escaped delimiters do not terminate. When the region permits
    /// replacement fields, balanced `{...}` groups are skipped so a
    /// quote inside a field cannot close the string.
    pub fn find_end(&self, text: &str, from: usize, limit: usize) -> RegionEnd {
        let bytes = text.as_bytes();
        let mut i = from;

        while i < limit {
            let b = bytes[i];

            if self.escapable && b == b'\\' && i + 1 < limit {
                i += 1 + char_len(text, i + 1);
                continue;
            }
            if self.single_line && b == b'\n' {
                return RegionEnd {
                    content_end: i,
                    token_end: i,
                    terminated: false,
                };
            }
            if self.contains.fields && b == b'{' {
                if bytes.get(i + 1) == Some(&b'{') {
                    i += 2;
                    continue;
                }
                match matching_brace(text, i, limit) {
                    Some(close) => {
                        i = close + 1;
                        continue;
                    }
                    // Unterminated field swallows the rest of the region
                    None => break,
                }
            }
            if text[i..limit].starts_with(self.end) {
                return RegionEnd {
                    content_end: i,
                    token_end: i + self.end.len(),
                    terminated: true,
                };
            }

            i += char_len(text, i);
        }

        RegionEnd {
            content_end: limit,
            token_end: limit,
            terminated: false,
        }
    }
}

/// Length in bytes of the char starting at `pos`
pub(crate) fn char_len(text: &str, pos: usize) -> usize {
    text[pos..].chars().next().map_or(1, |c| c.len_utf8())
}

/// Find the `}` matching the `{` at `open`, quote- and escape-aware
///
/// Used for replacement fields: nested braces are balanced and quoted
/// segments are skipped so braces inside strings do not count.
pub(crate) fn matching_brace(text: &str, open: usize, limit: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 1usize;
    let mut i = open + 1;

    while i < limit {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            b'\\' if i + 1 < limit => {
                i += 1 + char_len(text, i + 1);
                continue;
            }
            b'\'' | b'"' => {
                i = skip_quoted(text, i, limit)?;
                continue;
            }
            _ => {}
        }
        i += char_len(text, i);
    }

    None
}

/// Skip a quoted run starting at `start`; returns the index after the
/// closing quote
fn skip_quoted(text: &str, start: usize, limit: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let quote = bytes[start];
    let triple = start + 3 <= limit && bytes[start + 1] == quote && bytes[start + 2] == quote;
    let mut i = if triple { start + 3 } else { start + 1 };

    while i < limit {
        if bytes[i] == b'\\' && i + 1 < limit {
            i += 1 + char_len(text, i + 1);
            continue;
        }
        if bytes[i] == quote {
            if !triple {
                return Some(i + 1);
            }
            if i + 3 <= limit && bytes[i + 1] == quote && bytes[i + 2] == quote {
                return Some(i + 3);
            }
        }
        i += char_len(text, i);
    }

    None
}

/// The complete, ordered rule table plus shared helper patterns
pub struct RuleSet {
    /// Region rules, in precedence order
    pub regions: Vec<RegionRule>,
    /// Pattern rules, in precedence order
    pub patterns: Vec<PatternRule>,
    /// Escape sequences inside non-raw strings
    pub(crate) escape: Regex,
    /// %-format directives inside strings
    pub(crate) percent: Regex,
    /// TODO markers inside comments
    pub(crate) todo: Regex,
    /// Doctest lines inside docstrings
    pub(crate) doctest: Regex,
    /// Rest-of-line shape a soft keyword requires
    pub(crate) soft_tail: Regex,
    /// Sync points: column-0 def/class/decorator lines
    pub(crate) sync: Regex,
}

impl RuleSet {
    /// Assemble a rule set and compile the shared helper patterns
    pub fn new(regions: Vec<RegionRule>, patterns: Vec<PatternRule>) -> Result<Self> {
        let aux = |name: &'static str, pattern: &str| -> Result<Regex> {
            Regex::new(pattern).map_err(|source| HighlightError::Pattern { name, source })
        };

        Ok(Self {
            regions,
            patterns,
            escape: aux(
                "escape",
                r#"\\(?:\n|x[0-9a-fA-F]{2}|[0-7]{1,3}|N\{[^}\n]+\}|u[0-9a-fA-F]{4}|U[0-9a-fA-F]{8}|['"abfnrtv\\])"#,
            )?,
            percent: aux(
                "percent",
                r"%(?:\([A-Za-z_][A-Za-z0-9_]*\))?[-#0 +]*(?:\d+|\*)?(?:\.(?:\d+|\*))?[hlL]?[diouxXeEfFgGcrsa%]",
            )?,
            todo: aux("todo", r"\b(?:TODO|FIXME|XXX|NOTE)\b")?,
            doctest: aux("doctest", r"(?m)^[ \t]*(>>>.*)$")?,
            soft_tail: aux("soft_tail", r"^[ \t].*:[ \t]*(?:#[^\n]*)?$")?,
            sync: aux("sync", r"(?m)^(?:(?:async[ \t]+)?def\b|class\b|@)")?,
        })
    }
}
