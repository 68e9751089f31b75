//! The tokenizer
//!
//! Turns Python source text into a flat, parent-linked sequence of
//! classified tokens. Top-level tokens tile the input exactly (gaps
//! become `Plain` tokens); child tokens nest strictly inside their
//! parent. Malformed input never fails: an unterminated region extends
//! to the end of its line or of the input.

use super::category::Category;
use super::python::python_rules;
use super::rules::{char_len, matching_brace, Contains, MatchContext, RuleSet};
use crate::config::Config;
use crate::error::Result;

/// A classified span of the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    /// Byte offset where the token starts (inclusive)
    pub start: usize,
    /// Byte offset where the token ends (exclusive)
    pub end: usize,
    /// Category of this token
    pub category: Category,
    /// Index of the enclosing token, if nested
    pub parent: Option<usize>,
}

impl Token {
    /// The matched text, borrowed from the source
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }

    /// Length of the token in bytes
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the token is empty
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Tokenizer for Python source
///
/// Holds the rule table built from a configuration snapshot. Each call
/// to [`tokenize`](Self::tokenize) is a pure function of the input; no
/// state survives between calls.
pub struct Tokenizer {
    rules: RuleSet,
    full_sync: bool,
}

impl Tokenizer {
    /// Build a tokenizer from a configuration snapshot
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            rules: python_rules(config)?,
            full_sync: config.slow_sync,
        })
    }

    /// Build a tokenizer from an explicit rule set
    pub fn with_rules(rules: RuleSet, full_sync: bool) -> Self {
        Self { rules, full_sync }
    }

    /// Tokenize a whole text
    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut scan = Scan {
            text,
            rules: &self.rules,
            tokens: Vec::new(),
        };
        scan.run(0, text.len(), None);
        scan.tokens
    }

    /// Find the nearest synchronization point at or before `offset`
    ///
    /// Sync points are column-0 def/class/decorator lines; tokenization
    /// can restart there without replaying earlier text. Returns 0 when
    /// there is none, or always when slow full-file sync is configured.
    pub fn sync_point(&self, text: &str, offset: usize) -> usize {
        if self.full_sync {
            return 0;
        }
        let offset = offset.min(text.len());
        let mut best = 0;
        for m in self.rules.sync.find_iter(text) {
            if m.start() > offset {
                break;
            }
            best = m.start();
        }
        best
    }

    /// Re-tokenize from the nearest sync point before `offset`
    ///
    /// Returns the restart position and the tokens covering the text
    /// from there to the end.
    pub fn tokenize_from(&self, text: &str, offset: usize) -> (usize, Vec<Token>) {
        let start = self.sync_point(text, offset);
        let mut scan = Scan {
            text,
            rules: &self.rules,
            tokens: Vec::new(),
        };
        scan.run(start, text.len(), None);
        (start, scan.tokens)
    }
}

/// What name the next identifier binds (after a def/class keyword)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingDef {
    Function,
    Class,
}

/// One tokenization pass over (part of) the text
struct Scan<'t, 'r> {
    text: &'t str,
    rules: &'r RuleSet,
    tokens: Vec<Token>,
}

impl<'t, 'r> Scan<'t, 'r> {
    fn push(&mut self, start: usize, end: usize, category: Category, parent: Option<usize>) -> usize {
        self.tokens.push(Token {
            start,
            end,
            category,
            parent,
        });
        self.tokens.len() - 1
    }

    fn flush_plain(&mut self, plain_from: &mut usize, upto: usize, parent: Option<usize>) {
        if *plain_from < upto {
            self.push(*plain_from, upto, Category::Plain, parent);
        }
        *plain_from = upto;
    }

    /// Scan `[from, to)` and append tokens
    ///
    /// Recursion point for replacement-field expressions: those run
    /// with `parent` set to the field token.
    fn run(&mut self, from: usize, to: usize, parent: Option<usize>) {
        let rules = self.rules;
        let mut pos = from;
        let mut plain_from = from;
        let mut pending_def: Option<PendingDef> = None;

        while pos < to {
            let ch = match self.text[pos..].chars().next() {
                Some(c) => c,
                None => break,
            };
            if ch == '\n' {
                pending_def = None;
            }

            // Region rules first
            if matches!(ch, '"' | '\'') || ch.is_ascii_alphabetic() {
                let mut hit = None;
                for (ri, region) in rules.regions.iter().enumerate() {
                    if let Some(content_start) = region.match_start_at(self.text, pos) {
                        if content_start <= to {
                            hit = Some((ri, content_start));
                            break;
                        }
                    }
                }
                if let Some((ri, content_start)) = hit {
                    self.flush_plain(&mut plain_from, pos, parent);
                    pos = self.emit_region(ri, pos, content_start, to, parent);
                    plain_from = pos;
                    pending_def = None;
                    continue;
                }
            }

            // Name bound by a pending def/class
            if pending_def.is_some() && (ch.is_alphabetic() || ch == '_') {
                let end = self.ident_end(pos, to);
                let category = match pending_def {
                    Some(PendingDef::Function) => Category::FunctionDef,
                    _ => Category::ClassDef,
                };
                self.flush_plain(&mut plain_from, pos, parent);
                self.push(pos, end, category, parent);
                plain_from = end;
                pos = end;
                pending_def = None;
                continue;
            }

            // Pattern rules, in declaration order
            let after_dot = (ch.is_alphabetic() || ch == '_') && self.after_dot(pos);
            let window = self.window_end(pos, to);
            let hay = &self.text[..window];
            let mut matched = None;
            for rule in &rules.patterns {
                if !rule.trigger.applies(ch) {
                    continue;
                }
                if rule.suppress_after_dot && after_dot {
                    continue;
                }
                let Some((start, end)) = rule.match_at(hay, pos) else {
                    continue;
                };
                if !self.context_ok(rule.context, pos, end) {
                    continue;
                }
                matched = Some((start, end, rule.category));
                break;
            }

            if let Some((start, end, category)) = matched {
                self.flush_plain(&mut plain_from, pos, parent);
                let idx = self.push(start, end, category, parent);
                match category {
                    Category::Comment | Category::TypeComment => {
                        self.scan_todos(start, end, idx);
                        pending_def = None;
                    }
                    Category::Keyword => {
                        pending_def = match &self.text[start..end] {
                            "def" => Some(PendingDef::Function),
                            "class" => Some(PendingDef::Class),
                            "async" => pending_def,
                            _ => None,
                        };
                    }
                    _ => pending_def = None,
                }
                plain_from = end;
                pos = end;
                continue;
            }

            // Nothing matched: plain identifier or single char
            if ch.is_alphabetic() || ch == '_' {
                pos = self.ident_end(pos, to);
            } else {
                if !ch.is_whitespace() {
                    pending_def = None;
                }
                pos += char_len(self.text, pos);
            }
        }

        self.flush_plain(&mut plain_from, to, parent);
    }

    /// Emit a region token and its children; returns the position after
    /// the region
    fn emit_region(
        &mut self,
        region_idx: usize,
        start: usize,
        content_start: usize,
        to: usize,
        parent: Option<usize>,
    ) -> usize {
        let rules = self.rules;
        let region = &rules.regions[region_idx];
        let end = region.find_end(self.text, content_start, to);
        let is_doc =
            region.docstring_eligible && parent.is_none() && self.docstring_position(start);
        let category = if is_doc {
            Category::Docstring
        } else {
            region.category
        };
        let idx = self.push(start, end.token_end, category, parent);
        self.scan_interior(content_start, end.content_end, idx, region.contains, is_doc);
        end.token_end
    }

    /// Sub-tokenize a string interior per its containment flags
    fn scan_interior(
        &mut self,
        from: usize,
        to: usize,
        parent_idx: usize,
        contains: Contains,
        is_doc: bool,
    ) {
        let rules = self.rules;

        // Doctest line ranges, found up front so the walk can step over
        // them in document order
        let mut doc_ranges = Vec::new();
        if is_doc && contains.doctests {
            for caps in rules.doctest.captures_iter(&self.text[from..to]) {
                if let Some(group) = caps.get(1) {
                    doc_ranges.push((from + group.start(), from + group.end()));
                }
            }
        }
        let mut next_doc = 0;

        let bytes = self.text.as_bytes();
        let mut i = from;
        while i < to {
            if next_doc < doc_ranges.len() && doc_ranges[next_doc].0 == i {
                let (start, end) = doc_ranges[next_doc];
                self.push(start, end, Category::Doctest, Some(parent_idx));
                next_doc += 1;
                i = end;
                continue;
            }

            let b = bytes[i];

            if contains.fields && b == b'{' {
                if bytes.get(i + 1) == Some(&b'{') && i + 2 <= to {
                    self.push(i, i + 2, Category::Escape, Some(parent_idx));
                    i += 2;
                    continue;
                }
                i = self.scan_field(i, to, parent_idx);
                continue;
            }
            if contains.fields && b == b'}' && bytes.get(i + 1) == Some(&b'}') && i + 2 <= to {
                self.push(i, i + 2, Category::Escape, Some(parent_idx));
                i += 2;
                continue;
            }
            if contains.escapes && b == b'\\' {
                if let Some(m) = rules.escape.find_at(self.text, i) {
                    if m.start() == i && m.end() <= to {
                        self.push(i, m.end(), Category::Escape, Some(parent_idx));
                        i = m.end();
                        continue;
                    }
                }
                // Unrecognized escape stays literal
                i += 1;
                if i < to {
                    i += char_len(self.text, i);
                }
                continue;
            }
            if contains.percent && b == b'%' {
                if let Some(m) = rules.percent.find_at(self.text, i) {
                    if m.start() == i && m.end() <= to {
                        self.push(i, m.end(), Category::FormatSpec, Some(parent_idx));
                        i = m.end();
                        continue;
                    }
                }
            }

            i += char_len(self.text, i);
        }
    }

    /// Emit a replacement field and its parts; returns the position
    /// after the field
    fn scan_field(&mut self, open: usize, limit: usize, string_idx: usize) -> usize {
        let close = matching_brace(self.text, open, limit);
        // An unterminated field swallows the rest of the region
        let field_end = close.map_or(limit, |c| c + 1);
        let idx = self.push(open, field_end, Category::ReplacementField, Some(string_idx));

        let inner_start = open + 1;
        let inner_end = close.unwrap_or(limit);
        if inner_start >= inner_end {
            return field_end;
        }

        let (expr_end, conversion, spec) = split_field(self.text, inner_start, inner_end);
        self.run(inner_start, expr_end, Some(idx));
        if let Some((start, end)) = conversion {
            self.push(start, end, Category::Conversion, Some(idx));
        }
        if let Some((start, end)) = spec {
            let spec_idx = self.push(start, end, Category::FormatSpec, Some(idx));
            // Format specs may nest further fields ({:>{width}})
            let mut i = start + 1;
            while i < end {
                if self.text.as_bytes()[i] == b'{' {
                    i = self.scan_field(i, end, spec_idx);
                } else {
                    i += char_len(self.text, i);
                }
            }
        }

        field_end
    }

    /// Emit Todo child tokens inside a comment
    fn scan_todos(&mut self, start: usize, end: usize, parent_idx: usize) {
        let rules = self.rules;
        let hay = &self.text[..end];
        let mut at = start;
        while let Some(m) = rules.todo.find_at(hay, at) {
            self.push(m.start(), m.end(), Category::Todo, Some(parent_idx));
            at = m.end();
        }
    }

    /// End of the identifier starting at `pos`
    fn ident_end(&self, pos: usize, to: usize) -> usize {
        let mut end = pos;
        for c in self.text[pos..to].chars() {
            if c.is_alphanumeric() || c == '_' {
                end += c.len_utf8();
            } else {
                break;
            }
        }
        end
    }

    /// Is the identifier at `pos` an attribute access (preceded by `.`)?
    fn after_dot(&self, pos: usize) -> bool {
        self.text[..pos].chars().rev().find(|c| !c.is_whitespace()) == Some('.')
    }

    /// Only indentation before `pos` on its line?
    fn at_statement_start(&self, pos: usize) -> bool {
        let line_start = self.text[..pos].rfind('\n').map_or(0, |i| i + 1);
        self.text[line_start..pos]
            .chars()
            .all(|c| c == ' ' || c == '\t')
    }

    /// Check a rule's structural condition
    fn context_ok(&self, context: MatchContext, pos: usize, match_end: usize) -> bool {
        match context {
            MatchContext::Any => true,
            MatchContext::StatementStart => self.at_statement_start(pos),
            MatchContext::StatementStartWithColon => {
                if !self.at_statement_start(pos) {
                    return false;
                }
                let eol = self.text[match_end..]
                    .find('\n')
                    .map_or(self.text.len(), |i| match_end + i);
                self.rules.soft_tail.is_match(&self.text[match_end..eol])
            }
            MatchContext::UnionPosition => self.union_position(pos),
        }
    }

    /// Does a `|` at `pos` separate type expressions?
    ///
    /// The original rules treated any whitespace-surrounded `|` as a
    /// union separator, which misfires on bitwise or. We only accept it
    /// after something type-shaped: a type name, None, or a closing
    /// bracket (dict[str, int] | None).
    fn union_position(&self, pos: usize) -> bool {
        if self.text[..pos].chars().rev().find(|c| !c.is_whitespace()) == Some(']') {
            return true;
        }
        match self.tokens.last() {
            Some(t) => {
                matches!(
                    t.category,
                    Category::PrimitiveType | Category::TypingContainer
                ) || (t.category == Category::Keyword && t.text(self.text) == "None")
            }
            None => false,
        }
    }

    /// Is the triple-quoted string starting at `start` in docstring
    /// position (first statement of the file or of a def/class body)?
    fn docstring_position(&self, start: usize) -> bool {
        let text = self.text;
        let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
        // The string must begin its statement
        if !text[line_start..start]
            .chars()
            .all(|c| c == ' ' || c == '\t')
        {
            return false;
        }

        // Walk back over blank and comment lines to the previous
        // significant line
        let mut cursor = line_start;
        loop {
            if cursor == 0 {
                // First statement of the file
                return true;
            }
            let prev_end = cursor - 1;
            let prev_start = text[..prev_end].rfind('\n').map_or(0, |i| i + 1);
            let line = text[prev_start..prev_end].trim();
            if line.is_empty() || line.starts_with('#') {
                cursor = prev_start;
                continue;
            }

            // The significant line must close a def/class header
            let code = match line.find('#') {
                Some(hash) => line[..hash].trim_end(),
                None => line,
            };
            let body = if line.ends_with(':') { line } else { code };
            if !body.ends_with(':') {
                return false;
            }

            // Walk up to the start of the logical line (multi-line
            // signatures keep open brackets above)
            let mut balance = net_brackets(body);
            let mut head_start = prev_start;
            while balance < 0 && head_start > 0 {
                let e = head_start - 1;
                let s = text[..e].rfind('\n').map_or(0, |i| i + 1);
                balance += net_brackets(&text[s..e]);
                head_start = s;
            }
            return is_def_or_class_header(&text[head_start..prev_end]);
        }
    }

    /// A bounded haystack for pattern matching at `pos`
    ///
    /// Patterns are matched against `text[..window]` so a miss cannot
    /// scan the whole rest of the input; the window always ends at a
    /// real token boundary so word boundaries stay truthful.
    fn window_end(&self, pos: usize, to: usize) -> usize {
        let text = self.text;
        let bytes = text.as_bytes();
        let ch = match text[pos..].chars().next() {
            Some(c) => c,
            None => return pos,
        };

        let mut i;
        if ch.is_alphabetic() || ch == '_' {
            // Identifier, optional spaces, one more char (call paren)
            i = self.ident_end(pos, to);
            while i < to && matches!(bytes[i], b' ' | b'\t') {
                i += 1;
            }
            if i < to {
                i += char_len(text, i);
            }
        } else if ch.is_ascii_digit() || ch == '.' {
            // Number-ish run, including signs after an exponent
            i = pos;
            let mut prev = 0u8;
            while i < to {
                let b = bytes[i];
                let ok = b.is_ascii_alphanumeric()
                    || b == b'_'
                    || b == b'.'
                    || ((b == b'+' || b == b'-') && matches!(prev, b'e' | b'E'));
                if !ok {
                    break;
                }
                prev = b;
                i += 1;
            }
        } else if ch == '#' {
            i = text[pos..to].find('\n').map_or(to, |n| pos + n);
        } else if ch == ' ' || ch == '\t' {
            // Whitespace run plus the following char, so trailing-space
            // detection can see whether a newline follows
            i = pos;
            while i < to && matches!(bytes[i], b' ' | b'\t') {
                i += 1;
            }
            if i < to {
                i += char_len(text, i);
            }
        } else if ch == '@' {
            i = pos + 1;
            while i < to && matches!(bytes[i], b' ' | b'\t') {
                i += 1;
            }
            while i < to && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.')
            {
                i += 1;
            }
        } else {
            // Longest operator is three chars
            i = pos;
            for _ in 0..3 {
                if i < to {
                    i += char_len(text, i);
                }
            }
        }
        i.min(to)
    }
}

/// Split a replacement-field interior into expression, conversion flag
/// and format spec
fn split_field(
    text: &str,
    start: usize,
    end: usize,
) -> (usize, Option<(usize, usize)>, Option<(usize, usize)>) {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut spec_start = None;
    let mut i = start;
    while i < end {
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            b'\'' | b'"' => {
                i = skip_str(text, i, end);
                continue;
            }
            b'\\' if i + 1 < end => {
                i += 1 + char_len(text, i + 1);
                continue;
            }
            b':' if depth == 0 => {
                spec_start = Some(i);
                break;
            }
            _ => {}
        }
        i += char_len(text, i);
    }

    let boundary = spec_start.unwrap_or(end);
    let conversion = if boundary >= start + 2
        && bytes[boundary - 2] == b'!'
        && matches!(bytes[boundary - 1], b'r' | b's' | b'a')
    {
        Some((boundary - 2, boundary))
    } else {
        None
    };
    let expr_end = conversion.map_or(boundary, |(s, _)| s);
    let spec = spec_start.map(|s| (s, end));
    (expr_end, conversion, spec)
}

/// Skip past a quoted literal starting at `start` (best effort); always
/// makes progress
fn skip_str(text: &str, start: usize, limit: usize) -> usize {
    let bytes = text.as_bytes();
    let quote = bytes[start];
    let mut i = start + 1;
    while i < limit {
        if bytes[i] == b'\\' && i + 1 < limit {
            i += 1 + char_len(text, i + 1);
            continue;
        }
        if bytes[i] == quote {
            return i + 1;
        }
        i += char_len(text, i);
    }
    limit
}

/// Net open-bracket count of a line (naive: ignores strings)
fn net_brackets(line: &str) -> i32 {
    line.chars()
        .map(|c| match c {
            '(' | '[' | '{' => 1,
            ')' | ']' | '}' => -1,
            _ => 0,
        })
        .sum()
}

/// Does this logical line open a def or class body?
fn is_def_or_class_header(head: &str) -> bool {
    let mut head = head.trim_start();
    if let Some(rest) = strip_word(head, "async") {
        head = rest.trim_start();
        return strip_word(head, "def").is_some();
    }
    strip_word(head, "def").is_some() || strip_word(head, "class").is_some()
}

/// Strip a leading word if it ends at a word boundary
fn strip_word<'a>(s: &'a str, word: &str) -> Option<&'a str> {
    let rest = s.strip_prefix(word)?;
    match rest.chars().next() {
        Some(c) if c.is_alphanumeric() || c == '_' => None,
        _ => Some(rest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> Tokenizer {
        Tokenizer::new(&Config::default()).unwrap()
    }

    /// Category of the token whose text equals `needle` (first match)
    fn category_of(tokens: &[Token], text: &str, needle: &str) -> Option<Category> {
        tokens
            .iter()
            .find(|t| t.text(text) == needle)
            .map(|t| t.category)
    }

    /// Top-level tokens tile the input; children nest strictly
    fn assert_invariants(text: &str, tokens: &[Token]) {
        let mut pos = 0;
        for token in tokens.iter().filter(|t| t.parent.is_none()) {
            assert_eq!(token.start, pos, "gap or overlap at {} in {:?}", pos, text);
            assert!(token.end > token.start);
            pos = token.end;
        }
        assert_eq!(pos, text.len(), "input not fully covered");

        for (i, token) in tokens.iter().enumerate() {
            if let Some(p) = token.parent {
                assert!(p < i, "parent must precede child");
                assert!(tokens[p].start <= token.start && token.end <= tokens[p].end);
            }
        }
    }

    #[test]
    fn test_coverage_and_idempotence() {
        let text = r#"import os

def greet(name: str) -> str:
    """Say hello.

    >>> greet("x")
    """
    return f"Hello, {name!r:>10}!"  # TODO greet better

class Greeter:
    pass
"#;
        let tok = tokenizer();
        let first = tok.tokenize(text);
        assert_invariants(text, &first);
        let second = tok.tokenize(text);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input() {
        let tokens = tokenizer().tokenize("");
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_return_arrow_and_types() {
        let text = "def foo(x: int) -> str:\n    pass\n";
        let tokens = tokenizer().tokenize(text);
        assert_invariants(text, &tokens);
        assert_eq!(category_of(&tokens, text, "def"), Some(Category::Keyword));
        assert_eq!(category_of(&tokens, text, "foo"), Some(Category::FunctionDef));
        assert_eq!(category_of(&tokens, text, "int"), Some(Category::PrimitiveType));
        assert_eq!(category_of(&tokens, text, "->"), Some(Category::ReturnArrow));
        assert_eq!(category_of(&tokens, text, "str"), Some(Category::PrimitiveType));
        assert_eq!(category_of(&tokens, text, "pass"), Some(Category::Keyword));
    }

    #[test]
    fn test_typing_container() {
        let text = "x: List[int] = []\n";
        let tokens = tokenizer().tokenize(text);
        assert_eq!(category_of(&tokens, text, "List"), Some(Category::TypingContainer));
        assert_eq!(category_of(&tokens, text, "int"), Some(Category::PrimitiveType));
        assert_eq!(category_of(&tokens, text, "="), Some(Category::Operator));
    }

    #[test]
    fn test_class_def_name() {
        let text = "class Stack(Generic[T]):\n    pass\n";
        let tokens = tokenizer().tokenize(text);
        assert_eq!(category_of(&tokens, text, "Stack"), Some(Category::ClassDef));
        assert_eq!(
            category_of(&tokens, text, "Generic"),
            Some(Category::TypingContainer)
        );
    }

    #[test]
    fn test_async_def_name() {
        let text = "async def fetch(url: str) -> bytes:\n    pass\n";
        let tokens = tokenizer().tokenize(text);
        assert_eq!(category_of(&tokens, text, "async"), Some(Category::Keyword));
        assert_eq!(category_of(&tokens, text, "fetch"), Some(Category::FunctionDef));
        assert_eq!(category_of(&tokens, text, "bytes"), Some(Category::PrimitiveType));
    }

    #[test]
    fn test_replacement_field_structure() {
        let text = "f\"text {value!r:>10}\"";
        let tokens = tokenizer().tokenize(text);
        assert_invariants(text, &tokens);

        let string_idx = tokens
            .iter()
            .position(|t| t.category == Category::FString)
            .unwrap();
        let field_idx = tokens
            .iter()
            .position(|t| t.category == Category::ReplacementField)
            .unwrap();
        let field = tokens[field_idx];
        assert_eq!(field.text(text), "{value!r:>10}");
        assert_eq!(field.parent, Some(string_idx));

        let expr = tokens
            .iter()
            .find(|t| t.text(text) == "value")
            .expect("inner expression token");
        assert_eq!(expr.parent, Some(field_idx));

        let conv = tokens
            .iter()
            .find(|t| t.category == Category::Conversion)
            .unwrap();
        assert_eq!(conv.text(text), "!r");
        assert_eq!(conv.parent, Some(field_idx));

        let spec = tokens
            .iter()
            .find(|t| t.category == Category::FormatSpec)
            .unwrap();
        assert_eq!(spec.text(text), ":>10");
        assert_eq!(spec.parent, Some(field_idx));
    }

    #[test]
    fn test_doubled_braces_are_literal() {
        let text = "f\"a {{literal}} b\"";
        let tokens = tokenizer().tokenize(text);
        assert_invariants(text, &tokens);
        assert!(tokens
            .iter()
            .all(|t| t.category != Category::ReplacementField));
        let escapes: Vec<_> = tokens
            .iter()
            .filter(|t| t.category == Category::Escape)
            .map(|t| t.text(text))
            .collect();
        assert_eq!(escapes, vec!["{{", "}}"]);
    }

    #[test]
    fn test_plain_string_has_no_fields() {
        let text = "\"a {value} b\"";
        let tokens = tokenizer().tokenize(text);
        assert!(tokens
            .iter()
            .all(|t| t.category != Category::ReplacementField));
    }

    #[test]
    fn test_nested_string_in_field() {
        let text = "f\"{d['k']}\"";
        let tokens = tokenizer().tokenize(text);
        assert_invariants(text, &tokens);
        let field_idx = tokens
            .iter()
            .position(|t| t.category == Category::ReplacementField)
            .unwrap();
        let inner = tokens
            .iter()
            .find(|t| t.category == Category::String)
            .expect("nested string literal");
        assert_eq!(inner.text(text), "'k'");
        assert_eq!(inner.parent, Some(field_idx));
    }

    #[test]
    fn test_nested_field_in_format_spec() {
        let text = "f\"{x:>{width}}\"";
        let tokens = tokenizer().tokenize(text);
        assert_invariants(text, &tokens);
        let fields: Vec<_> = tokens
            .iter()
            .filter(|t| t.category == Category::ReplacementField)
            .map(|t| t.text(text))
            .collect();
        assert_eq!(fields, vec!["{x:>{width}}", "{width}"]);
    }

    #[test]
    fn test_attribute_access_suppression() {
        let text = "obj.str\n";
        let tokens = tokenizer().tokenize(text);
        assert_ne!(category_of(&tokens, text, "str"), Some(Category::PrimitiveType));

        let text = "value.print\n";
        let tokens = tokenizer().tokenize(text);
        assert_ne!(category_of(&tokens, text, "print"), Some(Category::Builtin));

        // Method calls are still calls
        let text = "obj.method(1)\n";
        let tokens = tokenizer().tokenize(text);
        assert_eq!(
            category_of(&tokens, text, "method"),
            Some(Category::FunctionCall)
        );
    }

    #[test]
    fn test_docstring_positions() {
        let text = "def f():\n    \"\"\"doc\"\"\"\n    x = \"\"\"not doc\"\"\"\n";
        let tokens = tokenizer().tokenize(text);
        assert_eq!(
            category_of(&tokens, text, "\"\"\"doc\"\"\""),
            Some(Category::Docstring)
        );
        assert_eq!(
            category_of(&tokens, text, "\"\"\"not doc\"\"\""),
            Some(Category::String)
        );
    }

    #[test]
    fn test_second_string_in_body_is_not_docstring() {
        let text = "def f():\n    \"\"\"doc\"\"\"\n    \"\"\"second\"\"\"\n";
        let tokens = tokenizer().tokenize(text);
        assert_eq!(
            category_of(&tokens, text, "\"\"\"second\"\"\""),
            Some(Category::String)
        );
    }

    #[test]
    fn test_module_docstring_after_comments() {
        let text = "#!/usr/bin/env python3\n# a header comment\n\n\"\"\"Module doc.\"\"\"\n";
        let tokens = tokenizer().tokenize(text);
        assert_eq!(
            category_of(&tokens, text, "\"\"\"Module doc.\"\"\""),
            Some(Category::Docstring)
        );
    }

    #[test]
    fn test_docstring_after_multiline_signature() {
        let text = "def f(\n    x: int,\n) -> int:\n    \"\"\"doc\"\"\"\n";
        let tokens = tokenizer().tokenize(text);
        assert_eq!(
            category_of(&tokens, text, "\"\"\"doc\"\"\""),
            Some(Category::Docstring)
        );
    }

    #[test]
    fn test_soft_keywords() {
        let text = "match command:\n    case 1:\n        pass\n";
        let tokens = tokenizer().tokenize(text);
        assert_eq!(category_of(&tokens, text, "match"), Some(Category::SoftKeyword));
        assert_eq!(category_of(&tokens, text, "case"), Some(Category::SoftKeyword));
    }

    #[test]
    fn test_soft_keyword_negative() {
        // No colon on the line: plain identifier
        let text = "match = 3\n";
        let tokens = tokenizer().tokenize(text);
        assert!(tokens.iter().all(|t| t.category != Category::SoftKeyword));

        // Not at statement start
        let text = "result = match\n";
        let tokens = tokenizer().tokenize(text);
        assert!(tokens.iter().all(|t| t.category != Category::SoftKeyword));
    }

    #[test]
    fn test_unterminated_triple_extends_to_eof() {
        let text = "x = \"\"\"never closed";
        let tokens = tokenizer().tokenize(text);
        assert_invariants(text, &tokens);
        let string = tokens
            .iter()
            .find(|t| t.category == Category::String)
            .unwrap();
        assert_eq!(string.end, text.len());
    }

    #[test]
    fn test_unterminated_single_stops_at_newline() {
        let text = "s = \"abc\nt = 2\n";
        let tokens = tokenizer().tokenize(text);
        assert_invariants(text, &tokens);
        let string = tokens
            .iter()
            .find(|t| t.category == Category::String)
            .unwrap();
        assert_eq!(string.text(text), "\"abc");
        assert_eq!(category_of(&tokens, text, "2"), Some(Category::Number));
    }

    #[test]
    fn test_string_prefixes() {
        let text = "a = rb\"raw bytes\"\nb = f\"fmt\"\nc = r\"raw\"\nd = b\"bytes\"\n";
        let tokens = tokenizer().tokenize(text);
        assert_eq!(
            category_of(&tokens, text, "rb\"raw bytes\""),
            Some(Category::BytesString)
        );
        assert_eq!(category_of(&tokens, text, "f\"fmt\""), Some(Category::FString));
        assert_eq!(category_of(&tokens, text, "r\"raw\""), Some(Category::RawString));
        assert_eq!(category_of(&tokens, text, "b\"bytes\""), Some(Category::BytesString));
    }

    #[test]
    fn test_escape_sequences() {
        let text = "s = \"a\\nb\\x41\"\n";
        let tokens = tokenizer().tokenize(text);
        let escapes: Vec<_> = tokens
            .iter()
            .filter(|t| t.category == Category::Escape)
            .map(|t| t.text(text))
            .collect();
        assert_eq!(escapes, vec!["\\n", "\\x41"]);

        // Raw strings get no escape tokens
        let text = "s = r\"a\\nb\"\n";
        let tokens = tokenizer().tokenize(text);
        assert!(tokens.iter().all(|t| t.category != Category::Escape));
    }

    #[test]
    fn test_percent_directive() {
        let text = "s = \"%s of %(num)d%%\"\n";
        let tokens = tokenizer().tokenize(text);
        let specs: Vec<_> = tokens
            .iter()
            .filter(|t| t.category == Category::FormatSpec)
            .map(|t| t.text(text))
            .collect();
        assert_eq!(specs, vec!["%s", "%(num)d", "%%"]);
    }

    #[test]
    fn test_numbers() {
        let text = "n = 0xFF + 0b1010_1010 + 0o755 + 1_000_000 + 3.14e-2 + 2j + .5\n";
        let tokens = tokenizer().tokenize(text);
        for needle in ["0xFF", "0b1010_1010", "0o755", "1_000_000", "3.14e-2", "2j", ".5"] {
            assert_eq!(
                category_of(&tokens, text, needle),
                Some(Category::Number),
                "{}",
                needle
            );
        }
    }

    #[test]
    fn test_union_operator() {
        let text = "def get() -> int | None:\n    pass\n";
        let tokens = tokenizer().tokenize(text);
        assert_eq!(category_of(&tokens, text, "|"), Some(Category::UnionOperator));

        // Bitwise or with plain operands stays an operator
        let text = "v = a | b\n";
        let tokens = tokenizer().tokenize(text);
        assert_eq!(category_of(&tokens, text, "|"), Some(Category::Operator));
    }

    #[test]
    fn test_union_after_subscript() {
        let text = "x: dict[str, int] | None = None\n";
        let tokens = tokenizer().tokenize(text);
        assert_eq!(category_of(&tokens, text, "|"), Some(Category::UnionOperator));
    }

    #[test]
    fn test_decorator_vs_matmul() {
        let text = "@property\ndef f(self):\n    pass\n";
        let tokens = tokenizer().tokenize(text);
        assert_eq!(
            category_of(&tokens, text, "@property"),
            Some(Category::Decorator)
        );
        assert_eq!(category_of(&tokens, text, "self"), Some(Category::ClassVar));

        let text = "y = a @ b\n";
        let tokens = tokenizer().tokenize(text);
        assert_eq!(category_of(&tokens, text, "@"), Some(Category::Operator));
    }

    #[test]
    fn test_type_comment() {
        let text = "x = []  # type: list[int]\n";
        let tokens = tokenizer().tokenize(text);
        assert_eq!(
            category_of(&tokens, text, "# type: list[int]"),
            Some(Category::TypeComment)
        );
    }

    #[test]
    fn test_todo_marker() {
        let text = "pass  # TODO fix this\n";
        let tokens = tokenizer().tokenize(text);
        let comment_idx = tokens
            .iter()
            .position(|t| t.category == Category::Comment)
            .unwrap();
        let todo = tokens
            .iter()
            .find(|t| t.category == Category::Todo)
            .unwrap();
        assert_eq!(todo.text(text), "TODO");
        assert_eq!(todo.parent, Some(comment_idx));
    }

    #[test]
    fn test_doctest_lines() {
        let text = "def f():\n    \"\"\"Doc.\n\n    >>> f()\n    1\n    \"\"\"\n";
        let tokens = tokenizer().tokenize(text);
        assert_invariants(text, &tokens);
        let doc_idx = tokens
            .iter()
            .position(|t| t.category == Category::Docstring)
            .unwrap();
        let doctest = tokens
            .iter()
            .find(|t| t.category == Category::Doctest)
            .expect("doctest token");
        assert_eq!(doctest.text(text), ">>> f()");
        assert_eq!(doctest.parent, Some(doc_idx));
    }

    #[test]
    fn test_exceptions_and_builtins() {
        let text = "try:\n    x = len(items)\nexcept ValueError:\n    raise\n";
        let tokens = tokenizer().tokenize(text);
        assert_eq!(category_of(&tokens, text, "len"), Some(Category::Builtin));
        assert_eq!(
            category_of(&tokens, text, "ValueError"),
            Some(Category::Exception)
        );
        assert_eq!(category_of(&tokens, text, "raise"), Some(Category::Keyword));
    }

    #[test]
    fn test_function_call_detection() {
        let text = "result = compute(1, 2)\n";
        let tokens = tokenizer().tokenize(text);
        assert_eq!(
            category_of(&tokens, text, "compute"),
            Some(Category::FunctionCall)
        );

        // Builtins win over the generic call rule
        let text = "print(1)\n";
        let tokens = tokenizer().tokenize(text);
        assert_eq!(category_of(&tokens, text, "print"), Some(Category::Builtin));
    }

    #[test]
    fn test_space_errors_gated() {
        let text = "x = 1  \n";
        let tokens = tokenizer().tokenize(text);
        assert!(tokens.iter().all(|t| t.category != Category::SpaceError));

        let config = Config {
            space_errors: true,
            ..Config::default()
        };
        let tokens = Tokenizer::new(&config).unwrap().tokenize(text);
        let err = tokens
            .iter()
            .find(|t| t.category == Category::SpaceError)
            .expect("trailing whitespace flagged");
        assert_eq!(err.text(text), "  ");
    }

    #[test]
    fn test_sync_point_and_restart() {
        let text = "def a():\n    return 1\n\n\ndef b():\n    return 2\n";
        let tok = tokenizer();
        let second_def = text.rfind("def b").unwrap();

        assert_eq!(tok.sync_point(text, text.len()), second_def);
        assert_eq!(tok.sync_point(text, 5), 0);

        let (start, partial) = tok.tokenize_from(text, text.len());
        assert_eq!(start, second_def);

        // Restarted tokens match the tail of a full pass
        let full = tok.tokenize(text);
        let tail: Vec<_> = full
            .iter()
            .filter(|t| t.start >= second_def)
            .map(|t| (t.start, t.end, t.category))
            .collect();
        let restarted: Vec<_> = partial
            .iter()
            .map(|t| (t.start, t.end, t.category))
            .collect();
        assert_eq!(tail, restarted);
    }

    #[test]
    fn test_slow_sync_forces_full_rescan() {
        let config = Config {
            slow_sync: true,
            ..Config::default()
        };
        let tok = Tokenizer::new(&config).unwrap();
        let text = "def a():\n    pass\n\ndef b():\n    pass\n";
        assert_eq!(tok.sync_point(text, text.len()), 0);
        let (start, _) = tok.tokenize_from(text, text.len());
        assert_eq!(start, 0);
    }

    #[test]
    fn test_walrus_and_comparison_operators() {
        let text = "if (n := len(s)) >= 3:\n    pass\n";
        let tokens = tokenizer().tokenize(text);
        assert_eq!(category_of(&tokens, text, ":="), Some(Category::Operator));
        assert_eq!(category_of(&tokens, text, ">="), Some(Category::Operator));
    }
}
