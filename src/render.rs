//! Rendering highlighted source
//!
//! Resolves token categories to styles through a [`Theme`] and writes
//! styled text with crossterm commands. Output goes to any [`Write`]
//! target; with color disabled the text passes through verbatim, so the
//! tool stays pipe-friendly.

use std::io::Write;

use crossterm::{
    queue,
    style::{
        Attribute, Color as TermColor, Print, ResetColor, SetAttribute, SetBackgroundColor,
        SetForegroundColor,
    },
};
use unicode_width::UnicodeWidthChar;

use crate::config::Config;
use crate::error::Result;
use crate::syntax::{Category, Color, Span, Style, Theme, Token};

/// Per-byte category resolution
///
/// Tokens are painted in order; a child always comes after its parent,
/// so the innermost category wins.
fn paint(text: &str, tokens: &[Token]) -> Vec<Category> {
    let mut categories = vec![Category::Plain; text.len()];
    for token in tokens {
        for slot in &mut categories[token.start..token.end] {
            *slot = token.category;
        }
    }
    categories
}

/// Flatten tokens into non-overlapping spans covering the whole text
///
/// Nested tokens are resolved to their innermost category; adjacent
/// bytes with the same category merge into one span.
pub fn resolve_spans(text: &str, tokens: &[Token]) -> Vec<Span> {
    let categories = paint(text, tokens);
    let mut spans = Vec::new();
    let mut i = 0;
    while i < categories.len() {
        let category = categories[i];
        let mut j = i + 1;
        while j < categories.len() && categories[j] == category {
            j += 1;
        }
        spans.push(Span::new(i, j, category));
        i = j;
    }
    spans
}

/// Writes highlighted source to a terminal or file
pub struct Renderer<'a> {
    theme: &'a Theme,
    color: bool,
    line_numbers: bool,
    tab_width: usize,
}

impl<'a> Renderer<'a> {
    /// Create a renderer over a theme and display settings
    pub fn new(theme: &'a Theme, config: &Config) -> Self {
        Self {
            theme,
            color: true,
            line_numbers: config.show_line_numbers,
            tab_width: config.tab_width.max(1),
        }
    }

    /// Builder: enable or disable color output
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Builder: enable or disable the line number gutter
    pub fn with_line_numbers(mut self, line_numbers: bool) -> Self {
        self.line_numbers = line_numbers;
        self
    }

    /// Render the whole text with its tokens
    pub fn render(&self, out: &mut impl Write, text: &str, tokens: &[Token]) -> Result<()> {
        let categories = paint(text, tokens);
        let line_count = text.split_inclusive('\n').count().max(1);
        let lnum_width = if self.line_numbers {
            line_number_width(line_count)
        } else {
            0
        };

        let mut offset = 0;
        let mut line_no = 1;
        for line in text.split_inclusive('\n') {
            self.render_line(out, line, offset, line_no, lnum_width, &categories)?;
            offset += line.len();
            line_no += 1;
        }
        out.flush()?;
        Ok(())
    }

    fn render_line(
        &self,
        out: &mut impl Write,
        line: &str,
        offset: usize,
        line_no: usize,
        lnum_width: usize,
        categories: &[Category],
    ) -> Result<()> {
        if lnum_width > 0 {
            let gutter = format!("{:>width$} ", line_no, width = lnum_width - 1);
            if self.color {
                queue!(
                    out,
                    SetForegroundColor(TermColor::DarkGrey),
                    Print(&gutter),
                    ResetColor
                )?;
            } else {
                queue!(out, Print(&gutter))?;
            }
        }

        let body = line.strip_suffix('\n').unwrap_or(line);
        let mut col = 0usize;
        let mut i = 0;
        while i < body.len() {
            let category = categories[offset + i];
            // Category changes only at token boundaries, which are char
            // boundaries, so a byte-wise run stays char-aligned
            let mut j = i + 1;
            while j < body.len() && categories[offset + j] == category {
                j += 1;
            }
            let expanded = self.expand(&body[i..j], &mut col);

            let style = self.theme.style_for(category);
            if self.color && !style.is_default() {
                apply_style(out, style)?;
                queue!(out, Print(&expanded), SetAttribute(Attribute::Reset))?;
            } else {
                queue!(out, Print(&expanded))?;
            }
            i = j;
        }

        if line.ends_with('\n') {
            queue!(out, Print("\n"))?;
        }
        Ok(())
    }

    /// Expand tabs to the next tab stop, tracking the display column
    fn expand(&self, run: &str, col: &mut usize) -> String {
        let mut out = String::with_capacity(run.len());
        for ch in run.chars() {
            if ch == '\t' {
                let next = (*col / self.tab_width + 1) * self.tab_width;
                while *col < next {
                    out.push(' ');
                    *col += 1;
                }
            } else {
                out.push(ch);
                *col += UnicodeWidthChar::width(ch).unwrap_or(1);
            }
        }
        out
    }
}

/// Width of the line number gutter (digits plus separator)
fn line_number_width(line_count: usize) -> usize {
    let mut digits = 1;
    let mut n = line_count;
    while n >= 10 {
        digits += 1;
        n /= 10;
    }
    digits + 1
}

fn apply_style(out: &mut impl Write, style: Style) -> Result<()> {
    if style.fg != Color::Default {
        queue!(out, SetForegroundColor(terminal_color(style.fg)))?;
    }
    if style.bg != Color::Default {
        queue!(out, SetBackgroundColor(terminal_color(style.bg)))?;
    }
    if style.bold {
        queue!(out, SetAttribute(Attribute::Bold))?;
    }
    if style.italic {
        queue!(out, SetAttribute(Attribute::Italic))?;
    }
    if style.underline {
        queue!(out, SetAttribute(Attribute::Underlined))?;
    }
    if style.reverse {
        queue!(out, SetAttribute(Attribute::Reverse))?;
    }
    Ok(())
}

/// Map palette colors to crossterm's naming (dark variants are the
/// normal ANSI colors)
fn terminal_color(color: Color) -> TermColor {
    match color {
        Color::Default => TermColor::Reset,
        Color::Black => TermColor::Black,
        Color::Red => TermColor::DarkRed,
        Color::Green => TermColor::DarkGreen,
        Color::Yellow => TermColor::DarkYellow,
        Color::Blue => TermColor::DarkBlue,
        Color::Magenta => TermColor::DarkMagenta,
        Color::Cyan => TermColor::DarkCyan,
        Color::White => TermColor::Grey,
        Color::BrightBlack => TermColor::DarkGrey,
        Color::BrightRed => TermColor::Red,
        Color::BrightGreen => TermColor::Green,
        Color::BrightYellow => TermColor::Yellow,
        Color::BrightBlue => TermColor::Blue,
        Color::BrightMagenta => TermColor::Magenta,
        Color::BrightCyan => TermColor::Cyan,
        Color::BrightWhite => TermColor::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::Tokenizer;

    fn highlight(text: &str) -> Vec<Token> {
        Tokenizer::new(&Config::default()).unwrap().tokenize(text)
    }

    #[test]
    fn test_resolve_spans_cover_text() {
        let text = "def f():\n    return 1\n";
        let spans = resolve_spans(text, &highlight(text));
        let mut pos = 0;
        for span in &spans {
            assert_eq!(span.start, pos);
            pos = span.end;
        }
        assert_eq!(pos, text.len());
    }

    #[test]
    fn test_resolve_spans_innermost_wins() {
        let text = "s = \"a\\n\"\n";
        let spans = resolve_spans(text, &highlight(text));
        let escape = spans
            .iter()
            .find(|s| s.category == Category::Escape)
            .expect("escape span");
        assert_eq!(&text[escape.start..escape.end], "\\n");
        // The string bytes around it still resolve to the string
        assert!(spans.iter().any(|s| s.category == Category::String));
    }

    #[test]
    fn test_no_color_output_is_verbatim() {
        let text = "def f(x: int) -> str:\n    return str(x)\n";
        let tokens = highlight(text);
        let theme = Theme::new();
        let renderer = Renderer::new(&theme, &Config::default()).with_color(false);
        let mut out = Vec::new();
        renderer.render(&mut out, text, &tokens).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), text);
    }

    #[test]
    fn test_color_output_contains_escapes() {
        let text = "def f():\n    pass\n";
        let tokens = highlight(text);
        let theme = Theme::new();
        let renderer = Renderer::new(&theme, &Config::default());
        let mut out = Vec::new();
        renderer.render(&mut out, text, &tokens).unwrap();
        let rendered = String::from_utf8(out).unwrap();
        assert!(rendered.contains("\x1b["));
        assert!(rendered.contains("def"));
        assert!(rendered.contains("pass"));
    }

    #[test]
    fn test_line_numbers_gutter() {
        let text = "a = 1\nb = 2\n";
        let tokens = highlight(text);
        let theme = Theme::new();
        let renderer = Renderer::new(&theme, &Config::default())
            .with_color(false)
            .with_line_numbers(true);
        let mut out = Vec::new();
        renderer.render(&mut out, text, &tokens).unwrap();
        let rendered = String::from_utf8(out).unwrap();
        assert_eq!(rendered, "1 a = 1\n2 b = 2\n");
    }

    #[test]
    fn test_tab_expansion() {
        let text = "if x:\n\tpass\n";
        let tokens = highlight(text);
        let theme = Theme::new();
        let config = Config {
            tab_width: 4,
            ..Config::default()
        };
        let renderer = Renderer::new(&theme, &config).with_color(false);
        let mut out = Vec::new();
        renderer.render(&mut out, text, &tokens).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "if x:\n    pass\n");
    }

    #[test]
    fn test_line_number_width() {
        assert_eq!(line_number_width(1), 2);
        assert_eq!(line_number_width(9), 2);
        assert_eq!(line_number_width(10), 3);
        assert_eq!(line_number_width(100), 4);
    }
}
