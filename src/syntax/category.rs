//! Token categories
//!
//! The semantic categories a span of Python source can be classified as,
//! and their default visual styles. The [`Theme`](super::theme::Theme)
//! resolves categories to styles and lets callers override any of them.

use super::style::{Color, Style};

/// Semantic categories for Python source spans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Reserved keywords (def, return, if, ...)
    Keyword,
    /// Identifiers that are keywords only in position (match, case)
    SoftKeyword,
    /// Builtin function names (len, print, ...)
    Builtin,
    /// Standard exception names (ValueError, ...)
    Exception,
    /// Primitive type names (int, str, float, ...)
    PrimitiveType,
    /// typing-module containers and helpers (List, Optional, TypeVar, ...)
    TypingContainer,
    /// Name bound by a def statement
    FunctionDef,
    /// Name bound by a class statement
    ClassDef,
    /// Name followed by a call parenthesis
    FunctionCall,
    /// Decorator (@name)
    Decorator,
    /// Instance/class receiver names (self, cls, mcs)
    ClassVar,
    /// Plain string literals
    String,
    /// Raw string literals (r-prefixed)
    RawString,
    /// Bytes literals (b-prefixed)
    BytesString,
    /// Formatted string literals (f-prefixed)
    FString,
    /// Triple-quoted string in docstring position
    Docstring,
    /// Escape sequences and literal doubled braces inside strings
    Escape,
    /// f-string replacement field ({expr})
    ReplacementField,
    /// Conversion flag inside a replacement field (!r, !s, !a)
    Conversion,
    /// Format spec inside a replacement field, or a %-directive
    FormatSpec,
    /// `>>>` example line inside a docstring
    Doctest,
    /// Numeric literals
    Number,
    /// Operator symbols
    Operator,
    /// Return type arrow (->)
    ReturnArrow,
    /// Union type separator (| in annotation position)
    UnionOperator,
    /// Comments
    Comment,
    /// Legacy `# type:` comments
    TypeComment,
    /// TODO/FIXME/XXX markers inside comments
    Todo,
    /// Trailing whitespace / spaces before tabs
    SpaceError,
    /// Anything else
    Plain,
}

impl Category {
    /// Get the default style for this category
    pub fn default_style(&self) -> Style {
        match self {
            Category::Keyword => Style::fg(Color::Magenta).with_bold(),
            Category::SoftKeyword => Style::fg(Color::Magenta).with_bold(),
            Category::Builtin => Style::fg(Color::Blue),
            Category::Exception => Style::fg(Color::BrightRed),
            Category::PrimitiveType => Style::fg(Color::Yellow),
            Category::TypingContainer => Style::fg(Color::BrightYellow),
            Category::FunctionDef => Style::fg(Color::BrightBlue).with_bold(),
            Category::ClassDef => Style::fg(Color::BrightYellow).with_bold(),
            Category::FunctionCall => Style::fg(Color::BrightBlue),
            Category::Decorator => Style::fg(Color::BrightMagenta),
            Category::ClassVar => Style::fg(Color::BrightCyan).with_italic(),
            Category::String => Style::fg(Color::Green),
            Category::RawString => Style::fg(Color::Green),
            Category::BytesString => Style::fg(Color::BrightGreen),
            Category::FString => Style::fg(Color::Green),
            Category::Docstring => Style::fg(Color::BrightGreen).with_italic(),
            Category::Escape => Style::fg(Color::BrightYellow),
            Category::ReplacementField => Style::fg(Color::Cyan),
            Category::Conversion => Style::fg(Color::BrightCyan),
            Category::FormatSpec => Style::fg(Color::BrightCyan),
            Category::Doctest => Style::fg(Color::BrightBlue),
            Category::Number => Style::fg(Color::Cyan),
            Category::Operator => Style::fg(Color::BrightWhite),
            Category::ReturnArrow => Style::fg(Color::BrightMagenta).with_bold(),
            Category::UnionOperator => Style::fg(Color::BrightMagenta),
            Category::Comment => Style::fg(Color::BrightBlack).with_italic(),
            Category::TypeComment => Style::fg(Color::BrightBlack).with_bold(),
            Category::Todo => Style::fg(Color::BrightYellow).with_bold(),
            Category::SpaceError => Style::bg(Color::Red),
            Category::Plain => Style::default(),
        }
    }

    /// Get the name of this category (used as key in theme files)
    pub fn name(&self) -> &'static str {
        match self {
            Category::Keyword => "keyword",
            Category::SoftKeyword => "soft-keyword",
            Category::Builtin => "builtin",
            Category::Exception => "exception",
            Category::PrimitiveType => "primitive-type",
            Category::TypingContainer => "typing-container",
            Category::FunctionDef => "function-def",
            Category::ClassDef => "class-def",
            Category::FunctionCall => "function-call",
            Category::Decorator => "decorator",
            Category::ClassVar => "class-var",
            Category::String => "string",
            Category::RawString => "raw-string",
            Category::BytesString => "bytes-string",
            Category::FString => "f-string",
            Category::Docstring => "docstring",
            Category::Escape => "escape",
            Category::ReplacementField => "replacement-field",
            Category::Conversion => "conversion",
            Category::FormatSpec => "format-spec",
            Category::Doctest => "doctest",
            Category::Number => "number",
            Category::Operator => "operator",
            Category::ReturnArrow => "return-arrow",
            Category::UnionOperator => "union-operator",
            Category::Comment => "comment",
            Category::TypeComment => "type-comment",
            Category::Todo => "todo",
            Category::SpaceError => "space-error",
            Category::Plain => "plain",
        }
    }

    /// Parse a category from its name (for TOML theme loading)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.name() == name)
    }

    /// All categories, for iteration
    pub fn all() -> &'static [Category] {
        &[
            Category::Keyword,
            Category::SoftKeyword,
            Category::Builtin,
            Category::Exception,
            Category::PrimitiveType,
            Category::TypingContainer,
            Category::FunctionDef,
            Category::ClassDef,
            Category::FunctionCall,
            Category::Decorator,
            Category::ClassVar,
            Category::String,
            Category::RawString,
            Category::BytesString,
            Category::FString,
            Category::Docstring,
            Category::Escape,
            Category::ReplacementField,
            Category::Conversion,
            Category::FormatSpec,
            Category::Doctest,
            Category::Number,
            Category::Operator,
            Category::ReturnArrow,
            Category::UnionOperator,
            Category::Comment,
            Category::TypeComment,
            Category::Todo,
            Category::SpaceError,
            Category::Plain,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_styles() {
        assert!(!Category::Comment.default_style().is_default());
        assert!(!Category::String.default_style().is_default());
        assert!(!Category::Keyword.default_style().is_default());
        assert!(Category::Plain.default_style().is_default());
    }

    #[test]
    fn test_from_name_roundtrip() {
        for category in Category::all() {
            assert_eq!(Category::from_name(category.name()), Some(*category));
        }
    }

    #[test]
    fn test_from_name_invalid() {
        assert_eq!(Category::from_name("InvalidType"), None);
        assert_eq!(Category::from_name(""), None);
    }
}
