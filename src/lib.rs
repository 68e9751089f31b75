//! Python syntax highlighting engine
//!
//! pylight classifies Python source into nested, categorized tokens and
//! resolves each category to a display style through a theme. The three
//! pieces are independent: the [rule table](syntax::python) is built
//! once from a [`Config`] snapshot, the [`Tokenizer`] is a pure
//! function of the input text, and the [`Theme`] maps categories to
//! styles without re-tokenizing.
//!
//! ```
//! use pylight::{Category, Config, Tokenizer};
//!
//! let tokenizer = Tokenizer::new(&Config::default()).unwrap();
//! let text = "def greet() -> str:\n";
//! let tokens = tokenizer.tokenize(text);
//! assert!(tokens
//!     .iter()
//!     .any(|t| t.category == Category::FunctionDef && t.text(text) == "greet"));
//! ```

pub mod config;
pub mod error;
pub mod render;
pub mod syntax;

pub use config::Config;
pub use error::{HighlightError, Result};
pub use render::{resolve_spans, Renderer};
pub use syntax::{Category, Color, Span, Style, Theme, Token, Tokenizer};
