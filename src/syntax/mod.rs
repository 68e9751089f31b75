//! Syntax highlighting engine
//!
//! This module contains the three pieces of the highlighter:
//! - the rule table ([`rules`], [`python`]): ordered pattern and region
//!   rules, built once from a configuration snapshot
//! - the tokenizer ([`tokenizer`]): turns source text into classified,
//!   possibly nested spans
//! - the category resolver ([`category`], [`theme`]): maps each span's
//!   category to a display style

pub mod category;
pub mod python;
pub mod rules;
pub mod style;
pub mod theme;
pub mod tokenizer;

pub use category::Category;
pub use rules::RuleSet;
pub use style::{Color, Span, Style};
pub use theme::Theme;
pub use tokenizer::{Token, Tokenizer};
