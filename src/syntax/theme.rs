//! Theme loading
//!
//! A theme maps token categories to styles. The built-in theme comes
//! from each category's default style; a TOML file can override any
//! subset of categories. Unknown category keys are ignored so themes
//! stay forward compatible, but a malformed value is an error.
//!
//! ```toml
//! [categories]
//! keyword = { fg = "magenta", bold = true }
//! comment = { fg = "bright-black", italic = true }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use toml::Value;

use super::category::Category;
use super::style::{Color, Style};
use crate::error::{HighlightError, Result};

/// Resolves categories to display styles
pub struct Theme {
    styles: HashMap<Category, Style>,
}

impl Default for Theme {
    fn default() -> Self {
        Self::new()
    }
}

impl Theme {
    /// The built-in theme
    pub fn new() -> Self {
        let mut styles = HashMap::new();
        for &category in Category::all() {
            styles.insert(category, category.default_style());
        }
        Self { styles }
    }

    /// Style for a category
    pub fn style_for(&self, category: Category) -> Style {
        self.styles.get(&category).copied().unwrap_or_default()
    }

    /// Override the style for a category
    pub fn set(&mut self, category: Category, style: Style) {
        self.styles.insert(category, style);
    }

    /// Load a theme file, applied on top of the built-in theme
    pub fn load_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::load_from_str(&contents)
    }

    /// Parse theme TOML, applied on top of the built-in theme
    pub fn load_from_str(contents: &str) -> Result<Self> {
        let value: Value = contents
            .parse()
            .map_err(|e: toml::de::Error| HighlightError::Theme(e.to_string()))?;

        let mut theme = Self::new();
        if let Some(categories) = value.get("categories").and_then(Value::as_table) {
            for (key, entry) in categories {
                let Some(category) = Category::from_name(key) else {
                    continue;
                };
                theme.styles.insert(category, parse_style(key, entry)?);
            }
        }
        Ok(theme)
    }
}

fn parse_style(key: &str, entry: &Value) -> Result<Style> {
    let table = entry.as_table().ok_or_else(|| {
        HighlightError::Theme(format!("'{}' must be a table of style attributes", key))
    })?;

    let mut style = Style::default();
    if let Some(fg) = table.get("fg") {
        style.fg = parse_color(key, fg)?;
    }
    if let Some(bg) = table.get("bg") {
        style.bg = parse_color(key, bg)?;
    }
    style.bold = flag(key, table, "bold")?;
    style.italic = flag(key, table, "italic")?;
    style.underline = flag(key, table, "underline")?;
    style.reverse = flag(key, table, "reverse")?;
    Ok(style)
}

fn parse_color(key: &str, value: &Value) -> Result<Color> {
    let name = value.as_str().ok_or_else(|| {
        HighlightError::Theme(format!("color for '{}' must be a string", key))
    })?;
    Color::from_name(name)
        .ok_or_else(|| HighlightError::Theme(format!("unknown color '{}' for '{}'", name, key)))
}

fn flag(key: &str, table: &toml::map::Map<String, Value>, name: &str) -> Result<bool> {
    match table.get(name) {
        None => Ok(false),
        Some(value) => value.as_bool().ok_or_else(|| {
            HighlightError::Theme(format!("'{}' for '{}' must be a boolean", name, key))
        }),
    }
}
