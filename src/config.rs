//! Configuration file support
//!
//! Loads settings from ~/.pylight.conf (or %USERPROFILE%\.pylight.conf on Windows)
//!
//! Format: simple key=value pairs, one per line
//! Lines starting with # are comments
//!
//! Example:
//! ```text
//! # pylight configuration
//! builtins = true
//! operators = true
//! space-errors = false
//! tab-width = 4
//! ```
//!
//! Unrecognized keys are ignored; malformed values fall back to defaults.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

/// Feature toggles and display settings
///
/// A snapshot of this struct is taken when the rule table is built;
/// changing a flag afterwards has no effect until the rules are reloaded.
#[derive(Debug, Clone)]
pub struct Config {
    /// Highlight type annotations (primitive types, typing containers,
    /// type comments)
    pub type_annotations: bool,
    /// Highlight operator symbols
    pub operators: bool,
    /// Highlight names followed by a call parenthesis
    pub function_calls: bool,
    /// Highlight self/cls/mcs
    pub class_vars: bool,
    /// Highlight builtin function names
    pub builtins: bool,
    /// Highlight standard exception names
    pub exceptions: bool,
    /// Tokenize string formatting (f-string replacement fields,
    /// %-directives)
    pub string_formatting: bool,
    /// Highlight `>>>` doctest lines inside docstrings
    pub doctests: bool,
    /// Flag trailing whitespace and spaces before tabs
    pub space_errors: bool,
    /// Always rescan from the start of the file instead of the nearest
    /// sync point
    pub slow_sync: bool,
    /// Whether to show line numbers
    pub show_line_numbers: bool,
    /// Tab width for display
    pub tab_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            type_annotations: true,
            operators: true,
            function_calls: true,
            class_vars: true,
            builtins: true,
            exceptions: true,
            string_formatting: true,
            doctests: true,
            space_errors: false,
            slow_sync: false,
            show_line_numbers: false,
            tab_width: 8,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(windows)]
        {
            std::env::var("USERPROFILE")
                .ok()
                .map(|home| PathBuf::from(home).join(".pylight.conf"))
        }

        #[cfg(not(windows))]
        {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".pylight.conf"))
        }
    }

    /// Load configuration from file
    pub fn load() -> Self {
        let mut config = Config::default();

        if let Some(path) = Self::config_path() {
            if let Ok(contents) = fs::read_to_string(&path) {
                let settings = Self::parse(&contents);
                config.apply(&settings);
            }
        }

        config
    }

    /// Parse config file contents into key-value pairs
    fn parse(contents: &str) -> HashMap<String, String> {
        let mut settings = HashMap::new();

        for line in contents.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            // Parse key = value
            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim().to_lowercase();
                let value = value.trim().to_string();
                settings.insert(key, value);
            }
        }

        settings
    }

    /// Apply settings from parsed config
    fn apply(&mut self, settings: &HashMap<String, String>) {
        let mut flag = |key: &str, target: &mut bool| {
            if let Some(value) = settings.get(key) {
                *target = parse_bool(value);
            }
        };

        flag("type-annotations", &mut self.type_annotations);
        flag("operators", &mut self.operators);
        flag("function-calls", &mut self.function_calls);
        flag("class-vars", &mut self.class_vars);
        flag("builtins", &mut self.builtins);
        flag("exceptions", &mut self.exceptions);
        flag("string-formatting", &mut self.string_formatting);
        flag("doctests", &mut self.doctests);
        flag("space-errors", &mut self.space_errors);
        flag("slow-sync", &mut self.slow_sync);
        flag("line-numbers", &mut self.show_line_numbers);

        if let Some(value) = settings.get("tab-width") {
            if let Ok(n) = value.parse::<usize>() {
                self.tab_width = n.clamp(1, 16);
            }
        }
    }
}

/// Parse a boolean value from string
fn parse_bool(s: &str) -> bool {
    let s = s.to_lowercase();
    matches!(s.as_str(), "true" | "yes" | "on" | "1")
}
