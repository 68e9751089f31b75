//! pylight - Python syntax highlighter for the terminal
//!
//! Reads a Python source file (or stdin) and writes it back with ANSI
//! styling, a line-number gutter, or a token dump for debugging.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use pylight::render::Renderer;
use pylight::syntax::{Theme, Token, Tokenizer};
use pylight::{Config, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut config = Config::load();
    let mut theme_path: Option<PathBuf> = None;
    let mut file: Option<PathBuf> = None;
    let mut color = true;
    let mut dump_tokens = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            "--version" | "-V" => {
                print_version();
                return Ok(());
            }
            "--theme" => {
                i += 1;
                match args.get(i) {
                    Some(path) => theme_path = Some(PathBuf::from(path)),
                    None => usage_error("--theme requires a file argument"),
                }
            }
            "--tab-width" => {
                i += 1;
                match args.get(i).and_then(|v| v.parse::<usize>().ok()) {
                    Some(n) => config.tab_width = n.clamp(1, 16),
                    None => usage_error("--tab-width requires a number"),
                }
            }
            "--no-color" => color = false,
            "--line-numbers" | "-n" => config.show_line_numbers = true,
            "--tokens" => dump_tokens = true,
            "--space-errors" => config.space_errors = true,
            "--slow-sync" => config.slow_sync = true,
            "--no-type-annotations" => config.type_annotations = false,
            "--no-operators" => config.operators = false,
            "--no-function-calls" => config.function_calls = false,
            "--no-class-vars" => config.class_vars = false,
            "--no-builtins" => config.builtins = false,
            "--no-exceptions" => config.exceptions = false,
            "--no-string-formatting" => config.string_formatting = false,
            "--no-doctests" => config.doctests = false,
            "-" => file = None,
            arg if arg.starts_with('-') => {
                usage_error(&format!("unknown option '{}'", arg));
            }
            arg => file = Some(PathBuf::from(arg)),
        }
        i += 1;
    }

    let text = match &file {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let tokenizer = Tokenizer::new(&config)?;
    let tokens = tokenizer.tokenize(&text);

    if dump_tokens {
        dump(&text, &tokens);
        return Ok(());
    }

    let theme = match &theme_path {
        Some(path) => Theme::load_file(path)?,
        None => Theme::new(),
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    Renderer::new(&theme, &config)
        .with_color(color)
        .render(&mut out, &text, &tokens)?;

    Ok(())
}

/// Print each token on its own line, indented by nesting depth
fn dump(text: &str, tokens: &[Token]) {
    for token in tokens {
        let mut depth = 0;
        let mut parent = token.parent;
        while let Some(p) = parent {
            depth += 1;
            parent = tokens[p].parent;
        }
        println!(
            "{:indent$}{}..{} {}: {:?}",
            "",
            token.start,
            token.end,
            token.category.name(),
            token.text(text),
            indent = depth * 2,
        );
    }
}

fn usage_error(message: &str) -> ! {
    eprintln!("pylight: {}", message);
    eprintln!("Try 'pylight --help' for more information.");
    process::exit(2);
}

fn print_usage() {
    println!("pylight {} - Python syntax highlighter", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Usage: pylight [OPTIONS] [FILE]");
    println!();
    println!("Reads FILE (or stdin when FILE is '-' or absent) and writes it");
    println!("to stdout with ANSI highlighting.");
    println!();
    println!("Options:");
    println!("  -h, --help               Show this help message");
    println!("  -V, --version            Show version information");
    println!("  -n, --line-numbers       Show a line number gutter");
    println!("      --no-color           Write plain text without styling");
    println!("      --theme FILE         Load category styles from a TOML file");
    println!("      --tab-width N        Expand tabs to N-column stops (default 8)");
    println!("      --tokens             Dump the token tree instead of rendering");
    println!("      --space-errors       Flag trailing whitespace and spaces before tabs");
    println!("      --slow-sync          Disable sync-point restarts");
    println!();
    println!("Highlighting groups (all on by default):");
    println!("      --no-type-annotations    --no-operators");
    println!("      --no-function-calls      --no-class-vars");
    println!("      --no-builtins            --no-exceptions");
    println!("      --no-string-formatting   --no-doctests");
    println!();
    println!("Settings can also be placed in ~/.pylight.conf as key = value");
    println!("lines, for example 'space-errors = true'.");
}

fn print_version() {
    println!("pylight {}", env!("CARGO_PKG_VERSION"));
    println!("A rule-table Python highlighter for terminals");
}
