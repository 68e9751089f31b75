//! The Python rule table
//!
//! Builds the ordered [`RuleSet`] for Python source. Order is load-bearing:
//! prefixed string variants come before bare quotes, triple quotes before
//! single quotes, multi-character operators before single-character ones.
//! Toggle groups are evaluated here, once, against the configuration
//! snapshot.

use super::category::Category;
use super::rules::{Contains, MatchContext, PatternRule, RegionRule, RuleSet, Trigger};
use crate::config::Config;
use crate::error::Result;

const KEYWORDS: &str = r"\b(?:False|None|True|and|as|assert|async|await|break|class|continue|def|del|elif|else|except|finally|for|from|global|if|import|in|is|lambda|nonlocal|not|or|pass|raise|return|try|while|with|yield)\b";

const SOFT_KEYWORDS: &str = r"\b(?:match|case)\b";

const CLASS_VARS: &str = r"\b(?:self|cls|mcs)\b";

const PRIMITIVE_TYPES: &str = r"\b(?:bool|bytearray|bytes|complex|dict|float|frozenset|int|list|memoryview|object|set|str|tuple|type)\b";

const TYPING_CONTAINERS: &str = r"\b(?:Annotated|Any|AnyStr|AsyncGenerator|AsyncIterable|AsyncIterator|Awaitable|Callable|ChainMap|ClassVar|Concatenate|Coroutine|Counter|DefaultDict|Deque|Dict|Final|FrozenSet|Generator|Generic|Iterable|Iterator|List|Literal|LiteralString|Mapping|MutableMapping|MutableSequence|MutableSet|NamedTuple|Never|NewType|NoReturn|NotRequired|Optional|OrderedDict|ParamSpec|Protocol|Required|Self|Sequence|Set|Text|Tuple|Type|TypeAlias|TypeGuard|TypeVar|TypeVarTuple|TypedDict|Union|Unpack)\b";

const EXCEPTIONS: &str = r"\b(?:ArithmeticError|AssertionError|AttributeError|BaseException|BaseExceptionGroup|BlockingIOError|BrokenPipeError|BufferError|BytesWarning|ChildProcessError|ConnectionAbortedError|ConnectionError|ConnectionRefusedError|ConnectionResetError|DeprecationWarning|EOFError|EncodingWarning|EnvironmentError|Exception|ExceptionGroup|FileExistsError|FileNotFoundError|FloatingPointError|FutureWarning|GeneratorExit|IOError|ImportError|ImportWarning|IndentationError|IndexError|InterruptedError|IsADirectoryError|KeyError|KeyboardInterrupt|LookupError|MemoryError|ModuleNotFoundError|NameError|NotADirectoryError|NotImplementedError|OSError|OverflowError|PendingDeprecationWarning|PermissionError|ProcessLookupError|RecursionError|ReferenceError|ResourceWarning|RuntimeError|RuntimeWarning|StopAsyncIteration|StopIteration|SyntaxError|SyntaxWarning|SystemError|SystemExit|TabError|TimeoutError|TypeError|UnboundLocalError|UnicodeDecodeError|UnicodeEncodeError|UnicodeError|UnicodeTranslateError|UnicodeWarning|UserWarning|ValueError|Warning|ZeroDivisionError)\b";

const BUILTINS: &str = r"\b(?:abs|aiter|all|anext|any|ascii|bin|breakpoint|callable|chr|classmethod|compile|delattr|dir|divmod|enumerate|eval|exec|filter|format|getattr|globals|hasattr|hash|help|hex|id|input|isinstance|issubclass|iter|len|locals|map|max|min|next|oct|open|ord|pow|print|property|range|repr|reversed|round|setattr|slice|sorted|staticmethod|sum|super|vars|zip)\b";

/// One prefix variant of a string literal
struct StringVariant {
    name: &'static str,
    /// Prefix letters, matched case-insensitively
    prefix: &'static str,
    category: Category,
    raw: bool,
    formatted: bool,
    bytes: bool,
}

/// Prefix variants in precedence order: two-letter prefixes must be
/// checked before their one-letter tails, all prefixes before bare
/// quotes.
const STRING_VARIANTS: &[StringVariant] = &[
    StringVariant { name: "fstring_raw", prefix: "rf", category: Category::FString, raw: true, formatted: true, bytes: false },
    StringVariant { name: "fstring_raw", prefix: "fr", category: Category::FString, raw: true, formatted: true, bytes: false },
    StringVariant { name: "bytes_raw", prefix: "rb", category: Category::BytesString, raw: true, formatted: false, bytes: true },
    StringVariant { name: "bytes_raw", prefix: "br", category: Category::BytesString, raw: true, formatted: false, bytes: true },
    StringVariant { name: "fstring", prefix: "f", category: Category::FString, raw: false, formatted: true, bytes: false },
    StringVariant { name: "bytes", prefix: "b", category: Category::BytesString, raw: false, formatted: false, bytes: true },
    StringVariant { name: "string_raw", prefix: "r", category: Category::RawString, raw: true, formatted: false, bytes: false },
    StringVariant { name: "string_unicode", prefix: "u", category: Category::String, raw: false, formatted: false, bytes: false },
    StringVariant { name: "string", prefix: "", category: Category::String, raw: false, formatted: false, bytes: false },
];

/// Quote forms in precedence order: triple before single
const QUOTES: &[(&str, &str)] = &[
    (r#"\"\"\""#, "\"\"\""),
    ("'''", "'''"),
    (r#"\""#, "\""),
    ("'", "'"),
];

/// Build the string region rules
fn string_rules(config: &Config, regions: &mut Vec<RegionRule>) -> Result<()> {
    for variant in STRING_VARIANTS {
        for &(quote_pattern, quote) in QUOTES {
            let triple = quote.len() == 3;
            let start = if variant.prefix.is_empty() {
                quote_pattern.to_string()
            } else {
                format!("(?i){}{}", variant.prefix, quote_pattern)
            };

            let mut rule = RegionRule::new(variant.name, &start, quote, variant.category)?
                .with_contains(Contains {
                    escapes: !variant.raw,
                    fields: variant.formatted && config.string_formatting,
                    doctests: config.doctests,
                    percent: config.string_formatting,
                });
            if !triple {
                rule = rule.single_line();
            }
            if triple && !variant.bytes && !variant.formatted {
                rule = rule.docstring_eligible();
            }
            regions.push(rule);
        }
    }
    Ok(())
}

/// Build the complete Python rule set for a configuration snapshot
pub fn python_rules(config: &Config) -> Result<RuleSet> {
    let mut regions = Vec::new();
    string_rules(config, &mut regions)?;

    let mut patterns = Vec::new();

    if config.space_errors {
        patterns.push(
            PatternRule::new("trailing_space", r"(?m)[ \t]+$", Category::SpaceError)?
                .with_trigger(Trigger::Whitespace),
        );
        patterns.push(
            PatternRule::new("space_before_tab", r" +\t+", Category::SpaceError)?
                .with_trigger(Trigger::Whitespace),
        );
    }

    if config.type_annotations {
        patterns.push(
            PatternRule::new("type_comment", r"#[ \t]*type:[^\n]*", Category::TypeComment)?
                .with_trigger(Trigger::Char('#')),
        );
    }
    patterns.push(
        PatternRule::new("comment", r"#[^\n]*", Category::Comment)?
            .with_trigger(Trigger::Char('#')),
    );

    patterns.push(
        PatternRule::new("decorator", r"@[ \t]*[A-Za-z_][A-Za-z0-9_.]*", Category::Decorator)?
            .with_trigger(Trigger::Char('@'))
            .with_context(MatchContext::StatementStart),
    );

    patterns.push(
        PatternRule::new("keyword", KEYWORDS, Category::Keyword)?
            .with_trigger(Trigger::Word)
            .suppressed_after_dot(),
    );
    patterns.push(
        PatternRule::new("soft_keyword", SOFT_KEYWORDS, Category::SoftKeyword)?
            .with_trigger(Trigger::Word)
            .with_context(MatchContext::StatementStartWithColon)
            .suppressed_after_dot(),
    );

    if config.class_vars {
        patterns.push(
            PatternRule::new("class_var", CLASS_VARS, Category::ClassVar)?
                .with_trigger(Trigger::Word)
                .suppressed_after_dot(),
        );
    }

    if config.type_annotations {
        patterns.push(
            PatternRule::new("primitive_type", PRIMITIVE_TYPES, Category::PrimitiveType)?
                .with_trigger(Trigger::Word)
                .suppressed_after_dot(),
        );
        patterns.push(
            PatternRule::new("typing_container", TYPING_CONTAINERS, Category::TypingContainer)?
                .with_trigger(Trigger::Word)
                .suppressed_after_dot(),
        );
    }

    if config.exceptions {
        patterns.push(
            PatternRule::new("exception", EXCEPTIONS, Category::Exception)?
                .with_trigger(Trigger::Word)
                .suppressed_after_dot(),
        );
    }

    if config.builtins {
        patterns.push(
            PatternRule::new("builtin", BUILTINS, Category::Builtin)?
                .with_trigger(Trigger::Word)
                .suppressed_after_dot(),
        );
    }

    if config.function_calls {
        patterns.push(
            PatternRule::new("function_call", r"([A-Za-z_][A-Za-z0-9_]*)[ \t]*\(", Category::FunctionCall)?
                .with_group(1)
                .with_trigger(Trigger::Word),
        );
    }

    // Numbers: radix-prefixed forms before the decimal forms
    patterns.push(
        PatternRule::new("hex", r"\b0[xX][0-9a-fA-F][0-9a-fA-F_]*\b", Category::Number)?
            .with_trigger(Trigger::Number),
    );
    patterns.push(
        PatternRule::new("binary", r"\b0[bB][01][01_]*\b", Category::Number)?
            .with_trigger(Trigger::Number),
    );
    patterns.push(
        PatternRule::new("octal", r"\b0[oO][0-7][0-7_]*\b", Category::Number)?
            .with_trigger(Trigger::Number),
    );
    patterns.push(
        PatternRule::new(
            "float",
            r"\b\d[\d_]*\.(?:\d[\d_]*)?(?:[eE][+-]?\d[\d_]*)?[jJ]?",
            Category::Number,
        )?
        .with_trigger(Trigger::Number),
    );
    patterns.push(
        PatternRule::new(
            "float_leading_dot",
            r"\.\d[\d_]*(?:[eE][+-]?\d[\d_]*)?[jJ]?\b",
            Category::Number,
        )?
        .with_trigger(Trigger::Number),
    );
    patterns.push(
        PatternRule::new("float_exponent", r"\b\d[\d_]*[eE][+-]?\d[\d_]*[jJ]?\b", Category::Number)?
            .with_trigger(Trigger::Number),
    );
    patterns.push(
        PatternRule::new("integer", r"\b\d[\d_]*[jJ]?\b", Category::Number)?
            .with_trigger(Trigger::Number),
    );

    patterns.push(
        PatternRule::new("return_arrow", r"->", Category::ReturnArrow)?
            .with_trigger(Trigger::Char('-')),
    );

    if config.type_annotations {
        patterns.push(
            PatternRule::new("union_operator", r"\|", Category::UnionOperator)?
                .with_trigger(Trigger::Char('|'))
                .with_context(MatchContext::UnionPosition),
        );
    }

    if config.operators {
        patterns.push(
            PatternRule::new(
                "operator",
                r"(?:\*\*=?|//=?|<<=?|>>=?|!=|<=|>=|==|:=|[+\-*/%@&|^~]=?|[<>=])",
                Category::Operator,
            )?
            .with_trigger(Trigger::Operator),
        );
    }

    RuleSet::new(regions, patterns)
}
