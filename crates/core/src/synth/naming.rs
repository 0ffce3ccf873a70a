//! Names of generated modules, procedures and locals

use proc_macro2::{Ident, Span};
use regex::Regex;
use std::sync::LazyLock;

use crate::config::GeneratorConfig;
use crate::symbols::{SymbolId, SymbolKind, SymbolTable};

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid identifier pattern"));

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

// Keywords that cannot be written as raw identifiers
const PATH_KEYWORDS: &[&str] = &["self", "Self", "super", "crate"];

/// Member names the generated code can refer to verbatim (keywords are
/// written as raw identifiers; path keywords have no raw form)
pub fn is_identifier(name: &str) -> bool {
    name != "_" && !PATH_KEYWORDS.contains(&name) && IDENTIFIER.is_match(name)
}

/// Identifier token for a member or local; keywords become raw identifiers.
/// Path keywords never reach here as members, see [`is_identifier`].
pub fn ident(name: &str) -> Ident {
    if PATH_KEYWORDS.contains(&name) {
        Ident::new(&format!("{name}_"), Span::call_site())
    } else if KEYWORDS.contains(&name) {
        Ident::new_raw(name, Span::call_site())
    } else {
        Ident::new(name, Span::call_site())
    }
}

pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_ascii_alphanumeric() {
            if ch.is_ascii_uppercase() && i > 0 {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_ascii_lowercase());
                if prev.is_ascii_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_ascii_uppercase() && next_is_lower)
                {
                    out.push('_');
                }
            }
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

pub fn module_name(simple_name: &str, config: &GeneratorConfig) -> String {
    format!("{}{}", snake_case(simple_name), config.module_suffix)
}

/// Method-rooted declarations share their class module, so their procedures
/// carry a per-method suffix
pub fn procedure_name(base: &str, suffix: Option<&str>) -> String {
    match suffix {
        Some(suffix) => format!("{base}_{suffix}"),
        None => base.to_string(),
    }
}

/// Suffix for a method-rooted declaration. Overloads append their erased
/// parameter types, e.g. `run(int)` becomes `run_int`.
pub fn method_suffix(method: &str, params: &[String], overloaded: bool) -> String {
    let mut suffix = snake_case(method);
    if overloaded {
        for param in params {
            let simple = param.rsplit(['.', ':']).next().unwrap_or(param);
            let simple = simple.replace("[]", "Array");
            suffix.push('_');
            suffix.push_str(snake_case(&simple).trim_matches('_'));
        }
    }
    suffix
}

pub fn package_segments(package: Option<&str>) -> Vec<String> {
    package
        .map(|package| {
            package
                .split('.')
                .filter(|segment| !segment.is_empty())
                .map(snake_case)
                .collect()
        })
        .unwrap_or_default()
}

/// Rust path of a class: the host-provided one, or `crate::<package>::<Name>`
pub fn type_path(symbols: &SymbolTable, class: &SymbolId) -> String {
    let Some(symbol) = symbols.get(class) else {
        return class.as_str().replace('.', "::");
    };
    if let SymbolKind::Class {
        type_path: Some(path),
        ..
    } = &symbol.kind
    {
        return path.clone();
    }

    let mut segments = vec!["crate".to_string()];
    segments.extend(package_segments(
        symbols.package_of(class).map(|package| package.id.as_str()),
    ));
    segments.push(symbol.name.clone());
    segments.join("::")
}
