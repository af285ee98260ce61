use crate::ast::Located;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_REPORT_URL: &str = "http://github.com/ember-polyfills/ember-named-blocks-polyfill";
pub const ELSE_BLOCK_ISSUE_URL: &str =
    "http://github.com/ember-polyfills/ember-named-blocks-polyfill/issues/1";

// ═══════════════════════════════════════════════════════════════════════════════
// DIAGNOSTIC CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const ERR_TEMPLATE_BLOCK_PARAMS: &str = "NB-ERR-TEMPLATE-PARAMS";
pub const ERR_SELF_CLOSING_CONTENT: &str = "NB-ERR-SELF-CLOSING";
pub const ERR_UNEXPECTED_NAMED_BLOCK: &str = "NB-ERR-UNEXPECTED-NAMED-BLOCK";
pub const ERR_ELEMENT_BLOCK_PARAMS: &str = "NB-ERR-ELEMENT-PARAMS";
pub const ERR_INVOCATION_BLOCK_PARAMS: &str = "NB-ERR-INVOCATION-PARAMS";
pub const ERR_METADATA_ARGUMENT: &str = "NB-ERR-METADATA-ARGUMENT";
pub const ERR_INVALID_BLOCK_NAME: &str = "NB-ERR-BLOCK-NAME";
pub const ERR_SELF_CLOSING_NAMED_BLOCK: &str = "NB-ERR-NAMED-BLOCK-SELF-CLOSING";
pub const ERR_NAMED_BLOCK_ATTRIBUTES: &str = "NB-ERR-NAMED-BLOCK-ATTRIBUTES";
pub const ERR_NAMED_BLOCK_MODIFIERS: &str = "NB-ERR-NAMED-BLOCK-MODIFIERS";
pub const ERR_MIXED_CONTENT: &str = "NB-ERR-MIXED-CONTENT";
pub const ERR_DUPLICATE_BLOCK: &str = "NB-ERR-DUPLICATE-BLOCK";
pub const ERR_UNSUPPORTED_BLOCK: &str = "NB-ERR-UNSUPPORTED-BLOCK";
pub const ERR_NOT_SIMPLE_PATH: &str = "NB-ERR-SIMPLE-PATH";
pub const ERR_INVALID_PATH: &str = "NB-ERR-INVALID-PATH";
pub const ERR_YIELD_ARGUMENTS: &str = "NB-ERR-YIELD-ARGS";
pub const ERR_HAS_BLOCK_ARGUMENTS: &str = "NB-ERR-HAS-BLOCK-ARGS";

pub const BUG_SCOPE_UNDERFLOW: &str = "NB-BUG-SCOPE-UNDERFLOW";
pub const BUG_SCOPE_MISMATCH: &str = "NB-BUG-SCOPE-MISMATCH";
pub const BUG_NOT_ROOT: &str = "NB-BUG-NOT-ROOT";
pub const BUG_DISPATCH_CHAIN: &str = "NB-BUG-DISPATCH-CHAIN";
pub const BUG_REWRITE_DIVERGED: &str = "NB-BUG-REWRITE-DIVERGED";
pub const BUG_PAYLOAD: &str = "NB-BUG-PAYLOAD";

fn get_hint(code: &str) -> &'static str {
    match code {
        ERR_TEMPLATE_BLOCK_PARAMS => "A template root binds no block params.",
        ERR_SELF_CLOSING_CONTENT => "Self-closing tags carry neither children nor block params.",
        ERR_UNEXPECTED_NAMED_BLOCK => {
            "Named blocks may only appear directly inside a component invocation."
        }
        ERR_ELEMENT_BLOCK_PARAMS => "Only component invocations can declare block params.",
        ERR_INVOCATION_BLOCK_PARAMS => {
            "Declare block params on each named block instead of on the invocation."
        }
        ERR_METADATA_ARGUMENT => {
            "`@namedBlocksInfo` is set by the polyfill; rename the argument."
        }
        ERR_INVALID_BLOCK_NAME => "Block names start with a lower-case letter and contain no `.`.",
        ERR_SELF_CLOSING_NAMED_BLOCK => "Write `<:name></:name>` instead of `<:name />`.",
        ERR_NAMED_BLOCK_ATTRIBUTES => "Move attributes and arguments onto the invocation.",
        ERR_NAMED_BLOCK_MODIFIERS => "Move modifiers onto the invocation.",
        ERR_MIXED_CONTENT => {
            "Wrap loose content in a `<:default>` block when passing named blocks."
        }
        ERR_DUPLICATE_BLOCK => "Each named block may be passed once per invocation.",
        ERR_UNSUPPORTED_BLOCK => "`<:else>` and `<:inverse>` are not supported.",
        ERR_NOT_SIMPLE_PATH => "The helper is shadowed or called through a qualified path.",
        ERR_INVALID_PATH => "The path's original text disagrees with its parts.",
        ERR_YIELD_ARGUMENTS => "`{{yield}}` accepts only `to=\"<literal block name>\"`.",
        ERR_HAS_BLOCK_ARGUMENTS => "Block queries accept at most one string literal.",
        BUG_SCOPE_UNDERFLOW | BUG_SCOPE_MISMATCH | BUG_NOT_ROOT => {
            "Scope push/pop must pair with enter/exit."
        }
        BUG_DISPATCH_CHAIN => "Dispatch branches are single-branch `{{#if}}` blocks.",
        BUG_REWRITE_DIVERGED => "A rewrite hook kept producing new nodes.",
        BUG_PAYLOAD => "The host handed over a tree this crate cannot read.",
        _ => "Unknown diagnostic.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER ERROR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticLocation {
    pub file: Option<String>,
    pub line: u32,
    pub column: u32,
}

impl DiagnosticLocation {
    pub fn of(node: &impl Located) -> Option<Self> {
        let loc = node.loc();
        if loc.is_synthetic() {
            return None;
        }
        Some(Self {
            file: loc.source.clone(),
            line: loc.start.line,
            column: loc.start.column,
        })
    }
}

fn location_suffix(location: &Option<DiagnosticLocation>) -> String {
    match location {
        Some(DiagnosticLocation {
            file: Some(file),
            line,
            column,
        }) => format!(" (at {} on line {} column {})", file, line, column),
        Some(DiagnosticLocation { line, column, .. }) => {
            format!(" (on line {} column {})", line, column)
        }
        None => String::new(),
    }
}

/// Terminal diagnostic raised by the pass.
///
/// `Syntax` means the template breaks a named-blocks usage rule and is meant
/// for the template author. `Internal` means the pass itself misbehaved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CompilerError {
    #[error("Syntax Error: {message}{}", location_suffix(.location))]
    #[serde(rename_all = "camelCase")]
    Syntax {
        code: String,
        message: String,
        #[serde(default)]
        hint: String,
        location: Option<DiagnosticLocation>,
    },
    #[error(
        "[BUG] {message}\nThis is likely a bug in the named-blocks polyfill. Please file a bug at {report_url}"
    )]
    #[serde(rename_all = "camelCase")]
    Internal {
        code: String,
        message: String,
        #[serde(default)]
        hint: String,
        report_url: String,
    },
}

impl CompilerError {
    pub fn syntax(code: &str, message: impl Into<String>, at: &impl Located) -> Self {
        CompilerError::Syntax {
            code: code.to_string(),
            message: message.into(),
            hint: get_hint(code).to_string(),
            location: DiagnosticLocation::of(at),
        }
    }

    pub fn internal(code: &str, message: impl Into<String>) -> Self {
        CompilerError::Internal {
            code: code.to_string(),
            message: message.into(),
            hint: get_hint(code).to_string(),
            report_url: DEFAULT_REPORT_URL.to_string(),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            CompilerError::Syntax { code, .. } | CompilerError::Internal { code, .. } => code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CompilerError::Syntax { message, .. } | CompilerError::Internal { message, .. } => {
                message
            }
        }
    }

    pub fn hint(&self) -> &str {
        match self {
            CompilerError::Syntax { hint, .. } | CompilerError::Internal { hint, .. } => hint,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, CompilerError::Internal { .. })
    }

    pub fn location(&self) -> Option<&DiagnosticLocation> {
        match self {
            CompilerError::Syntax { location, .. } => location.as_ref(),
            CompilerError::Internal { .. } => None,
        }
    }

    /// Fills in host-level context: the module name for located diagnostics
    /// without a source file, and the report URL for internal ones.
    pub fn with_context(mut self, module_name: Option<&str>, report_url: &str) -> Self {
        match &mut self {
            CompilerError::Syntax {
                location: Some(location),
                ..
            } => {
                if location.file.is_none() {
                    location.file = module_name.map(str::to_string);
                }
            }
            CompilerError::Syntax { location: None, .. } => {}
            CompilerError::Internal { report_url: url, .. } => {
                *url = report_url.to_string();
            }
        }
        self
    }
}

/// `check(cond, ...)`: raise a syntax error unless `condition` holds.
pub fn check(
    condition: bool,
    code: &str,
    message: impl FnOnce() -> String,
    at: &impl Located,
) -> Result<(), CompilerError> {
    if condition {
        Ok(())
    } else {
        Err(CompilerError::syntax(code, message(), at))
    }
}

/// `assert(cond, ...)`: raise an internal invariant violation unless `condition` holds.
pub fn invariant(
    condition: bool,
    code: &str,
    message: impl FnOnce() -> String,
) -> Result<(), CompilerError> {
    if condition {
        Ok(())
    } else {
        Err(CompilerError::internal(code, message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Position, SourceSpan};

    fn span(source: Option<&str>) -> SourceSpan {
        SourceSpan::new(
            source.map(str::to_string),
            Position::new(3, 4),
            Position::new(3, 10),
        )
    }

    #[test]
    fn test_syntax_error_display_with_source() {
        let err = CompilerError::syntax(ERR_DUPLICATE_BLOCK, "twice", &span(Some("a.hbs")));
        assert_eq!(err.to_string(), "Syntax Error: twice (at a.hbs on line 3 column 4)");
        assert_eq!(err.code(), ERR_DUPLICATE_BLOCK);
        assert!(!err.is_internal());
    }

    #[test]
    fn test_syntax_error_display_without_source() {
        let err = CompilerError::syntax(ERR_DUPLICATE_BLOCK, "twice", &span(None));
        assert_eq!(err.to_string(), "Syntax Error: twice (on line 3 column 4)");
    }

    #[test]
    fn test_syntax_error_on_synthetic_node_has_no_suffix() {
        let err = CompilerError::syntax(ERR_DUPLICATE_BLOCK, "twice", &SourceSpan::synthetic());
        assert_eq!(err.to_string(), "Syntax Error: twice");
    }

    #[test]
    fn test_internal_error_display() {
        let err = CompilerError::internal(BUG_SCOPE_UNDERFLOW, "Cannot pop root scope");
        let text = err.to_string();
        assert!(text.starts_with("[BUG] Cannot pop root scope\n"));
        assert!(text.contains(DEFAULT_REPORT_URL));
        assert!(err.is_internal());
    }

    #[test]
    fn test_with_context_fills_module_name_and_url() {
        let err = CompilerError::syntax(ERR_DUPLICATE_BLOCK, "twice", &span(None))
            .with_context(Some("app/card.hbs"), DEFAULT_REPORT_URL);
        assert_eq!(
            err.location().and_then(|l| l.file.as_deref()),
            Some("app/card.hbs")
        );

        let bug = CompilerError::internal(BUG_NOT_ROOT, "nope")
            .with_context(None, "https://example.test/issues");
        assert!(bug.to_string().ends_with("https://example.test/issues"));
    }

    #[test]
    fn test_error_serializes_for_the_host() {
        let err = CompilerError::syntax(ERR_MIXED_CONTENT, "mixed", &span(Some("a.hbs")));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "syntax");
        assert_eq!(json["code"], ERR_MIXED_CONTENT);
        assert_eq!(json["location"]["line"], 3);
        assert_eq!(
            json["hint"],
            "Wrap loose content in a `<:default>` block when passing named blocks."
        );

        let bug = serde_json::to_value(CompilerError::internal(BUG_PAYLOAD, "bad json")).unwrap();
        assert_eq!(bug["kind"], "internal");
        assert_eq!(bug["hint"], "The host handed over a tree this crate cannot read.");
    }

    #[test]
    fn test_hint_survives_a_round_trip() {
        let err = CompilerError::syntax(ERR_METADATA_ARGUMENT, "reserved", &span(Some("a.hbs")));
        let json = serde_json::to_string(&err).unwrap();
        let back: CompilerError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
        assert!(back.hint().contains("@namedBlocksInfo"));
    }
}
