//! Node classification: component invocations, named-block declarations
//! and the block-name rule.

use crate::ast::{ElementNode, PathExpression, Statement};
use crate::error::{
    check, CompilerError, ELSE_BLOCK_ISSUE_URL, ERR_DUPLICATE_BLOCK, ERR_INVALID_BLOCK_NAME,
    ERR_INVALID_PATH, ERR_MIXED_CONTENT, ERR_NAMED_BLOCK_ATTRIBUTES, ERR_NAMED_BLOCK_MODIFIERS,
    ERR_SELF_CLOSING_NAMED_BLOCK, ERR_UNSUPPORTED_BLOCK,
};
use crate::scope::LexicalScope;
use lazy_static::lazy_static;
use regex::Regex;

pub const NAMED_BLOCK_SIGIL: char = ':';
pub const DEFAULT_BLOCK: &str = "default";
pub const ELSE_BLOCK: &str = "else";
pub const INVERSE_BLOCK: &str = "inverse";

lazy_static! {
    // No grammar pins this down; lower-case initial and no path separator.
    static ref BLOCK_NAME_RE: Regex = Regex::new(r"^[a-z][^.]*$").unwrap();
    static ref UPPER_HEAD_RE: Regex = Regex::new(r"^[A-Z]").unwrap();
}

pub fn is_valid_block_name(name: &str) -> bool {
    BLOCK_NAME_RE.is_match(name)
}

/// The block name of a `<:name>` tag, without validating it.
pub fn block_name(element: &ElementNode) -> Option<&str> {
    element.tag.strip_prefix(NAMED_BLOCK_SIGIL)
}

/// Whether `element` invokes a component rather than emitting markup.
///
/// `<Foo>`, `<foo.bar>`, `<@foo>` and tags bound as block params all invoke
/// components.
pub fn is_component_invocation(
    element: &ElementNode,
    scope: &LexicalScope,
    ignore_innermost: bool,
) -> bool {
    let mut segments = element.tag.split('.');
    let head = segments.next().unwrap_or_default();
    let qualified = segments.next().is_some();

    qualified
        || head.starts_with('@')
        || UPPER_HEAD_RE.is_match(head)
        || scope.is_local(head, ignore_innermost)
}

/// Whether `element` is a `<:name>` declaration. A declaration that is
/// malformed is a syntax error rather than `false`.
pub fn is_named_block_declaration(element: &ElementNode) -> Result<bool, CompilerError> {
    let Some(name) = block_name(element) else {
        return Ok(false);
    };

    check(
        is_valid_block_name(name),
        ERR_INVALID_BLOCK_NAME,
        || {
            format!(
                "<{}> is not a valid named block: `{}` is not a valid block name",
                element.tag, name
            )
        },
        element,
    )?;

    check(
        !element.self_closing,
        ERR_SELF_CLOSING_NAMED_BLOCK,
        || {
            format!(
                "<{} /> is not a valid named block: named blocks cannot be self-closing",
                element.tag
            )
        },
        element,
    )?;

    check(
        element.attributes.is_empty(),
        ERR_NAMED_BLOCK_ATTRIBUTES,
        || format!("Named block <{}> cannot have attributes or arguments", element.tag),
        element,
    )?;

    check(
        element.modifiers.is_empty(),
        ERR_NAMED_BLOCK_MODIFIERS,
        || format!("Named block <{}> cannot have modifiers", element.tag),
        element,
    )?;

    Ok(true)
}

fn is_ignorable(statement: &Statement) -> bool {
    match statement {
        Statement::MustacheComment(_) => true,
        Statement::Text(text) => text.is_whitespace(),
        _ => false,
    }
}

/// Named-block declarations among `element`'s children, in source order.
///
/// Whitespace text and mustache comments are skipped. Any other content
/// alongside a named block, a repeated name, or `<:else>`/`<:inverse>` is a
/// syntax error.
pub fn collect_named_blocks(element: &ElementNode) -> Result<Vec<&ElementNode>, CompilerError> {
    let mut names: Vec<&str> = Vec::new();
    let mut named_blocks: Vec<&ElementNode> = Vec::new();
    let mut other_content: Vec<&Statement> = Vec::new();

    for statement in &element.children {
        if is_ignorable(statement) {
            continue;
        }

        let declaration = match statement.as_element() {
            Some(child) if is_named_block_declaration(child)? => child,
            _ => {
                check(
                    named_blocks.is_empty(),
                    ERR_MIXED_CONTENT,
                    || mixed_content_message(element),
                    statement,
                )?;
                other_content.push(statement);
                continue;
            }
        };

        if let Some(first) = other_content.first() {
            return Err(CompilerError::syntax(
                ERR_MIXED_CONTENT,
                mixed_content_message(element),
                *first,
            ));
        }

        let name = block_name(declaration).unwrap_or_default();

        check(
            !names.contains(&name),
            ERR_DUPLICATE_BLOCK,
            || format!("Cannot pass named block <:{}> twice in the same invocation", name),
            declaration,
        )?;

        names.push(name);
        named_blocks.push(declaration);
    }

    let unsupported = named_blocks
        .iter()
        .copied()
        .find(|block| matches!(block_name(block), Some(ELSE_BLOCK | INVERSE_BLOCK)));

    if let Some(declaration) = unsupported {
        check(
            !(names.contains(&ELSE_BLOCK) && names.contains(&INVERSE_BLOCK)),
            ERR_UNSUPPORTED_BLOCK,
            || "Cannot pass named blocks <:else> and <:inverse> in the same invocation".to_string(),
            declaration,
        )?;

        return Err(CompilerError::syntax(
            ERR_UNSUPPORTED_BLOCK,
            format!(
                "Cannot pass named block <{}>, this is not currently supported by the \
                 named-blocks polyfill, see: {}",
                declaration.tag, ELSE_BLOCK_ISSUE_URL
            ),
            declaration,
        ));
    }

    Ok(named_blocks)
}

fn mixed_content_message(element: &ElementNode) -> String {
    format!(
        "Unexpected content inside <{}> component invocation: when using named blocks, \
         the tag cannot contain other content",
        element.tag
    )
}

/// A single-segment path that is neither `this.`, an `@argument`, nor a
/// block-param binding.
pub fn is_simple_path(path: &PathExpression, scope: &LexicalScope) -> Result<bool, CompilerError> {
    let Some(head) = path.head() else {
        return Ok(false);
    };

    if path.data || path.this || scope.is_local(head, false) || path.parts.len() > 1 {
        return Ok(false);
    }

    check(
        path.original == head,
        ERR_INVALID_PATH,
        || format!("Invalid path: expecting `{}`, got `{}`", path.original, head),
        path,
    )?;

    Ok(true)
}
