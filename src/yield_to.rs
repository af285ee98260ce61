//! `{{yield ... to="name"}}`.
//!
//! ```hbs
//! {{yield this.foo to="bar"}}   =>   {{yield (-named-block-invocation "bar") this.foo}}
//! ```
//!
//! `to="default"` is dropped, `to="else"` / `to="inverse"` is kept as
//! `to="inverse"` (without params), and an unnamed yield passes through.

use crate::ast::{Expression, MustacheStatement};
use crate::builders::Builders;
use crate::classify::{is_simple_path, DEFAULT_BLOCK, ELSE_BLOCK, INVERSE_BLOCK};
use crate::error::{check, CompilerError, ERR_NOT_SIMPLE_PATH, ERR_YIELD_ARGUMENTS};
use crate::runtime::NAMED_BLOCK_INVOCATION_HELPER;
use crate::scope::LexicalScope;

pub const YIELD_KEYWORD: &str = "yield";
pub const TARGET_KEY: &str = "to";

/// Returns the rewritten call, or `None` when the yield is already in its
/// primitive form.
pub fn rewrite_yield(
    node: &MustacheStatement,
    scope: &LexicalScope,
    b: &dyn Builders,
) -> Result<Option<MustacheStatement>, CompilerError> {
    let simple = match &node.path {
        Expression::Path(path) => is_simple_path(path, scope)?,
        _ => false,
    };
    check(
        simple,
        ERR_NOT_SIMPLE_PATH,
        || "Invalid {{yield}} invocation: expecting a simple path".to_string(),
        node,
    )?;

    let Some(first) = node.hash.pairs.first() else {
        return Ok(None);
    };

    check(
        node.hash.pairs.len() == 1 && first.key == TARGET_KEY,
        ERR_YIELD_ARGUMENTS,
        || {
            let key = node
                .hash
                .pairs
                .iter()
                .find(|pair| pair.key != TARGET_KEY)
                .map_or(TARGET_KEY, |pair| pair.key.as_str());
            format!("Cannot pass {} named argument to {{{{yield}}}}", key)
        },
        node,
    )?;

    let to = &first.value;
    let target = to.as_string_literal().ok_or_else(|| {
        CompilerError::syntax(
            ERR_YIELD_ARGUMENTS,
            "{{yield}} can only accept a string literal for the `to` argument",
            to,
        )
    })?;

    let (params, hash) = match target.value.as_str() {
        DEFAULT_BLOCK => (node.params.clone(), None),
        ELSE_BLOCK | INVERSE_BLOCK => {
            check(
                node.params.is_empty(),
                ERR_YIELD_ARGUMENTS,
                || "Cannot yield params to inverse block".to_string(),
                node,
            )?;
            let hash = b.hash(
                vec![b.pair(TARGET_KEY, b.string(INVERSE_BLOCK))],
                node.hash.loc.clone(),
            );
            (Vec::new(), Some(hash))
        }
        name => {
            let invocation = b.sexpr(
                b.path(NAMED_BLOCK_INVOCATION_HELPER, target.loc.clone()),
                vec![to.clone()],
                None,
                target.loc.clone(),
            );
            let mut params = Vec::with_capacity(node.params.len() + 1);
            params.push(Expression::SubExpression(invocation));
            params.extend(node.params.iter().cloned());
            tracing::debug!(target = name, params = params.len(), "rewrite yield");
            (params, None)
        }
    };

    Ok(Some(b.mustache(
        node.path.clone(),
        params,
        hash,
        node.trusting,
        node.loc.clone(),
    )))
}
