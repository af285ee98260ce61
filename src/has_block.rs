//! `has-block` / `has-block-params` queries.
//!
//! ```hbs
//! {{has-block "foo"}}         {{-has-block @namedBlocksInfo "foo" false}}
//! (has-block-params)    =>    (-has-block-params @namedBlocksInfo "default" (has-block-params))
//! ```
//!
//! The third argument is what the query answers when the enclosing invocation
//! carries no metadata: a plain re-query for the default and inverse blocks,
//! `false` for anything else.

use crate::ast::{Expression, Hash, MustacheStatement, PathExpression, SourceSpan, SubExpression};
use crate::builders::Builders;
use crate::classify::{is_simple_path, DEFAULT_BLOCK, ELSE_BLOCK, INVERSE_BLOCK};
use crate::error::{check, CompilerError, ERR_HAS_BLOCK_ARGUMENTS, ERR_NOT_SIMPLE_PATH};
use crate::runtime::{HAS_BLOCK_HELPER, HAS_BLOCK_PARAMS_HELPER};
use crate::scope::LexicalScope;
use crate::named_blocks::METADATA_ARGUMENT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockQuery {
    HasBlock,
    HasBlockParams,
}

impl BlockQuery {
    pub fn from_path(original: &str) -> Option<Self> {
        match original {
            "has-block" | "hasBlock" => Some(BlockQuery::HasBlock),
            "has-block-params" | "hasBlockParams" => Some(BlockQuery::HasBlockParams),
            _ => None,
        }
    }

    pub fn helper(self) -> &'static str {
        match self {
            BlockQuery::HasBlock => HAS_BLOCK_HELPER,
            BlockQuery::HasBlockParams => HAS_BLOCK_PARAMS_HELPER,
        }
    }
}

/// The parts of a query call shared by the mustache and sub-expression forms.
struct QueryCall<'a> {
    path: &'a PathExpression,
    params: &'a [Expression],
    hash: &'a Hash,
    loc: &'a SourceSpan,
    display: String,
}

struct ResolvedQuery {
    block: String,
    fallback: Expression,
}

pub fn rewrite_mustache(
    node: &MustacheStatement,
    query: BlockQuery,
    scope: &LexicalScope,
    b: &dyn Builders,
) -> Result<MustacheStatement, CompilerError> {
    let Expression::Path(path) = &node.path else {
        return Err(CompilerError::syntax(
            ERR_NOT_SIMPLE_PATH,
            "Invalid block query invocation: expecting a simple path",
            node,
        ));
    };

    let call = QueryCall {
        path,
        params: &node.params,
        hash: &node.hash,
        loc: &node.loc,
        display: format!("{{{{{}}}}}", path.original),
    };
    let resolved = resolve(&call, scope, b)?;

    tracing::debug!(query = ?query, block = %resolved.block, "rewrite block query");

    Ok(b.mustache(
        Expression::Path(b.path(query.helper(), path.loc.clone())),
        query_params(resolved, b),
        None,
        node.trusting,
        node.loc.clone(),
    ))
}

pub fn rewrite_sub_expression(
    node: &SubExpression,
    query: BlockQuery,
    scope: &LexicalScope,
    b: &dyn Builders,
) -> Result<SubExpression, CompilerError> {
    let call = QueryCall {
        path: &node.path,
        params: &node.params,
        hash: &node.hash,
        loc: &node.loc,
        display: format!("({})", node.path.original),
    };
    let resolved = resolve(&call, scope, b)?;

    tracing::debug!(query = ?query, block = %resolved.block, "rewrite block query");

    Ok(b.sexpr(
        b.path(query.helper(), node.path.loc.clone()),
        query_params(resolved, b),
        None,
        node.loc.clone(),
    ))
}

fn query_params(resolved: ResolvedQuery, b: &dyn Builders) -> Vec<Expression> {
    vec![
        Expression::Path(b.path(METADATA_ARGUMENT, SourceSpan::synthetic())),
        b.string(&resolved.block),
        resolved.fallback,
    ]
}

fn resolve(
    call: &QueryCall<'_>,
    scope: &LexicalScope,
    b: &dyn Builders,
) -> Result<ResolvedQuery, CompilerError> {
    check(
        is_simple_path(call.path, scope)?,
        ERR_NOT_SIMPLE_PATH,
        || format!("Invalid {} invocation: expecting a simple path", call.display),
        call.loc,
    )?;

    if let Some(pair) = call.hash.pairs.first() {
        return Err(CompilerError::syntax(
            ERR_HAS_BLOCK_ARGUMENTS,
            format!("Cannot pass {} named argument to {}", pair.key, call.display),
            call.loc,
        ));
    }

    let mut block = match call.params {
        [] => DEFAULT_BLOCK.to_string(),
        [only] => {
            let literal = only.as_string_literal().ok_or_else(|| {
                CompilerError::syntax(
                    ERR_HAS_BLOCK_ARGUMENTS,
                    format!("{} can only accept a string literal argument", call.display),
                    only,
                )
            })?;
            literal.value.clone()
        }
        [_, second, ..] => {
            return Err(CompilerError::syntax(
                ERR_HAS_BLOCK_ARGUMENTS,
                format!("{} only takes a single argument", call.display),
                second,
            ));
        }
    };

    if block == ELSE_BLOCK {
        block = INVERSE_BLOCK.to_string();
    }

    let fallback = if block == DEFAULT_BLOCK {
        synthetic(b.sexpr(call.path.clone(), vec![], None, call.loc.clone()))
    } else if block == INVERSE_BLOCK {
        synthetic(b.sexpr(
            call.path.clone(),
            vec![b.string(INVERSE_BLOCK)],
            None,
            call.loc.clone(),
        ))
    } else {
        b.boolean(false)
    };

    Ok(ResolvedQuery { block, fallback })
}

/// Wraps a re-query so the traversal does not rewrite it again.
fn synthetic(mut sexpr: SubExpression) -> Expression {
    sexpr.mark_synthetic();
    Expression::SubExpression(sexpr)
}
