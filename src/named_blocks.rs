//! Named-block fan-out.
//!
//! ```hbs
//! <MyComponent @some="args">
//!   <:default as |foo|>...</:default>
//!   <:another as |bar baz|>...</:another>
//!   <:yetAnother>...</:yetAnother>
//! </MyComponent>
//! ```
//!
//! becomes
//!
//! ```hbs
//! <MyComponent @some="args" @namedBlocksInfo={{hash default=1 another=2 yetAnother=0}} as |__arg0 __arg1 __arg2|>
//!   {{#if (-is-named-block-invocation __arg0 "default")}}
//!     {{#let __arg0 as |foo|}}...{{/let}}
//!   {{else if (-is-named-block-invocation __arg0 "another")}}
//!     {{#let __arg1 __arg2 as |bar baz|}}...{{/let}}
//!   {{else if (-is-named-block-invocation __arg0 "yetAnother")}}
//!     ...
//!   {{/if}}
//! </MyComponent>
//! ```
//!
//! Every block but `default` reads its params one slot to the right, since
//! slot 0 carries the identity marker.

use indexmap::IndexMap;

use crate::ast::{
    AttrNode, AttrValue, BlockStatement, ElementNode, Expression, SourceSpan, Statement,
};
use crate::builders::{Builders, ElementOptions};
use crate::classify::{block_name, DEFAULT_BLOCK};
use crate::error::{
    check, invariant, CompilerError, BUG_DISPATCH_CHAIN, ERR_INVOCATION_BLOCK_PARAMS,
    ERR_METADATA_ARGUMENT,
};
use crate::runtime::IS_NAMED_BLOCK_INVOCATION_HELPER;

pub const METADATA_ARGUMENT: &str = "@namedBlocksInfo";
pub const SYNTHETIC_PARAM_PREFIX: &str = "__arg";

const HASH_HELPER: &str = "hash";
const IF_KEYWORD: &str = "if";
const LET_KEYWORD: &str = "let";

/// Block name to declared block-param count, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InvocationMetadata {
    pub arities: IndexMap<String, usize>,
}

impl InvocationMetadata {
    pub fn from_blocks(blocks: &[&ElementNode]) -> Self {
        let arities = blocks
            .iter()
            .map(|block| {
                (
                    block_name(block).unwrap_or_default().to_string(),
                    block.block_params.len(),
                )
            })
            .collect();
        Self { arities }
    }

    /// Reads the metadata back from a rewritten invocation, if it has any.
    pub fn from_invocation(element: &ElementNode) -> Option<Self> {
        let attr = element
            .attributes
            .iter()
            .find(|attr| attr.name == METADATA_ARGUMENT)?;
        let AttrValue::Mustache(mustache) = &attr.value else {
            return None;
        };

        let mut arities = IndexMap::new();
        for pair in &mustache.hash.pairs {
            let Expression::Number(n) = &pair.value else {
                return None;
            };
            arities.insert(pair.key.clone(), n.value as usize);
        }
        Some(Self { arities })
    }

    /// `@namedBlocksInfo={{hash name=arity ...}}`
    fn to_attr(&self, b: &dyn Builders) -> AttrNode {
        let pairs = self
            .arities
            .iter()
            .map(|(name, arity)| b.pair(name, b.number(*arity as f64)))
            .collect();

        let value = b.mustache(
            Expression::Path(b.path(HASH_HELPER, SourceSpan::synthetic())),
            vec![],
            Some(b.hash(pairs, SourceSpan::synthetic())),
            false,
            SourceSpan::synthetic(),
        );

        b.attr(METADATA_ARGUMENT, AttrValue::Mustache(value), SourceSpan::synthetic())
    }
}

pub fn synthetic_param(index: usize) -> String {
    format!("{}{}", SYNTHETIC_PARAM_PREFIX, index)
}

/// Slot offset of a block's own params: the default block has no marker slot.
fn param_offset(name: &str) -> usize {
    if name == DEFAULT_BLOCK {
        0
    } else {
        1
    }
}

/// How many positional block params the rewritten invocation must bind.
pub fn synthesized_param_count(blocks: &[&ElementNode]) -> usize {
    blocks
        .iter()
        .map(|block| {
            let name = block_name(block).unwrap_or_default();
            block.block_params.len() + param_offset(name)
        })
        .max()
        .unwrap_or(0)
}

/// Rewrites `invocation`, whose named-block children are `blocks` (as
/// collected by [`crate::classify::collect_named_blocks`]).
pub fn rewrite_invocation(
    invocation: &ElementNode,
    blocks: &[&ElementNode],
    b: &dyn Builders,
) -> Result<ElementNode, CompilerError> {
    check(
        invocation.block_params.is_empty(),
        ERR_INVOCATION_BLOCK_PARAMS,
        || {
            format!(
                "Unexpected block params list on <{}> component invocation: when passing \
                 named blocks, the invocation tag cannot take block params",
                invocation.tag
            )
        },
        invocation,
    )?;

    check(
        !invocation
            .attributes
            .iter()
            .any(|attr| attr.name == METADATA_ARGUMENT),
        ERR_METADATA_ARGUMENT,
        || {
            format!(
                "Unexpected {} argument on <{}> component invocation: the argument is \
                 reserved when passing named blocks",
                METADATA_ARGUMENT, invocation.tag
            )
        },
        invocation,
    )?;

    if let [only] = blocks {
        if block_name(only) == Some(DEFAULT_BLOCK) {
            tracing::debug!(component = %invocation.tag, "unwrap lone <:default> block");
            return Ok(b.element(
                &invocation.tag,
                ElementOptions {
                    attributes: invocation.attributes.clone(),
                    modifiers: invocation.modifiers.clone(),
                    children: only.children.clone(),
                    comments: invocation.comments.clone(),
                    block_params: only.block_params.clone(),
                    self_closing: false,
                    loc: invocation.loc.clone(),
                },
            ));
        }
    }

    let metadata = InvocationMetadata::from_blocks(blocks);
    let param_count = synthesized_param_count(blocks);

    let branches = blocks
        .iter()
        .map(|block| dispatch_branch(block, b))
        .collect::<Vec<_>>();
    let chain = chain_branches(branches, b)?;

    tracing::debug!(
        component = %invocation.tag,
        blocks = ?metadata.arities.keys().collect::<Vec<_>>(),
        params = param_count,
        "fan out named blocks"
    );

    let mut attributes = invocation.attributes.clone();
    attributes.push(metadata.to_attr(b));

    Ok(b.element(
        &invocation.tag,
        ElementOptions {
            attributes,
            modifiers: invocation.modifiers.clone(),
            children: vec![Statement::Block(chain)],
            comments: invocation.comments.clone(),
            block_params: (0..param_count).map(synthetic_param).collect(),
            self_closing: false,
            loc: invocation.loc.clone(),
        },
    ))
}

/// `{{#if (-is-named-block-invocation __arg0 "name")}}<body>{{/if}}`, with the
/// body wrapped in `{{#let __argN ... as |params|}}` when the block binds params.
fn dispatch_branch(block: &ElementNode, b: &dyn Builders) -> BlockStatement {
    let name = block_name(block).unwrap_or_default();
    let loc = block.loc.clone();

    let mut body = b.block_itself(
        block.children.clone(),
        block.block_params.clone(),
        false,
        loc.clone(),
    );

    if !block.block_params.is_empty() {
        let offset = param_offset(name);
        let slots = (0..block.block_params.len())
            .map(|i| Expression::Path(b.path(&synthetic_param(i + offset), SourceSpan::synthetic())))
            .collect();

        let wrapper = b.block(
            Expression::Path(b.path(LET_KEYWORD, SourceSpan::synthetic())),
            slots,
            None,
            body,
            None,
            loc.clone(),
        );
        body = b.block_itself(vec![Statement::Block(wrapper)], vec![], false, loc.clone());
    }

    let test = b.sexpr(
        b.path(IS_NAMED_BLOCK_INVOCATION_HELPER, SourceSpan::synthetic()),
        vec![
            Expression::Path(b.path(&synthetic_param(0), SourceSpan::synthetic())),
            b.string(name),
        ],
        None,
        SourceSpan::synthetic(),
    );

    b.block(
        Expression::Path(b.path(IF_KEYWORD, SourceSpan::synthetic())),
        vec![Expression::SubExpression(test)],
        None,
        body,
        None,
        loc,
    )
}

/// Folds `{{#if}}` branches into one `{{#if}}...{{else if}}...{{/if}}` chain,
/// keeping their order. Every branch must be a bare `{{#if}}` without an
/// inverse of its own.
pub fn chain_branches(
    branches: Vec<BlockStatement>,
    b: &dyn Builders,
) -> Result<BlockStatement, CompilerError> {
    for branch in &branches {
        let is_if = matches!(&branch.path, Expression::Path(p) if p.original == IF_KEYWORD);
        invariant(is_if, BUG_DISPATCH_CHAIN, || {
            let found = match &branch.path {
                Expression::Path(p) => p.original.clone(),
                other => format!("{:?}", other.kind()),
            };
            format!("Expecting {{{{#if}}}}, got {{{{#{}}}}}", found)
        })?;
        invariant(branch.inverse.is_none(), BUG_DISPATCH_CHAIN, || {
            "Parent block already has an inverse block".to_string()
        })?;
    }

    let mut rest = branches.into_iter().rev();
    let last = rest
        .next()
        .ok_or_else(|| CompilerError::internal(BUG_DISPATCH_CHAIN, "Cannot chain zero blocks"))?;

    Ok(rest.fold(last, |tail, mut branch| {
        let loc = tail.loc.clone();
        branch.inverse = Some(b.block_itself(vec![Statement::Block(tail)], vec![], true, loc));
        branch
    }))
}
