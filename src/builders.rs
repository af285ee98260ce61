//! Node construction API.
//!
//! The host toolchain may supply its own implementation (to stamp its own
//! locations or bookkeeping); every method has a default body, so
//! `DefaultBuilders` is just the trait with nothing overridden.

use crate::ast::{
    AttrNode, AttrValue, Block, BlockStatement, BooleanLiteral, ElementModifierStatement,
    ElementNode, Expression, Hash, HashPair, MustacheCommentStatement, MustacheStatement,
    NumberLiteral, Origin, PathExpression, SourceSpan, Statement, StringLiteral, SubExpression,
};

/// Optional parts of an element, mirroring the options-object element builder.
#[derive(Debug, Clone, Default)]
pub struct ElementOptions {
    pub attributes: Vec<AttrNode>,
    pub modifiers: Vec<ElementModifierStatement>,
    pub children: Vec<Statement>,
    pub comments: Vec<MustacheCommentStatement>,
    pub block_params: Vec<String>,
    pub self_closing: bool,
    pub loc: SourceSpan,
}

pub trait Builders {
    fn path(&self, original: &str, loc: SourceSpan) -> PathExpression {
        PathExpression::new(original, loc)
    }

    fn string(&self, value: &str) -> Expression {
        Expression::String(StringLiteral {
            value: value.to_string(),
            loc: SourceSpan::synthetic(),
        })
    }

    fn number(&self, value: f64) -> Expression {
        Expression::Number(NumberLiteral {
            value,
            loc: SourceSpan::synthetic(),
        })
    }

    fn boolean(&self, value: bool) -> Expression {
        Expression::Boolean(BooleanLiteral {
            value,
            loc: SourceSpan::synthetic(),
        })
    }

    fn pair(&self, key: &str, value: Expression) -> HashPair {
        HashPair {
            key: key.to_string(),
            value,
            loc: SourceSpan::synthetic(),
        }
    }

    fn hash(&self, pairs: Vec<HashPair>, loc: SourceSpan) -> Hash {
        Hash { pairs, loc }
    }

    fn sexpr(
        &self,
        path: PathExpression,
        params: Vec<Expression>,
        hash: Option<Hash>,
        loc: SourceSpan,
    ) -> SubExpression {
        SubExpression {
            path,
            params,
            hash: hash.unwrap_or_default(),
            loc,
            origin: Origin::Source,
        }
    }

    fn mustache(
        &self,
        path: Expression,
        params: Vec<Expression>,
        hash: Option<Hash>,
        trusting: bool,
        loc: SourceSpan,
    ) -> MustacheStatement {
        MustacheStatement {
            path,
            params,
            hash: hash.unwrap_or_default(),
            trusting,
            loc,
            origin: Origin::Source,
        }
    }

    fn block(
        &self,
        path: Expression,
        params: Vec<Expression>,
        hash: Option<Hash>,
        program: Block,
        inverse: Option<Block>,
        loc: SourceSpan,
    ) -> BlockStatement {
        BlockStatement {
            path,
            params,
            hash: hash.unwrap_or_default(),
            program,
            inverse,
            loc,
            origin: Origin::Source,
        }
    }

    fn block_itself(
        &self,
        body: Vec<Statement>,
        block_params: Vec<String>,
        chained: bool,
        loc: SourceSpan,
    ) -> Block {
        Block {
            body,
            block_params,
            chained,
            loc,
            origin: Origin::Source,
        }
    }

    fn attr(&self, name: &str, value: AttrValue, loc: SourceSpan) -> AttrNode {
        AttrNode {
            name: name.to_string(),
            value,
            loc,
        }
    }

    fn element(&self, tag: &str, options: ElementOptions) -> ElementNode {
        ElementNode {
            tag: tag.to_string(),
            self_closing: options.self_closing,
            attributes: options.attributes,
            modifiers: options.modifiers,
            children: options.children,
            comments: options.comments,
            block_params: options.block_params,
            loc: options.loc,
            origin: Origin::Source,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBuilders;

impl Builders for DefaultBuilders {}
