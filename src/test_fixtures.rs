//! Hand-built template trees for the pass and end-to-end suites.

use crate::ast::{
    AttrNode, AttrValue, Block, BlockStatement, ElementNode, Expression, Hash, HashPair,
    MustacheCommentStatement, MustacheStatement, PathExpression, Position, SourceSpan, Statement,
    StringLiteral, SubExpression, Template, TextNode,
};

pub const FIXTURE_FILE: &str = "fixture.hbs";

pub fn loc(line: u32, column: u32) -> SourceSpan {
    SourceSpan::new(
        Some(FIXTURE_FILE.to_string()),
        Position::new(line, column),
        Position::new(line, column + 1),
    )
}

pub fn template(body: Vec<Statement>) -> Template {
    Template {
        body,
        block_params: vec![],
        loc: loc(1, 0),
    }
}

pub fn text(chars: &str) -> Statement {
    Statement::Text(TextNode {
        chars: chars.to_string(),
        loc: loc(1, 0),
    })
}

pub fn comment(value: &str) -> Statement {
    Statement::MustacheComment(MustacheCommentStatement {
        value: value.to_string(),
        loc: loc(1, 0),
    })
}

pub fn path(original: &str) -> Expression {
    Expression::Path(PathExpression::new(original, loc(1, 0)))
}

pub fn string(value: &str) -> Expression {
    Expression::String(StringLiteral {
        value: value.to_string(),
        loc: loc(1, 0),
    })
}

pub fn hash(pairs: Vec<(&str, Expression)>) -> Hash {
    Hash {
        pairs: pairs
            .into_iter()
            .map(|(key, value)| HashPair {
                key: key.to_string(),
                value,
                loc: loc(1, 0),
            })
            .collect(),
        loc: loc(1, 0),
    }
}

pub fn sexpr(name: &str, params: Vec<Expression>) -> Expression {
    Expression::SubExpression(SubExpression {
        path: PathExpression::new(name, loc(1, 0)),
        params,
        hash: Hash::default(),
        loc: loc(1, 0),
        origin: Default::default(),
    })
}

pub fn mustache_at(
    name: &str,
    params: Vec<Expression>,
    pairs: Vec<(&str, Expression)>,
    at: SourceSpan,
) -> MustacheStatement {
    MustacheStatement {
        path: Expression::Path(PathExpression::new(name, at.clone())),
        params,
        hash: hash(pairs),
        trusting: false,
        loc: at,
        origin: Default::default(),
    }
}

pub fn mustache(name: &str, params: Vec<Expression>, pairs: Vec<(&str, Expression)>) -> Statement {
    Statement::Mustache(mustache_at(name, params, pairs, loc(1, 0)))
}

pub fn block(
    name: &str,
    params: Vec<Expression>,
    block_params: &[&str],
    body: Vec<Statement>,
) -> Statement {
    Statement::Block(BlockStatement {
        path: path(name),
        params,
        hash: Hash::default(),
        program: Block {
            body,
            block_params: block_params.iter().map(|p| p.to_string()).collect(),
            chained: false,
            loc: loc(1, 0),
            origin: Default::default(),
        },
        inverse: None,
        loc: loc(1, 0),
        origin: Default::default(),
    })
}

pub fn element_at(tag: &str, children: Vec<Statement>, at: SourceSpan) -> ElementNode {
    ElementNode {
        tag: tag.to_string(),
        self_closing: false,
        attributes: vec![],
        modifiers: vec![],
        children,
        comments: vec![],
        block_params: vec![],
        loc: at,
        origin: Default::default(),
    }
}

pub fn element(tag: &str, children: Vec<Statement>) -> ElementNode {
    element_at(tag, children, loc(1, 0))
}

pub fn with_params(mut element: ElementNode, params: &[&str]) -> ElementNode {
    element.block_params = params.iter().map(|p| p.to_string()).collect();
    element
}

pub fn with_arg(mut element: ElementNode, name: &str, value: &str) -> ElementNode {
    element.attributes.push(AttrNode {
        name: name.to_string(),
        value: AttrValue::Text(TextNode {
            chars: value.to_string(),
            loc: loc(1, 0),
        }),
        loc: loc(1, 0),
    });
    element
}

pub fn self_closing(tag: &str) -> ElementNode {
    ElementNode {
        self_closing: true,
        ..element(tag, vec![])
    }
}

/// `<:name as |params|>children</:name>`
pub fn named(name: &str, params: &[&str], children: Vec<Statement>) -> Statement {
    Statement::Element(with_params(element(&format!(":{}", name), children), params))
}

pub fn el(element: ElementNode) -> Statement {
    Statement::Element(element)
}
