//! Template syntax tree consumed and produced by the named-blocks pass.
//!
//! The shapes follow the JSON the host toolchain hands over: every node
//! is tagged with a `type` discriminant, field names are camelCase, and
//! missing optional fields fall back to their defaults. Statements,
//! expressions and attribute values are closed enums, so every visitor
//! site matches exhaustively.

use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════════════
// LOCATIONS & ORIGIN
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub start: Position,
    #[serde(default)]
    pub end: Position,
}

impl SourceSpan {
    pub fn new(source: Option<String>, start: Position, end: Position) -> Self {
        Self { source, start, end }
    }

    /// Span for nodes the pass builds itself.
    pub fn synthetic() -> Self {
        Self::default()
    }

    pub fn is_synthetic(&self) -> bool {
        self.source.is_none() && self.start == Position::default() && self.end == Position::default()
    }
}

/// Where a node came from. Synthetic nodes are walked but never handed to
/// the rewrite hooks again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    #[default]
    Source,
    Synthetic,
}

impl Origin {
    pub fn is_source(&self) -> bool {
        matches!(self, Origin::Source)
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, Origin::Synthetic)
    }
}

/// Anything that can point a diagnostic at the template source.
pub trait Located {
    fn loc(&self) -> &SourceSpan;
}

macro_rules! impl_located {
    ($($ty:ty),* $(,)?) => {
        $(impl Located for $ty {
            fn loc(&self) -> &SourceSpan {
                &self.loc
            }
        })*
    };
}

impl Located for SourceSpan {
    fn loc(&self) -> &SourceSpan {
        self
    }
}

/// Discriminant for every node kind, used in logs and nesting diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Template,
    Block,
    ElementNode,
    AttrNode,
    ElementModifierStatement,
    MustacheStatement,
    BlockStatement,
    SubExpression,
    PathExpression,
    StringLiteral,
    NumberLiteral,
    BooleanLiteral,
    TextNode,
    ConcatStatement,
    MustacheCommentStatement,
    CommentStatement,
    Hash,
    HashPair,
}

// ═══════════════════════════════════════════════════════════════════════════════
// BODY-BEARING NODES
// ═══════════════════════════════════════════════════════════════════════════════

/// Program root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub body: Vec<Statement>,
    #[serde(default)]
    pub block_params: Vec<String>,
    #[serde(default)]
    pub loc: SourceSpan,
}

/// Body of a block statement (`{{#if}}...{{/if}}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub body: Vec<Statement>,
    #[serde(default)]
    pub block_params: Vec<String>,
    #[serde(default)]
    pub chained: bool,
    #[serde(default)]
    pub loc: SourceSpan,
    #[serde(default, skip_serializing_if = "Origin::is_source")]
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementNode {
    pub tag: String,
    #[serde(default)]
    pub self_closing: bool,
    #[serde(default)]
    pub attributes: Vec<AttrNode>,
    #[serde(default)]
    pub modifiers: Vec<ElementModifierStatement>,
    #[serde(default)]
    pub children: Vec<Statement>,
    #[serde(default)]
    pub comments: Vec<MustacheCommentStatement>,
    #[serde(default)]
    pub block_params: Vec<String>,
    #[serde(default)]
    pub loc: SourceSpan,
    #[serde(default, skip_serializing_if = "Origin::is_source")]
    pub origin: Origin,
}

// ═══════════════════════════════════════════════════════════════════════════════
// STATEMENTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Statement {
    #[serde(rename = "MustacheStatement")]
    Mustache(MustacheStatement),
    #[serde(rename = "BlockStatement")]
    Block(BlockStatement),
    #[serde(rename = "ElementNode")]
    Element(ElementNode),
    #[serde(rename = "TextNode")]
    Text(TextNode),
    #[serde(rename = "MustacheCommentStatement")]
    MustacheComment(MustacheCommentStatement),
    #[serde(rename = "CommentStatement")]
    Comment(CommentStatement),
}

impl Statement {
    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Statement::Element(el) => Some(el),
            _ => None,
        }
    }
}

impl Located for Statement {
    fn loc(&self) -> &SourceSpan {
        match self {
            Statement::Mustache(n) => &n.loc,
            Statement::Block(n) => &n.loc,
            Statement::Element(n) => &n.loc,
            Statement::Text(n) => &n.loc,
            Statement::MustacheComment(n) => &n.loc,
            Statement::Comment(n) => &n.loc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MustacheStatement {
    pub path: Expression,
    #[serde(default)]
    pub params: Vec<Expression>,
    #[serde(default)]
    pub hash: Hash,
    #[serde(default)]
    pub trusting: bool,
    #[serde(default)]
    pub loc: SourceSpan,
    #[serde(default, skip_serializing_if = "Origin::is_source")]
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStatement {
    pub path: Expression,
    #[serde(default)]
    pub params: Vec<Expression>,
    #[serde(default)]
    pub hash: Hash,
    pub program: Block,
    #[serde(default)]
    pub inverse: Option<Block>,
    #[serde(default)]
    pub loc: SourceSpan,
    #[serde(default, skip_serializing_if = "Origin::is_source")]
    pub origin: Origin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementModifierStatement {
    pub path: PathExpression,
    #[serde(default)]
    pub params: Vec<Expression>,
    #[serde(default)]
    pub hash: Hash,
    #[serde(default)]
    pub loc: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub chars: String,
    #[serde(default)]
    pub loc: SourceSpan,
}

impl TextNode {
    pub fn is_whitespace(&self) -> bool {
        self.chars.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MustacheCommentStatement {
    pub value: String,
    #[serde(default)]
    pub loc: SourceSpan,
}

/// HTML comment (`<!-- -->`). Renders into the output, so it counts as content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentStatement {
    pub value: String,
    #[serde(default)]
    pub loc: SourceSpan,
}

// ═══════════════════════════════════════════════════════════════════════════════
// ATTRIBUTES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrNode {
    pub name: String,
    pub value: AttrValue,
    #[serde(default)]
    pub loc: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AttrValue {
    #[serde(rename = "TextNode")]
    Text(TextNode),
    #[serde(rename = "MustacheStatement")]
    Mustache(MustacheStatement),
    #[serde(rename = "ConcatStatement")]
    Concat(ConcatStatement),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcatStatement {
    pub parts: Vec<ConcatPart>,
    #[serde(default)]
    pub loc: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConcatPart {
    #[serde(rename = "TextNode")]
    Text(TextNode),
    #[serde(rename = "MustacheStatement")]
    Mustache(MustacheStatement),
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPRESSIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expression {
    #[serde(rename = "PathExpression")]
    Path(PathExpression),
    #[serde(rename = "SubExpression")]
    SubExpression(SubExpression),
    #[serde(rename = "StringLiteral")]
    String(StringLiteral),
    #[serde(rename = "NumberLiteral")]
    Number(NumberLiteral),
    #[serde(rename = "BooleanLiteral")]
    Boolean(BooleanLiteral),
}

impl Expression {
    pub fn kind(&self) -> NodeKind {
        match self {
            Expression::Path(_) => NodeKind::PathExpression,
            Expression::SubExpression(_) => NodeKind::SubExpression,
            Expression::String(_) => NodeKind::StringLiteral,
            Expression::Number(_) => NodeKind::NumberLiteral,
            Expression::Boolean(_) => NodeKind::BooleanLiteral,
        }
    }

    pub fn as_path(&self) -> Option<&PathExpression> {
        match self {
            Expression::Path(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_string_literal(&self) -> Option<&StringLiteral> {
        match self {
            Expression::String(lit) => Some(lit),
            _ => None,
        }
    }

    /// Stamps this expression and everything below it as synthetic.
    pub fn mark_synthetic(&mut self) {
        if let Expression::SubExpression(sexpr) = self {
            sexpr.mark_synthetic();
        }
    }
}

impl Located for Expression {
    fn loc(&self) -> &SourceSpan {
        match self {
            Expression::Path(n) => &n.loc,
            Expression::SubExpression(n) => &n.loc,
            Expression::String(n) => &n.loc,
            Expression::Number(n) => &n.loc,
            Expression::Boolean(n) => &n.loc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathExpression {
    pub original: String,
    #[serde(default)]
    pub this: bool,
    #[serde(default)]
    pub data: bool,
    #[serde(default)]
    pub parts: Vec<String>,
    #[serde(default)]
    pub loc: SourceSpan,
}

impl PathExpression {
    /// Splits `original` into its head flags and segments: `@foo.bar` is a
    /// data path with parts `[foo, bar]`, `this.foo` a `this` path with parts `[foo]`.
    pub fn new(original: &str, loc: SourceSpan) -> Self {
        let mut rest = original;
        let mut this = false;
        let mut data = false;

        if let Some(stripped) = rest.strip_prefix('@') {
            data = true;
            rest = stripped;
        } else if rest == "this" {
            this = true;
            rest = "";
        } else if let Some(stripped) = rest.strip_prefix("this.") {
            this = true;
            rest = stripped;
        }

        let parts = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('.').map(str::to_string).collect()
        };

        Self {
            original: original.to_string(),
            this,
            data,
            parts,
            loc,
        }
    }

    pub fn head(&self) -> Option<&str> {
        self.parts.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubExpression {
    pub path: PathExpression,
    #[serde(default)]
    pub params: Vec<Expression>,
    #[serde(default)]
    pub hash: Hash,
    #[serde(default)]
    pub loc: SourceSpan,
    #[serde(default, skip_serializing_if = "Origin::is_source")]
    pub origin: Origin,
}

impl SubExpression {
    pub fn mark_synthetic(&mut self) {
        self.origin = Origin::Synthetic;
        for param in &mut self.params {
            param.mark_synthetic();
        }
        for pair in &mut self.hash.pairs {
            pair.value.mark_synthetic();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StringLiteral {
    pub value: String,
    #[serde(default)]
    pub loc: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberLiteral {
    pub value: f64,
    #[serde(default)]
    pub loc: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanLiteral {
    pub value: bool,
    #[serde(default)]
    pub loc: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Hash {
    #[serde(default)]
    pub pairs: Vec<HashPair>,
    #[serde(default)]
    pub loc: SourceSpan,
}

impl Hash {
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Expression> {
        self.pairs.iter().find(|p| p.key == key).map(|p| &p.value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HashPair {
    pub key: String,
    pub value: Expression,
    #[serde(default)]
    pub loc: SourceSpan,
}

impl_located!(
    Template,
    Block,
    ElementNode,
    MustacheStatement,
    BlockStatement,
    ElementModifierStatement,
    TextNode,
    MustacheCommentStatement,
    CommentStatement,
    AttrNode,
    ConcatStatement,
    PathExpression,
    SubExpression,
    StringLiteral,
    NumberLiteral,
    BooleanLiteral,
    Hash,
    HashPair,
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_path_expression_heads() {
        let arg = PathExpression::new("@namedBlocksInfo", SourceSpan::synthetic());
        assert!(arg.data);
        assert_eq!(arg.parts, vec!["namedBlocksInfo"]);

        let this = PathExpression::new("this.foo.bar", SourceSpan::synthetic());
        assert!(this.this);
        assert_eq!(this.parts, vec!["foo", "bar"]);

        let simple = PathExpression::new("has-block", SourceSpan::synthetic());
        assert!(!simple.this && !simple.data);
        assert_eq!(simple.head(), Some("has-block"));
    }

    #[test]
    fn test_deserialize_host_payload() {
        let payload = json!({
            "body": [
                {
                    "type": "ElementNode",
                    "tag": "Card",
                    "children": [
                        { "type": "TextNode", "chars": "  " },
                        {
                            "type": "MustacheStatement",
                            "path": { "type": "PathExpression", "original": "yield", "parts": ["yield"] },
                            "params": [{ "type": "StringLiteral", "value": "x" }]
                        }
                    ],
                    "loc": { "source": "card.hbs", "start": { "line": 1, "column": 0 }, "end": { "line": 3, "column": 7 } }
                }
            ]
        });

        let template: Template = serde_json::from_value(payload).unwrap();
        let el = template.body[0].as_element().unwrap();
        assert_eq!(el.tag, "Card");
        assert!(!el.self_closing);
        assert_eq!(el.children.len(), 2);
        assert_eq!(el.loc.source.as_deref(), Some("card.hbs"));
        assert!(el.origin.is_source());
    }

    #[test]
    fn test_mark_synthetic_reaches_nested_sub_expressions() {
        let inner = SubExpression {
            path: PathExpression::new("has-block", SourceSpan::synthetic()),
            params: vec![],
            hash: Hash::default(),
            loc: SourceSpan::synthetic(),
            origin: Origin::Source,
        };
        let mut outer = Expression::SubExpression(SubExpression {
            path: PathExpression::new("concat", SourceSpan::synthetic()),
            params: vec![Expression::SubExpression(inner)],
            hash: Hash::default(),
            loc: SourceSpan::synthetic(),
            origin: Origin::Source,
        });

        outer.mark_synthetic();

        let Expression::SubExpression(outer) = outer else {
            panic!("expected sub-expression");
        };
        assert!(outer.origin.is_synthetic());
        let Expression::SubExpression(inner) = &outer.params[0] else {
            panic!("expected nested sub-expression");
        };
        assert!(inner.origin.is_synthetic());
    }
}
