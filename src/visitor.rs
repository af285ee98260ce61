use crate::ast::{
    AttrNode, AttrValue, Block, BlockStatement, ConcatPart, ElementModifierStatement,
    ElementNode, Expression, Hash, MustacheStatement, Statement, SubExpression, Template,
};
use crate::error::CompilerError;

pub type VisitResult<T> = Result<T, CompilerError>;

/// The TemplateVisitor trait defines the single authoritative traversal mechanism for template trees.
///
/// Rules:
/// 1. Traversal is depth-first, in source order: attributes, modifiers, then children;
///    path, params, hash, then program and inverse.
/// 2. Every `visit_*` method takes ownership of a node and returns the node that replaces it.
/// 3. Implementers override `visit_*` methods to add behavior and MUST call the matching
///    `walk_*` function to continue into children unless pruning is intended.
/// 4. The first error aborts the traversal.
pub trait TemplateVisitor {
    fn visit_template(&mut self, template: Template) -> VisitResult<Template> {
        walk_template(self, template)
    }

    fn visit_block(&mut self, block: Block) -> VisitResult<Block> {
        walk_block(self, block)
    }

    fn visit_statement(&mut self, statement: Statement) -> VisitResult<Statement> {
        walk_statement(self, statement)
    }

    fn visit_element(&mut self, element: ElementNode) -> VisitResult<ElementNode> {
        walk_element(self, element)
    }

    fn visit_mustache(&mut self, mustache: MustacheStatement) -> VisitResult<MustacheStatement> {
        walk_mustache(self, mustache)
    }

    fn visit_block_statement(&mut self, block: BlockStatement) -> VisitResult<BlockStatement> {
        walk_block_statement(self, block)
    }

    fn visit_attribute(&mut self, attr: AttrNode) -> VisitResult<AttrNode> {
        walk_attribute(self, attr)
    }

    fn visit_modifier(
        &mut self,
        modifier: ElementModifierStatement,
    ) -> VisitResult<ElementModifierStatement> {
        walk_modifier(self, modifier)
    }

    fn visit_expression(&mut self, expression: Expression) -> VisitResult<Expression> {
        walk_expression(self, expression)
    }

    fn visit_sub_expression(&mut self, sexpr: SubExpression) -> VisitResult<SubExpression> {
        walk_sub_expression(self, sexpr)
    }

    fn visit_hash(&mut self, hash: Hash) -> VisitResult<Hash> {
        walk_hash(self, hash)
    }

    fn visit_statements(&mut self, statements: Vec<Statement>) -> VisitResult<Vec<Statement>> {
        walk_statements(self, statements)
    }
}

pub fn walk_template<V: TemplateVisitor + ?Sized>(
    visitor: &mut V,
    mut template: Template,
) -> VisitResult<Template> {
    template.body = visitor.visit_statements(template.body)?;
    Ok(template)
}

pub fn walk_block<V: TemplateVisitor + ?Sized>(
    visitor: &mut V,
    mut block: Block,
) -> VisitResult<Block> {
    block.body = visitor.visit_statements(block.body)?;
    Ok(block)
}

pub fn walk_statements<V: TemplateVisitor + ?Sized>(
    visitor: &mut V,
    statements: Vec<Statement>,
) -> VisitResult<Vec<Statement>> {
    statements
        .into_iter()
        .map(|statement| visitor.visit_statement(statement))
        .collect()
}

pub fn walk_statement<V: TemplateVisitor + ?Sized>(
    visitor: &mut V,
    statement: Statement,
) -> VisitResult<Statement> {
    Ok(match statement {
        Statement::Mustache(m) => Statement::Mustache(visitor.visit_mustache(m)?),
        Statement::Block(b) => Statement::Block(visitor.visit_block_statement(b)?),
        Statement::Element(el) => Statement::Element(visitor.visit_element(el)?),
        // Leaves, nothing to walk
        leaf @ (Statement::Text(_) | Statement::MustacheComment(_) | Statement::Comment(_)) => leaf,
    })
}

pub fn walk_element<V: TemplateVisitor + ?Sized>(
    visitor: &mut V,
    mut element: ElementNode,
) -> VisitResult<ElementNode> {
    element.attributes = element
        .attributes
        .into_iter()
        .map(|attr| visitor.visit_attribute(attr))
        .collect::<VisitResult<_>>()?;
    element.modifiers = element
        .modifiers
        .into_iter()
        .map(|modifier| visitor.visit_modifier(modifier))
        .collect::<VisitResult<_>>()?;
    element.children = visitor.visit_statements(element.children)?;
    Ok(element)
}

pub fn walk_attribute<V: TemplateVisitor + ?Sized>(
    visitor: &mut V,
    mut attr: AttrNode,
) -> VisitResult<AttrNode> {
    attr.value = match attr.value {
        AttrValue::Text(t) => AttrValue::Text(t),
        AttrValue::Mustache(m) => AttrValue::Mustache(visitor.visit_mustache(m)?),
        AttrValue::Concat(mut concat) => {
            concat.parts = concat
                .parts
                .into_iter()
                .map(|part| match part {
                    ConcatPart::Text(t) => Ok(ConcatPart::Text(t)),
                    ConcatPart::Mustache(m) => Ok(ConcatPart::Mustache(visitor.visit_mustache(m)?)),
                })
                .collect::<VisitResult<_>>()?;
            AttrValue::Concat(concat)
        }
    };
    Ok(attr)
}

pub fn walk_modifier<V: TemplateVisitor + ?Sized>(
    visitor: &mut V,
    mut modifier: ElementModifierStatement,
) -> VisitResult<ElementModifierStatement> {
    modifier.params = walk_params(visitor, modifier.params)?;
    modifier.hash = visitor.visit_hash(modifier.hash)?;
    Ok(modifier)
}

pub fn walk_mustache<V: TemplateVisitor + ?Sized>(
    visitor: &mut V,
    mut mustache: MustacheStatement,
) -> VisitResult<MustacheStatement> {
    mustache.path = visitor.visit_expression(mustache.path)?;
    mustache.params = walk_params(visitor, mustache.params)?;
    mustache.hash = visitor.visit_hash(mustache.hash)?;
    Ok(mustache)
}

pub fn walk_block_statement<V: TemplateVisitor + ?Sized>(
    visitor: &mut V,
    mut block: BlockStatement,
) -> VisitResult<BlockStatement> {
    block.path = visitor.visit_expression(block.path)?;
    block.params = walk_params(visitor, block.params)?;
    block.hash = visitor.visit_hash(block.hash)?;
    block.program = visitor.visit_block(block.program)?;
    block.inverse = block
        .inverse
        .map(|inverse| visitor.visit_block(inverse))
        .transpose()?;
    Ok(block)
}

pub fn walk_sub_expression<V: TemplateVisitor + ?Sized>(
    visitor: &mut V,
    mut sexpr: SubExpression,
) -> VisitResult<SubExpression> {
    sexpr.params = walk_params(visitor, sexpr.params)?;
    sexpr.hash = visitor.visit_hash(sexpr.hash)?;
    Ok(sexpr)
}

pub fn walk_expression<V: TemplateVisitor + ?Sized>(
    visitor: &mut V,
    expression: Expression,
) -> VisitResult<Expression> {
    Ok(match expression {
        Expression::SubExpression(s) => Expression::SubExpression(visitor.visit_sub_expression(s)?),
        leaf => leaf,
    })
}

pub fn walk_hash<V: TemplateVisitor + ?Sized>(visitor: &mut V, mut hash: Hash) -> VisitResult<Hash> {
    hash.pairs = hash
        .pairs
        .into_iter()
        .map(|mut pair| {
            pair.value = visitor.visit_expression(pair.value)?;
            Ok(pair)
        })
        .collect::<VisitResult<_>>()?;
    Ok(hash)
}

fn walk_params<V: TemplateVisitor + ?Sized>(
    visitor: &mut V,
    params: Vec<Expression>,
) -> VisitResult<Vec<Expression>> {
    params
        .into_iter()
        .map(|param| visitor.visit_expression(param))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{Builders, DefaultBuilders, ElementOptions};
    use crate::ast::SourceSpan;

    /// Counts sub-expressions by their path, wherever they sit.
    struct SexprCounter {
        seen: Vec<String>,
    }

    impl TemplateVisitor for SexprCounter {
        fn visit_sub_expression(&mut self, sexpr: SubExpression) -> VisitResult<SubExpression> {
            self.seen.push(sexpr.path.original.clone());
            walk_sub_expression(self, sexpr)
        }
    }

    #[test]
    fn test_walk_reaches_attributes_params_hash_and_blocks() {
        let b = DefaultBuilders;
        let s = SourceSpan::synthetic;

        let in_attr = b.mustache(
            Expression::Path(b.path("concat", s())),
            vec![Expression::SubExpression(b.sexpr(b.path("a", s()), vec![], None, s()))],
            None,
            false,
            s(),
        );
        let in_hash = b.mustache(
            Expression::Path(b.path("foo", s())),
            vec![],
            Some(b.hash(
                vec![b.pair(
                    "x",
                    Expression::SubExpression(b.sexpr(
                        b.path("b", s()),
                        vec![Expression::SubExpression(b.sexpr(b.path("c", s()), vec![], None, s()))],
                        None,
                        s(),
                    )),
                )],
                s(),
            )),
            false,
            s(),
        );
        let inverse = b.block_itself(vec![Statement::Mustache(in_hash)], vec![], false, s());
        let block = b.block(
            Expression::Path(b.path("if", s())),
            vec![Expression::SubExpression(b.sexpr(b.path("d", s()), vec![], None, s()))],
            None,
            b.block_itself(vec![], vec![], false, s()),
            Some(inverse),
            s(),
        );
        let element = b.element(
            "div",
            ElementOptions {
                attributes: vec![b.attr("class", AttrValue::Mustache(in_attr), s())],
                children: vec![Statement::Block(block)],
                ..Default::default()
            },
        );
        let template = Template {
            body: vec![Statement::Element(element)],
            block_params: vec![],
            loc: s(),
        };

        let mut counter = SexprCounter { seen: vec![] };
        let out = counter.visit_template(template.clone()).unwrap();

        assert_eq!(counter.seen, vec!["a", "d", "b", "c"]);
        assert_eq!(out, template);
    }
}
