#[cfg(feature = "napi")]
use napi_derive::napi;
use rayon::prelude::*;

use crate::ast::{Block, ElementNode, Expression, MustacheStatement, NodeKind, SubExpression, Template};
use crate::builders::{Builders, DefaultBuilders};
use crate::classify::{collect_named_blocks, is_component_invocation, is_named_block_declaration};
use crate::config::PolyfillOptions;
use crate::error::{
    check, invariant, CompilerError, BUG_NOT_ROOT, BUG_PAYLOAD, BUG_REWRITE_DIVERGED,
    ERR_ELEMENT_BLOCK_PARAMS, ERR_SELF_CLOSING_CONTENT, ERR_TEMPLATE_BLOCK_PARAMS,
    ERR_UNEXPECTED_NAMED_BLOCK,
};
use crate::has_block::{self, BlockQuery};
use crate::named_blocks::rewrite_invocation;
use crate::scope::{Frame, LexicalScope};
use crate::visitor::{
    walk_block, walk_element, walk_mustache, walk_sub_expression, walk_template, TemplateVisitor,
    VisitResult,
};
use crate::yield_to::{rewrite_yield, YIELD_KEYWORD};

// ═══════════════════════════════════════════════════════════════════════════════
// PASS
// ═══════════════════════════════════════════════════════════════════════════════

/// How many times a single node may be replaced before the pass gives up.
const MAX_REWRITES: usize = 16;

/// Single-use traversal state for one template.
///
/// Enter-time rewrites replace the node in place and are offered back to the
/// same hook, the way the host traversal re-visits a returned replacement. A
/// replacement equal to its input ends the cycle. Synthetic nodes are walked
/// but never rewritten.
pub struct NamedBlocksPass<'b> {
    scope: LexicalScope,
    builders: &'b dyn Builders,
}

impl<'b> NamedBlocksPass<'b> {
    pub fn new(builders: &'b dyn Builders) -> Self {
        NamedBlocksPass {
            scope: LexicalScope::new(),
            builders,
        }
    }

    pub fn run(mut self, template: Template) -> Result<Template, CompilerError> {
        self.visit_template(template)
    }

    fn check_template(&self, template: &Template) -> Result<(), CompilerError> {
        invariant(self.scope.is_root(), BUG_NOT_ROOT, || {
            "Invalid nesting: not in root scope".to_string()
        })?;
        check(
            template.block_params.is_empty(),
            ERR_TEMPLATE_BLOCK_PARAMS,
            || {
                format!(
                    "Template cannot have block params, found {}",
                    template.block_params.join(",")
                )
            },
            template,
        )
    }

    fn enter_element(&self, node: &ElementNode) -> Result<Option<ElementNode>, CompilerError> {
        if node.self_closing {
            check(
                node.block_params.is_empty(),
                ERR_SELF_CLOSING_CONTENT,
                || format!("Self closing tag <{} /> cannot have block params", node.tag),
                node,
            )?;
            check(
                node.children.is_empty(),
                ERR_SELF_CLOSING_CONTENT,
                || format!("Self closing tag <{} /> cannot have children", node.tag),
                node,
            )?;
            return Ok(None);
        }

        check(
            !is_named_block_declaration(node)?,
            ERR_UNEXPECTED_NAMED_BLOCK,
            || format!("Unexpected named block <{}>", node.tag),
            node,
        )?;

        let is_component = is_component_invocation(node, &self.scope, false);
        let named_blocks = collect_named_blocks(node)?;

        if is_component && !named_blocks.is_empty() {
            return rewrite_invocation(node, &named_blocks, self.builders).map(Some);
        }

        if !is_component {
            check(
                node.block_params.is_empty(),
                ERR_ELEMENT_BLOCK_PARAMS,
                || format!("Unexpected block params on <{}> HTML element", node.tag),
                node,
            )?;
            if let Some(first) = named_blocks.first() {
                return Err(CompilerError::syntax(
                    ERR_UNEXPECTED_NAMED_BLOCK,
                    format!(
                        "Unexpected named block <{}> inside <{}> HTML element",
                        first.tag, node.tag
                    ),
                    *first,
                ));
            }
        }

        Ok(None)
    }

    fn enter_mustache(
        &self,
        node: &MustacheStatement,
    ) -> Result<Option<MustacheStatement>, CompilerError> {
        let Expression::Path(path) = &node.path else {
            return Ok(None);
        };

        if path.original == YIELD_KEYWORD {
            return rewrite_yield(node, &self.scope, self.builders);
        }

        match BlockQuery::from_path(&path.original) {
            Some(query) => {
                has_block::rewrite_mustache(node, query, &self.scope, self.builders).map(Some)
            }
            None => Ok(None),
        }
    }

    fn enter_sub_expression(
        &self,
        node: &SubExpression,
    ) -> Result<Option<SubExpression>, CompilerError> {
        match BlockQuery::from_path(&node.path.original) {
            Some(query) => {
                has_block::rewrite_sub_expression(node, query, &self.scope, self.builders)
                    .map(Some)
            }
            None => Ok(None),
        }
    }
}

/// Feeds `node` to `enter` until it stops producing a different node.
fn settle<T: PartialEq>(
    mut node: T,
    kind: NodeKind,
    mut enter: impl FnMut(&T) -> Result<Option<T>, CompilerError>,
) -> Result<T, CompilerError> {
    for _ in 0..MAX_REWRITES {
        match enter(&node)? {
            Some(replacement) if replacement != node => {
                tracing::trace!(?kind, "node replaced");
                node = replacement;
            }
            _ => return Ok(node),
        }
    }

    Err(CompilerError::internal(
        BUG_REWRITE_DIVERGED,
        format!("{:?} was still being rewritten after {} passes", kind, MAX_REWRITES),
    ))
}

impl TemplateVisitor for NamedBlocksPass<'_> {
    fn visit_template(&mut self, template: Template) -> VisitResult<Template> {
        self.check_template(&template)?;
        let template = walk_template(self, template)?;
        self.check_template(&template)?;
        Ok(template)
    }

    fn visit_block(&mut self, block: Block) -> VisitResult<Block> {
        if block.origin.is_synthetic() {
            return walk_block(self, block);
        }

        let frame = Frame::for_block(&block);
        self.scope.push(frame.clone());
        let block = walk_block(self, block)?;
        self.scope.pop_expecting(&frame)?;
        Ok(block)
    }

    fn visit_element(&mut self, element: ElementNode) -> VisitResult<ElementNode> {
        if element.origin.is_synthetic() {
            return walk_element(self, element);
        }

        let element = settle(element, NodeKind::ElementNode, |node| self.enter_element(node))?;

        if element.self_closing || !is_component_invocation(&element, &self.scope, false) {
            return walk_element(self, element);
        }

        let frame = Frame::for_component(&element);
        self.scope.push(frame.clone());
        let element = walk_element(self, element)?;
        self.scope.pop_expecting(&frame)?;
        Ok(element)
    }

    fn visit_mustache(&mut self, mustache: MustacheStatement) -> VisitResult<MustacheStatement> {
        if mustache.origin.is_synthetic() {
            return walk_mustache(self, mustache);
        }

        let mustache = settle(mustache, NodeKind::MustacheStatement, |node| {
            self.enter_mustache(node)
        })?;
        walk_mustache(self, mustache)
    }

    fn visit_sub_expression(&mut self, sexpr: SubExpression) -> VisitResult<SubExpression> {
        if sexpr.origin.is_synthetic() {
            return walk_sub_expression(self, sexpr);
        }

        let sexpr = settle(sexpr, NodeKind::SubExpression, |node| {
            self.enter_sub_expression(node)
        })?;
        walk_sub_expression(self, sexpr)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POINTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Rewrites every named-block construct in `template`.
///
/// Returns the tree untouched when the pass is disabled.
pub fn transform_template(
    template: Template,
    options: &PolyfillOptions,
) -> Result<Template, CompilerError> {
    transform_template_with(template, options, &DefaultBuilders)
}

#[tracing::instrument(level = "debug", skip_all, fields(module = options.module_name.as_deref()))]
pub fn transform_template_with(
    template: Template,
    options: &PolyfillOptions,
    builders: &dyn Builders,
) -> Result<Template, CompilerError> {
    if !options.resolve_enabled() {
        tracing::debug!("named-blocks pass disabled");
        return Ok(template);
    }

    NamedBlocksPass::new(builders)
        .run(template)
        .map_err(|err| err.with_context(options.module_name.as_deref(), &options.bug_report_url))
        .inspect_err(|err| tracing::debug!(code = err.code(), "named-blocks pass failed"))
}

/// JSON in, JSON out. A payload that does not describe a template is reported
/// as an internal error, since the host produced it.
pub fn transform_template_json(
    ast_json: &str,
    options: &PolyfillOptions,
) -> Result<String, CompilerError> {
    let template: Template = serde_json::from_str(ast_json).map_err(|e| {
        CompilerError::internal(BUG_PAYLOAD, format!("Template payload parse error: {}", e))
            .with_context(options.module_name.as_deref(), &options.bug_report_url)
    })?;

    let output = transform_template(template, options)?;

    serde_json::to_string(&output).map_err(|e| {
        CompilerError::internal(BUG_PAYLOAD, format!("Template serialize error: {}", e))
            .with_context(options.module_name.as_deref(), &options.bug_report_url)
    })
}

/// Transforms independent templates in parallel. Results keep input order and
/// each template reports its own name as the module name.
pub fn transform_batch(
    templates: Vec<(String, Template)>,
    options: &PolyfillOptions,
) -> Vec<(String, Result<Template, CompilerError>)> {
    templates
        .into_par_iter()
        .map(|(name, template)| {
            let options = options.clone().with_module_name(name.clone());
            let result = transform_template(template, &options);
            (name, result)
        })
        .collect()
}

#[cfg(feature = "napi")]
#[napi]
pub fn transform_template_native(
    ast_json: String,
    options_json: Option<String>,
) -> napi::Result<String> {
    let options: PolyfillOptions = match options_json {
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| napi::Error::from_reason(format!("Options parse error: {}", e)))?,
        None => PolyfillOptions::default(),
    };

    transform_template_json(&ast_json, &options)
        .map_err(|e| napi::Error::from_reason(format!("{}\nHint: {}", e, e.hint())))
}
