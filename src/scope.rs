use crate::ast::{Block, ElementNode, NodeKind, SourceSpan};
use crate::error::{invariant, CompilerError, BUG_SCOPE_MISMATCH, BUG_SCOPE_UNDERFLOW};

/// One level of lexical scope: the block params a body-bearing node binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub owner: FrameOwner,
    pub block_params: Vec<String>,
    pub loc: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOwner {
    Block,
    Component(String),
}

impl Frame {
    pub fn for_block(block: &Block) -> Self {
        Self {
            owner: FrameOwner::Block,
            block_params: block.block_params.clone(),
            loc: block.loc.clone(),
        }
    }

    pub fn for_component(element: &ElementNode) -> Self {
        Self {
            owner: FrameOwner::Component(element.tag.clone()),
            block_params: element.block_params.clone(),
            loc: element.loc.clone(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self.owner {
            FrameOwner::Block => NodeKind::Block,
            FrameOwner::Component(_) => NodeKind::ElementNode,
        }
    }

    fn describe(&self) -> String {
        let owner = match &self.owner {
            FrameOwner::Block => "block".to_string(),
            FrameOwner::Component(tag) => format!("component invocation <{}>", tag),
        };
        format!(
            "{} as |{}| at line {} column {}",
            owner,
            self.block_params.join(" "),
            self.loc.start.line,
            self.loc.start.column
        )
    }
}

/// Stack of block-param frames for the nodes currently being visited.
#[derive(Debug, Default)]
pub struct LexicalScope {
    stack: Vec<Frame>,
}

impl LexicalScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame) {
        tracing::trace!(
            depth = self.stack.len() + 1,
            kind = ?frame.kind(),
            params = ?frame.block_params,
            "scope push"
        );
        self.stack.push(frame);
    }

    pub fn pop(&mut self) -> Result<Frame, CompilerError> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| CompilerError::internal(BUG_SCOPE_UNDERFLOW, "Cannot pop root scope"))?;
        tracing::trace!(depth = self.stack.len(), "scope pop");
        Ok(frame)
    }

    /// Pops the innermost frame and checks it belongs to `expected`.
    pub fn pop_expecting(&mut self, expected: &Frame) -> Result<Frame, CompilerError> {
        let actual = self.pop()?;
        invariant(actual == *expected, BUG_SCOPE_MISMATCH, || {
            format!(
                "Invalid nesting: expecting {} got {}",
                expected.describe(),
                actual.describe()
            )
        })?;
        Ok(actual)
    }

    /// Whether `name` is bound by any enclosing frame, optionally skipping the
    /// innermost one.
    pub fn is_local(&self, name: &str, ignore_innermost: bool) -> bool {
        let frames = if ignore_innermost {
            &self.stack[..self.stack.len().saturating_sub(1)]
        } else {
            &self.stack[..]
        };

        frames
            .iter()
            .any(|frame| frame.block_params.iter().any(|param| param == name))
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_root(&self) -> bool {
        self.stack.is_empty()
    }
}
