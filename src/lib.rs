//! # Named Blocks Native
//!
//! Desugars named blocks (`<:header>...</:header>` passed to a component
//! invocation) into constructs a runtime without native named-block support
//! can evaluate.
//!
//! ## Rewrite Invariants
//!
//! 1. **Fan-out**: an invocation passing named blocks binds `__arg0..__argN`
//!    and dispatches on `__arg0` through an `{{#if}}` chain in declaration order.
//!    `@namedBlocksInfo` records the block-param count of every block passed.
//!
//! 2. **Marker Slot**: `{{yield to="name"}}` prepends a
//!    `(-named-block-invocation "name")` marker, so every block except
//!    `default` reads its own params one slot to the right.
//!
//! 3. **Block Queries**: `has-block` / `has-block-params` consult
//!    `@namedBlocksInfo` and fall back to the plain query when the invocation
//!    carries no metadata.
//!
//! 4. **Lone Default**: an invocation passing only `<:default>` is rewritten to
//!    the plain block form, identical to writing the body inline.
//!
//! 5. **Scope**: block-param frames push on enter and pop on exit; a mismatch
//!    is an internal error, never a silent recovery.

pub mod ast;
pub mod builders;
pub mod classify;
pub mod config;
pub mod error;
pub mod has_block;
pub mod named_blocks;
pub mod runtime;
pub mod scope;
pub mod visitor;
pub mod yield_to;

mod transform;

#[cfg(test)]
mod test_fixtures;



pub use ast::Template;
pub use builders::{Builders, DefaultBuilders};
pub use config::PolyfillOptions;
pub use error::CompilerError;
pub use runtime::{Runtime, RuntimeError, Value};
pub use transform::{
    transform_batch, transform_template, transform_template_json, transform_template_with,
    NamedBlocksPass,
};

#[cfg(feature = "napi")]
pub use transform::transform_template_native;
