//! Intermediate Representation for registry to Lua code generation.
//!
//! This module defines a three-layer architecture:
//! 1. Compiled-operation IR: classified attributes, inputs, arity, docs
//! 2. Lua AST IR: expressions, statements, functions, module
//! 3. Emission: AST to Lua code strings via the `Emit` trait
//!
//! ## Module Structure
//!
//! - `api`: compiled-operation IR (CompiledOperation, CompiledAttribute)
//! - `attr`: attribute classification and default rendering
//! - `docs`: docstring segmentation
//! - `naming`: operation and parameter name normalization
//! - `normalize`: registry entry -> compiled IR
//! - `codegen`: compiled IR -> Lua AST
//! - `emit`: Lua AST -> code strings (via Emit trait)
//! - `types`: Lua AST IR

pub mod api;
pub mod attr;
mod codegen;
pub mod docs;
mod emit;
pub mod naming;
mod normalize;
pub mod types;

// Re-export the main entry points
pub use codegen::{codegen_module, codegen_operation};
pub use emit::Emit;
pub use normalize::compile_operation;
