//! Core of the Lua raw-op stub generator.
//!
//! Reads the engine's operation registry, compiles each selected operation
//! into a call stub for the `tfl` Lua wrapper and renders the whole module:
//!
//! ```text
//! OpList (pbtxt | json) -> CompiledOperation -> LuaModule -> String
//! ```
//!
//! The entry point is [`generate`].

pub mod dtype;
mod emitter;
pub mod error;
pub mod ir;
pub mod registry;

pub use emitter::{DEFAULT_PRIVATE_PREFIX, GenerateRequest, GeneratedModule, generate};
pub use error::{GenerateError, GenerateResult};
pub use registry::OpList;
