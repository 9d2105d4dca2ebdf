//! Decompilers: structural recovery of ESM semantics
//!
//! These undo the Metro calling convention: positional `require` calls
//! become imports, CommonJS export assignments become export declarations,
//! inlined Babel helpers get their canonical names back, and minifier
//! control-flow contractions are re-expanded.

pub mod control_flow;
pub mod exports;
pub mod helpers;
pub mod imports;
