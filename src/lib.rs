//! metro-dec-rs: decompiler for Metro React Native JavaScript bundles
//!
//! This library turns a bundled, minified Metro bundle (a single script of
//! `__d(...)` registrations) back into per-module source files. The core
//! is a multi-pass AST pipeline: taggers classify modules, editors clean
//! up local noise, and decompilers recover ESM syntax from the Metro
//! calling convention.

pub mod bundle;
pub mod cache;
pub mod cli;
pub mod decompiler;
pub mod error;
pub mod module;
pub mod plugins;
pub mod router;

pub use decompiler::{BundleInput, DecompileOptions, DecompileResult, Decompiler};
pub use error::{Error as DecompilerError, Result as DecompilerResult};

// Re-export commonly used types
pub use module::graph::ModuleGraph;
pub use module::{Module, ModuleId};
pub use router::Router;
