//! Bundle parsing: the AST facade and the `__d` registration scanner

pub mod compiler;
pub mod scanner;

pub use compiler::ModuleAst;
pub use scanner::{build_modules, scan_bundle, Registration};
