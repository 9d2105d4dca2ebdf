//! Parse/print facade over the oxc toolchain
//!
//! Every module owns its AST: the source text and the arena live in a
//! `ProgramCell`, so a `ModuleAst` can be stored in the module graph and
//! mutated in place without threading arena lifetimes through the pipeline.

use arcstr::ArcStr;
use oxc_allocator::Allocator;
use oxc_ast::ast::Program;
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_parser::{ParseOptions, Parser};
use oxc_span::SourceType;
use self_cell::self_cell;

use crate::error::{Error, Result};

pub struct ProgramCellOwner {
    pub source: ArcStr,
    pub allocator: Allocator,
}

pub struct ProgramCellDependent<'cell> {
    pub program: Program<'cell>,
}

self_cell!(
    /// Wrapper that lets a `Program<'ast>` be treated as an owned value
    /// without exposing the `'ast` lifetime to the rest of the pipeline.
    pub struct ProgramCell {
        owner: ProgramCellOwner,

        #[covariant]
        dependent: ProgramCellDependent,
    }
);

pub struct WithMutFields<'outer, 'inner> {
    pub source: &'inner ArcStr,
    pub allocator: &'inner Allocator,
    pub program: &'outer mut Program<'inner>,
}

/// An owned, mutable JavaScript program
pub struct ModuleAst {
    cell: ProgramCell,
}

impl ModuleAst {
    /// Parse `source` into an owned AST.
    ///
    /// Factory bodies are parsed as standalone programs, so `return`
    /// outside of a function must be accepted.
    pub fn parse(source: impl Into<ArcStr>, source_type: SourceType) -> Result<Self> {
        let source: ArcStr = source.into();
        let cell = ProgramCell::try_new(ProgramCellOwner { source, allocator: Allocator::default() }, |owner| {
            let parser = Parser::new(&owner.allocator, &owner.source, source_type).with_options(ParseOptions {
                allow_return_outside_function: true,
                // Rewrites match on node shape; parenthesis nodes would
                // only get in the way and the printer restores them.
                preserve_parens: false,
                ..ParseOptions::default()
            });
            let ret = parser.parse();
            if ret.panicked || !ret.errors.is_empty() {
                Err(Error::Parse {
                    message: ret
                        .errors
                        .first()
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| "unknown parse error".to_string()),
                })
            } else {
                Ok(ProgramCellDependent { program: ret.program })
            }
        })?;
        Ok(ModuleAst { cell })
    }

    /// An empty program, used as the body stub for aggressively cached modules.
    pub fn empty() -> Self {
        ModuleAst::parse("", SourceType::cjs()).expect("empty program always parses")
    }

    /// The source text this AST was parsed from.
    pub fn source(&self) -> &str {
        &self.cell.borrow_owner().source
    }

    /// Read-only access to the program.
    pub fn with_program<Ret>(&self, func: impl for<'cell> FnOnce(&Program<'cell>) -> Ret) -> Ret {
        func(&self.cell.borrow_dependent().program)
    }

    /// Mutable access to the program together with its arena.
    pub fn with_mut<'outer, Ret>(
        &'outer mut self,
        func: impl for<'inner> FnOnce(WithMutFields<'outer, 'inner>) -> Ret,
    ) -> Ret {
        self.cell.with_dependent_mut::<'outer, Ret>(
            |owner: &ProgramCellOwner, dependent: &'outer mut ProgramCellDependent| {
                func(WithMutFields {
                    source: &owner.source,
                    allocator: &owner.allocator,
                    program: &mut dependent.program,
                })
            },
        )
    }

    /// Print the program back to JavaScript source.
    pub fn print(&self) -> String {
        Codegen::new()
            .with_options(CodegenOptions::default())
            .build(&self.cell.borrow_dependent().program)
            .code
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_print_round_trip() {
        let ast = ModuleAst::parse("const a = 1;", SourceType::cjs()).unwrap();
        assert_eq!(ast.print(), "const a = 1;\n");
    }

    #[test]
    fn parse_allows_return_outside_function() {
        // Factory bodies frequently end in a bare `return`.
        assert!(ModuleAst::parse("if (a) return; b();", SourceType::cjs()).is_ok());
    }

    #[test]
    fn parse_error_is_surfaced() {
        assert!(ModuleAst::parse("const = ;", SourceType::cjs()).is_err());
    }

    #[test]
    fn empty_stub_prints_nothing() {
        assert_eq!(ModuleAst::empty().print(), "");
    }
}
