//! Construction helpers for the nodes the rewrites synthesize
//!
//! Thin wrapper over `oxc_ast::AstBuilder` so the decompilers read as
//! intent (`import_default_stmt`, `export_default_stmt`) rather than as
//! allocator plumbing. Synthesized nodes carry empty spans.

use oxc_ast::ast::{
    Expression, ExportDefaultDeclaration, ExportDefaultDeclarationKind, ExportNamedDeclaration,
    ExportSpecifier, ImportDeclaration, ImportDeclarationSpecifier, ImportOrExportKind, Statement,
    VariableDeclarationKind,
};
use oxc_ast::{AstBuilder, NONE};
use oxc_span::SPAN;
use oxc_syntax::operator::UnaryOperator;

pub struct AstSnippet<'ast> {
    pub builder: AstBuilder<'ast>,
}

impl<'ast> AstSnippet<'ast> {
    pub fn new(builder: AstBuilder<'ast>) -> Self {
        Self { builder }
    }

    pub fn id_ref_expr(&self, name: &str) -> Expression<'ast> {
        self.builder.expression_identifier(SPAN, self.builder.atom(name))
    }

    /// `expr;`
    pub fn expr_stmt(&self, expression: Expression<'ast>) -> Statement<'ast> {
        self.builder.statement_expression(SPAN, expression)
    }

    /// `!expr`
    pub fn not_expr(&self, expression: Expression<'ast>) -> Expression<'ast> {
        self.builder.expression_unary(SPAN, UnaryOperator::LogicalNot, expression)
    }

    /// `if (test) consequent` / `if (test) consequent else alternate`
    pub fn if_stmt(
        &self,
        test: Expression<'ast>,
        consequent: Statement<'ast>,
        alternate: Option<Statement<'ast>>,
    ) -> Statement<'ast> {
        Statement::IfStatement(self.builder.alloc_if_statement(SPAN, test, consequent, alternate))
    }

    /// `import local from 'source';`
    pub fn import_default_stmt(&self, local: &str, source: &str) -> Statement<'ast> {
        let specifier = ImportDeclarationSpecifier::ImportDefaultSpecifier(
            self.builder.alloc_import_default_specifier(
                SPAN,
                self.builder.binding_identifier(SPAN, self.builder.atom(local)),
            ),
        );
        self.import_stmt(Some(specifier), source)
    }

    /// `import * as local from 'source';`
    pub fn import_namespace_stmt(&self, local: &str, source: &str) -> Statement<'ast> {
        let specifier = ImportDeclarationSpecifier::ImportNamespaceSpecifier(
            self.builder.alloc_import_namespace_specifier(
                SPAN,
                self.builder.binding_identifier(SPAN, self.builder.atom(local)),
            ),
        );
        self.import_stmt(Some(specifier), source)
    }

    /// `import 'source';`
    pub fn import_side_effect_stmt(&self, source: &str) -> Statement<'ast> {
        self.import_stmt(None, source)
    }

    fn import_stmt(
        &self,
        specifier: Option<ImportDeclarationSpecifier<'ast>>,
        source: &str,
    ) -> Statement<'ast> {
        let specifiers = specifier.map(|s| self.builder.vec1(s));
        let declaration = ImportDeclaration {
            span: SPAN,
            specifiers,
            source: self.builder.string_literal(SPAN, self.builder.atom(source), None),
            phase: None,
            with_clause: None,
            import_kind: ImportOrExportKind::Value,
        };
        Statement::ImportDeclaration(self.builder.alloc(declaration))
    }

    /// `export default expr;`
    pub fn export_default_stmt(&self, expression: Expression<'ast>) -> Statement<'ast> {
        let declaration = ExportDefaultDeclaration {
            span: SPAN,
            exported: self.builder.module_export_name_identifier_name(SPAN, "default"),
            declaration: ExportDefaultDeclarationKind::from(expression),
        };
        Statement::ExportDefaultDeclaration(self.builder.alloc(declaration))
    }

    /// `export { local as exported };`
    pub fn export_specifier_stmt(&self, local: &str, exported: &str) -> Statement<'ast> {
        let specifier = ExportSpecifier {
            span: SPAN,
            local: self
                .builder
                .module_export_name_identifier_reference(SPAN, self.builder.atom(local)),
            exported: self
                .builder
                .module_export_name_identifier_name(SPAN, self.builder.atom(exported)),
            export_kind: ImportOrExportKind::Value,
        };
        let declaration = ExportNamedDeclaration {
            span: SPAN,
            declaration: None,
            specifiers: self.builder.vec1(specifier),
            source: None,
            export_kind: ImportOrExportKind::Value,
            with_clause: None,
        };
        Statement::ExportNamedDeclaration(self.builder.alloc(declaration))
    }

    /// `export const name = init;`
    pub fn export_const_stmt(&self, name: &str, init: Expression<'ast>) -> Statement<'ast> {
        let declarator = self.builder.variable_declarator(
            SPAN,
            VariableDeclarationKind::Const,
            self.builder.binding_pattern(
                self.builder
                    .binding_pattern_kind_binding_identifier(SPAN, self.builder.atom(name)),
                NONE,
                false,
            ),
            Some(init),
            false,
        );
        let declaration = self.builder.alloc_variable_declaration(
            SPAN,
            VariableDeclarationKind::Const,
            self.builder.vec1(declarator),
            false,
        );
        let declaration = ExportNamedDeclaration {
            span: SPAN,
            declaration: Some(oxc_ast::ast::Declaration::VariableDeclaration(declaration)),
            specifiers: self.builder.vec(),
            source: None,
            export_kind: ImportOrExportKind::Value,
            with_clause: None,
        };
        Statement::ExportNamedDeclaration(self.builder.alloc(declaration))
    }

    /// Move an expression out of its slot, leaving `null` behind. The
    /// caller always overwrites the slot afterwards.
    pub fn take_expression(&self, slot: &mut Expression<'ast>) -> Expression<'ast> {
        std::mem::replace(slot, self.builder.expression_null_literal(SPAN))
    }

    /// Move a statement out of its slot, leaving `;` behind.
    pub fn take_statement(&self, slot: &mut Statement<'ast>) -> Statement<'ast> {
        std::mem::replace(slot, self.builder.statement_empty(SPAN))
    }
}
