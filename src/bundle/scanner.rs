//! `__d(...)` registration scanner
//!
//! Walks the bundle's top-level AST looking for `CallExpression`s whose
//! callee is the identifier `__d`. Each match is recorded and the subtree
//! skipped: well-formed bundles never nest registrations, and skipping
//! avoids re-walking every factory body.

use oxc_ast::ast::{
    ArrayExpressionElement, BindingPatternKind, CallExpression, Expression, ObjectPropertyKind,
    PropertyKey,
};
use oxc_ast_visit::{walk, Visit};
use oxc_span::{CompactStr, SourceType};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use crate::bundle::compiler::ModuleAst;
use crate::error::{Error, Result};
use crate::module::{FactoryBindings, Module, ModuleId, ModuleMeta};

/// One scanned `__d(...)` registration, before the factory body is parsed.
#[derive(Debug)]
pub struct Registration {
    pub id: ModuleId,
    pub name: Option<String>,
    pub dependencies: SmallVec<[Option<ModuleId>; 8]>,
    /// Source text of the whole `__d(...)` expression.
    pub original_code: String,
    /// Source text between the factory body's braces.
    pub body_text: String,
    /// Byte offset of the registration in the bundle.
    pub offset: u32,
    /// The seven factory parameter names, by position.
    pub params: [CompactStr; 7],
}

/// Scan the bundle text for registrations.
///
/// Returns the well-formed registrations plus one `MalformedRegistration`
/// error per `__d` call whose shape did not match; the driver logs those
/// and keeps going.
pub fn scan_bundle(bundle: &str) -> Result<(Vec<Registration>, Vec<Error>)> {
    let ast = ModuleAst::parse(bundle, SourceType::cjs())?;
    let (found, errors) = ast.with_program(|program| {
        let mut scanner = RegistrationScanner {
            source: ast.source(),
            found: Vec::new(),
            errors: Vec::new(),
        };
        scanner.visit_program(program);
        (scanner.found, scanner.errors)
    });
    Ok((found, errors))
}

/// Turn registrations into graph modules by parsing each factory body.
///
/// Ids in `stubbed` (aggressively cached ignored modules) skip the body
/// parse and are registered with an empty program so dependency slots still
/// resolve.
pub fn build_modules(
    registrations: Vec<Registration>,
    stubbed: &FxHashSet<ModuleId>,
) -> Result<Vec<Module>> {
    let mut modules = Vec::with_capacity(registrations.len());
    for registration in registrations {
        let Registration { id, name, dependencies, original_code, body_text, offset, params } =
            registration;
        let ast = if stubbed.contains(&id) {
            log::debug!("module {id}: body stubbed from aggressive cache");
            ModuleAst::empty()
        } else {
            ModuleAst::parse(body_text, SourceType::cjs())?
        };
        let meta = ModuleMeta::new(
            id,
            name,
            dependencies,
            original_code,
            offset,
            FactoryBindings::from_params(params),
        );
        modules.push(Module::new(meta, ast));
    }
    Ok(modules)
}

struct RegistrationScanner<'s> {
    source: &'s str,
    found: Vec<Registration>,
    errors: Vec<Error>,
}

impl<'s> RegistrationScanner<'s> {
    fn handle_registration(&mut self, call: &CallExpression<'_>) {
        let offset = call.span.start;
        match self.extract(call) {
            Ok(registration) => self.found.push(registration),
            Err(message) => self.errors.push(Error::MalformedRegistration { offset, message }),
        }
    }

    fn extract(&self, call: &CallExpression<'_>) -> std::result::Result<Registration, String> {
        if call.arguments.len() < 2 {
            return Err(format!("expected at least 2 arguments, got {}", call.arguments.len()));
        }

        let factory = call.arguments[0]
            .as_expression()
            .ok_or("factory argument is not an expression")?;
        let Expression::FunctionExpression(factory) = factory else {
            return Err("factory argument is not a function expression".to_string());
        };

        if factory.params.items.len() != 7 {
            return Err(format!(
                "factory has {} parameters, expected 7",
                factory.params.items.len()
            ));
        }
        let mut params: [CompactStr; 7] = std::array::from_fn(|_| CompactStr::new(""));
        for (slot, param) in factory.params.items.iter().enumerate() {
            let BindingPatternKind::BindingIdentifier(ident) = &param.pattern.kind else {
                return Err(format!("factory parameter {slot} is not a plain identifier"));
            };
            params[slot] = CompactStr::new(ident.name.as_str());
        }

        let body = factory.body.as_ref().ok_or("factory has no body")?;
        let body_text = self
            .source
            .get(body.span.start as usize + 1..body.span.end as usize - 1)
            .ok_or("factory body span is out of bounds")?
            .to_string();

        let id = numeric_id(
            call.arguments[1]
                .as_expression()
                .ok_or("moduleId argument is not an expression")?,
        )
        .ok_or("moduleId is not a non-negative integer literal")?;

        let dependencies = match call.arguments.get(2).and_then(|a| a.as_expression()) {
            None => SmallVec::new(),
            Some(expr) => dependency_slots(expr)?,
        };

        let name = match call.arguments.get(3).and_then(|a| a.as_expression()) {
            Some(Expression::StringLiteral(s)) => Some(s.value.to_string()),
            _ => None,
        };

        let original_code = self
            .source
            .get(call.span.start as usize..call.span.end as usize)
            .ok_or("registration span is out of bounds")?
            .to_string();

        Ok(Registration {
            id,
            name,
            dependencies,
            original_code,
            body_text,
            offset: call.span.start,
            params,
        })
    }
}

impl<'a> Visit<'a> for RegistrationScanner<'_> {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Expression::Identifier(callee) = &call.callee {
            if callee.name == "__d" {
                self.handle_registration(call);
                // Skip the factory subtree: registrations never nest.
                return;
            }
        }
        walk::walk_call_expression(self, call);
    }
}

fn numeric_id(expr: &Expression<'_>) -> Option<ModuleId> {
    let Expression::NumericLiteral(n) = expr else {
        return None;
    };
    if n.value >= 0.0 && n.value.fract() == 0.0 && n.value <= f64::from(u32::MAX) {
        Some(n.value as ModuleId)
    } else {
        None
    }
}

/// Dependency maps come as an array of ids (holes allowed) or, for bundles
/// with async imports, as an object with numeric keys and a `paths` entry.
fn dependency_slots(
    expr: &Expression<'_>,
) -> std::result::Result<SmallVec<[Option<ModuleId>; 8]>, String> {
    match expr {
        Expression::ArrayExpression(array) => {
            let mut slots = SmallVec::with_capacity(array.elements.len());
            for element in &array.elements {
                match element {
                    ArrayExpressionElement::Elision(_) => slots.push(None),
                    _ => match element.as_expression() {
                        Some(Expression::NullLiteral(_)) => slots.push(None),
                        Some(expr) => slots.push(Some(
                            numeric_id(expr).ok_or("dependency id is not an integer literal")?,
                        )),
                        None => return Err("unexpected spread in dependency map".to_string()),
                    },
                }
            }
            Ok(slots)
        }
        Expression::ObjectExpression(object) => {
            let mut indexed: Vec<(usize, ModuleId)> = Vec::new();
            for property in &object.properties {
                let ObjectPropertyKind::ObjectProperty(property) = property else {
                    return Err("unexpected spread in dependency map object".to_string());
                };
                let slot = match &property.key {
                    PropertyKey::NumericLiteral(n) => n.value as usize,
                    PropertyKey::StringLiteral(s) => match s.value.parse::<usize>() {
                        Ok(slot) => slot,
                        Err(_) => continue,
                    },
                    // `paths` carries async chunk URLs; positional lookups
                    // never reach it.
                    PropertyKey::StaticIdentifier(_) => continue,
                    _ => return Err("unsupported dependency map key".to_string()),
                };
                let id = numeric_id(property.value.without_parentheses())
                    .ok_or("dependency id is not an integer literal")?;
                indexed.push((slot, id));
            }
            let len = indexed.iter().map(|(slot, _)| slot + 1).max().unwrap_or(0);
            let mut slots = SmallVec::from_elem(None, len);
            for (slot, id) in indexed {
                slots[slot] = Some(id);
            }
            Ok(slots)
        }
        _ => Err("dependency map is neither an array nor an object".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_a_minimal_registration() {
        let bundle = "__d(function(g,r,i,a,m,e,d){m.exports=42;},0,[]);";
        let (found, errors) = scan_bundle(bundle).unwrap();
        assert!(errors.is_empty());
        assert_eq!(found.len(), 1);
        let reg = &found[0];
        assert_eq!(reg.id, 0);
        assert!(reg.dependencies.is_empty());
        assert_eq!(reg.body_text, "m.exports=42;");
        assert_eq!(reg.original_code, "__d(function(g,r,i,a,m,e,d){m.exports=42;},0,[])");
        assert_eq!(reg.params[4], "m");
    }

    #[test]
    fn scans_name_and_dependency_holes() {
        let bundle = "__d(function(g,r,i,a,m,e,d){},3,[1,,2],\"src/app\");";
        let (found, _) = scan_bundle(bundle).unwrap();
        let reg = &found[0];
        assert_eq!(reg.name.as_deref(), Some("src/app"));
        assert_eq!(reg.dependencies.as_slice(), &[Some(1), None, Some(2)]);
    }

    #[test]
    fn scans_object_dependency_map() {
        let bundle =
            "__d(function(g,r,i,a,m,e,d){},9,{0:4,1:5,paths:{5:\"/chunk.bundle\"}});";
        let (found, errors) = scan_bundle(bundle).unwrap();
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(found[0].dependencies.as_slice(), &[Some(4), Some(5)]);
    }

    #[test]
    fn malformed_factory_is_reported_not_fatal() {
        let bundle = "__d(function(g,r){},1,[]);\n__d(function(g,r,i,a,m,e,d){},2,[]);";
        let (found, errors) = scan_bundle(bundle).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 2);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], Error::MalformedRegistration { offset: 0, .. }));
    }

    #[test]
    fn non_registration_calls_are_walked_through() {
        // __d nested inside other calls is still found.
        let bundle = "(function(){__d(function(g,r,i,a,m,e,d){},5,[]);})();";
        let (found, _) = scan_bundle(bundle).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 5);
    }

    #[test]
    fn stubbed_modules_skip_body_parse() {
        let bundle = "__d(function(g,r,i,a,m,e,d){m.exports=1;},0,[]);";
        let (found, _) = scan_bundle(bundle).unwrap();
        let stubbed: FxHashSet<ModuleId> = [0].into_iter().collect();
        let modules = build_modules(found, &stubbed).unwrap();
        assert_eq!(modules[0].ast.print(), "");
    }
}
