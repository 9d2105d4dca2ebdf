//! In-memory representation of one `__d(...)` registration
//!
//! A module is split into `ModuleMeta` (identity, dependency slots, tags,
//! per-module scratch) and the owned working AST. Plugins mutate only the
//! meta and AST of the module they are routed over.

pub mod graph;
pub mod ignore;

use std::collections::BTreeSet;

use oxc_span::CompactStr;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::bundle::compiler::ModuleAst;

pub type ModuleId = u32;

/// The seven factory parameters, by source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamRole {
    Global = 0,
    Require = 1,
    ImportDefault = 2,
    ImportAll = 3,
    Module = 4,
    Exports = 5,
    DependencyMap = 6,
}

/// Local names bound to the factory parameters.
///
/// The names are learned by position (they are minified), and the
/// alias-inlining editor may add further names for the same role.
#[derive(Debug, Clone, Default)]
pub struct FactoryBindings {
    slots: [SmallVec<[CompactStr; 1]>; 7],
}

impl FactoryBindings {
    pub fn from_params(names: [CompactStr; 7]) -> Self {
        let mut bindings = FactoryBindings::default();
        for (slot, name) in names.into_iter().enumerate() {
            bindings.slots[slot].push(name);
        }
        bindings
    }

    /// Whether `name` is bound to `role` in this factory.
    pub fn is(&self, role: ParamRole, name: &str) -> bool {
        self.slots[role as usize].iter().any(|n| n == name)
    }

    /// Resolve a name to the role it is bound to, if any.
    pub fn role_of(&self, name: &str) -> Option<ParamRole> {
        const ROLES: [ParamRole; 7] = [
            ParamRole::Global,
            ParamRole::Require,
            ParamRole::ImportDefault,
            ParamRole::ImportAll,
            ParamRole::Module,
            ParamRole::Exports,
            ParamRole::DependencyMap,
        ];
        ROLES.into_iter().find(|role| self.is(*role, name))
    }

    pub fn add_alias(&mut self, role: ParamRole, name: impl Into<CompactStr>) {
        let name = name.into();
        if !self.is(role, &name) {
            self.slots[role as usize].push(name);
        }
    }
}

/// An ESM import queued by a rewrite and materialized by the import finalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingImport {
    Default { local: String, source: String },
    Namespace { local: String, source: String },
    SideEffect { source: String },
}

impl PendingImport {
    pub fn source(&self) -> &str {
        match self {
            PendingImport::Default { source, .. }
            | PendingImport::Namespace { source, .. }
            | PendingImport::SideEffect { source } => source,
        }
    }
}

/// Metadata and per-module scratch for one registration.
#[derive(Debug)]
pub struct ModuleMeta {
    pub id: ModuleId,
    pub name: Option<String>,
    /// Dependency slots as they appear in the factory's `dependencyMap`.
    /// A `None` slot is a hole (unresolved dependency).
    pub dependencies: SmallVec<[Option<ModuleId>; 8]>,
    /// Source text of the whole `__d(...)` expression in the bundle.
    pub original_code: String,
    /// Byte offset of the registration in the bundle, for diagnostics.
    pub offset: u32,
    pub bindings: FactoryBindings,

    pub tags: BTreeSet<String>,
    pub tag_parameters: FxHashMap<String, Vec<String>>,
    pub is_npm_module: bool,
    pub npm_module_name: Option<String>,
    ignored: bool,
    pub ignore_reason: Option<String>,

    /// Imports queued by expression-position rewrites.
    pub pending_imports: Vec<PendingImport>,
    /// Local bindings known to refer to an NPM package (e.g. Babel helpers).
    pub helper_bindings: FxHashMap<String, String>,
}

impl ModuleMeta {
    pub fn new(
        id: ModuleId,
        name: Option<String>,
        dependencies: SmallVec<[Option<ModuleId>; 8]>,
        original_code: String,
        offset: u32,
        bindings: FactoryBindings,
    ) -> Self {
        ModuleMeta {
            id,
            name,
            dependencies,
            original_code,
            offset,
            bindings,
            tags: BTreeSet::new(),
            tag_parameters: FxHashMap::default(),
            is_npm_module: false,
            npm_module_name: None,
            ignored: false,
            ignore_reason: None,
            pending_imports: Vec::new(),
            helper_bindings: FxHashMap::default(),
        }
    }

    pub fn ignored(&self) -> bool {
        self.ignored
    }

    /// Mark the module ignored. Ignoring is monotone: there is no way to
    /// clear the flag once set.
    pub fn ignore(&mut self, reason: impl Into<String>) -> bool {
        if self.ignored {
            return false;
        }
        self.ignored = true;
        self.ignore_reason = Some(reason.into());
        true
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.contains(name)
    }

    /// Add a classification tag. Returns whether the tag was newly added.
    pub fn tag(&mut self, name: impl Into<String>) -> bool {
        self.tags.insert(name.into())
    }

    pub fn tag_with_params(&mut self, name: impl Into<String>, params: Vec<String>) -> bool {
        let name = name.into();
        let added = self.tags.insert(name.clone());
        if added {
            self.tag_parameters.insert(name, params);
        }
        added
    }

    /// Classify the module as a bundled third-party package. NPM modules are
    /// not re-emitted, so this also ignores the module.
    pub fn tag_as_npm_module(&mut self, package: impl Into<String>) -> bool {
        if self.is_npm_module {
            return false;
        }
        let package = package.into();
        self.is_npm_module = true;
        self.npm_module_name = Some(package.clone());
        self.ignore(format!("npm module {package}"));
        true
    }

    pub fn dependency_at(&self, slot: usize) -> Option<ModuleId> {
        self.dependencies.get(slot).copied().flatten()
    }
}

/// One registration: metadata plus the mutable working AST.
pub struct Module {
    pub meta: ModuleMeta,
    pub ast: ModuleAst,
}

impl Module {
    pub fn new(meta: ModuleMeta, ast: ModuleAst) -> Self {
        Module { meta, ast }
    }

    pub fn id(&self) -> ModuleId {
        self.meta.id
    }
}
