//! Module graph
//!
//! Sparse mapping from `moduleId` to `Module`, plus a petgraph `DiGraph`
//! mirror used for reverse-dependent queries, entry-closure reachability
//! and the verbose dependency summary. The graph is frozen once built;
//! only per-module fields mutate afterwards.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rustc_hash::{FxHashMap, FxHashSet};

use super::{Module, ModuleId, ModuleMeta};

pub struct ModuleGraph {
    modules: BTreeMap<ModuleId, Module>,
    graph: DiGraph<ModuleId, usize>,
    nodes: FxHashMap<ModuleId, NodeIndex>,
}

impl ModuleGraph {
    /// Build the graph from scanned modules. Edges run from a module to
    /// each dependency present in the bundle; the edge weight is the
    /// dependency slot index. Missing dependencies get no edge and are
    /// diagnosed later by the entry closure.
    pub fn from_modules(modules: Vec<Module>) -> Self {
        let mut map = BTreeMap::new();
        for module in modules {
            map.insert(module.id(), module);
        }

        let mut graph = DiGraph::new();
        let mut nodes = FxHashMap::default();
        for id in map.keys() {
            nodes.insert(*id, graph.add_node(*id));
        }
        for (id, module) in &map {
            for (slot, dep) in module.meta.dependencies.iter().enumerate() {
                if let Some(dep) = dep {
                    if let Some(&to) = nodes.get(dep) {
                        graph.add_edge(nodes[id], to, slot);
                    }
                }
            }
        }

        ModuleGraph { modules: map, graph, nodes }
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn contains(&self, id: ModuleId) -> bool {
        self.modules.contains_key(&id)
    }

    pub fn get(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(&id)
    }

    pub fn get_mut(&mut self, id: ModuleId) -> Option<&mut Module> {
        self.modules.get_mut(&id)
    }

    /// Module ids in ascending order.
    pub fn ids(&self) -> Vec<ModuleId> {
        self.modules.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Module> {
        self.modules.values_mut()
    }

    /// Modules that depend on `id`.
    pub fn reverse_dependents(&self, id: ModuleId) -> Vec<ModuleId> {
        let Some(&node) = self.nodes.get(&id) else {
            return Vec::new();
        };
        let mut dependents: Vec<ModuleId> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .map(|n| self.graph[n])
            .collect();
        dependents.sort_unstable();
        dependents.dedup();
        dependents
    }

    /// Whether `id` lists `dep` in its dependency slots.
    pub fn depends_on(&self, id: ModuleId, dep: ModuleId) -> bool {
        self.modules
            .get(&id)
            .is_some_and(|m| m.meta.dependencies.iter().any(|d| *d == Some(dep)))
    }

    /// Drop every module not in `keep`. Used by the entry closure.
    pub fn retain(&mut self, keep: &FxHashSet<ModuleId>) {
        self.modules.retain(|id, _| keep.contains(id));
        self.graph.retain_nodes(|graph, node| keep.contains(&graph[node]));
        self.nodes = self
            .graph
            .node_indices()
            .map(|node| (self.graph[node], node))
            .collect();
    }

    /// Snapshot of sibling metadata handed to plugins. Plugins hold module
    /// ids, never references into the graph.
    pub fn sibling_view(&self) -> GraphView {
        GraphView {
            infos: self
                .modules
                .iter()
                .map(|(id, m)| (*id, SiblingInfo::from_meta(&m.meta)))
                .collect(),
        }
    }
}

/// Read-only metadata about one sibling module.
#[derive(Debug, Clone)]
pub struct SiblingInfo {
    pub is_npm_module: bool,
    pub npm_module_name: Option<String>,
    pub ignored: bool,
    pub tags: BTreeSet<String>,
}

impl SiblingInfo {
    fn from_meta(meta: &ModuleMeta) -> Self {
        SiblingInfo {
            is_npm_module: meta.is_npm_module,
            npm_module_name: meta.npm_module_name.clone(),
            ignored: meta.ignored(),
            tags: meta.tags.clone(),
        }
    }
}

/// Immutable view of the graph's metadata, rebuilt per pass and refreshed
/// after each routed module so later modules observe earlier tags.
#[derive(Debug, Default)]
pub struct GraphView {
    infos: FxHashMap<ModuleId, SiblingInfo>,
}

impl GraphView {
    pub fn info(&self, id: ModuleId) -> Option<&SiblingInfo> {
        self.infos.get(&id)
    }

    pub fn refresh(&mut self, meta: &ModuleMeta) {
        self.infos.insert(meta.id, SiblingInfo::from_meta(meta));
    }

    /// The import source a dependency resolves to: the NPM package name when
    /// the dependency was fingerprinted, a relative module path otherwise.
    pub fn import_source(&self, id: ModuleId) -> String {
        match self.info(id) {
            Some(info) if info.is_npm_module => info
                .npm_module_name
                .clone()
                .unwrap_or_else(|| format!("./{id}")),
            _ => format!("./{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::compiler::ModuleAst;
    use crate::module::FactoryBindings;
    use smallvec::SmallVec;

    fn module(id: ModuleId, deps: &[Option<ModuleId>]) -> Module {
        let meta = ModuleMeta::new(
            id,
            None,
            SmallVec::from_slice(deps),
            String::new(),
            0,
            FactoryBindings::default(),
        );
        Module::new(meta, ModuleAst::empty())
    }

    fn graph(specs: &[(ModuleId, &[Option<ModuleId>])]) -> ModuleGraph {
        ModuleGraph::from_modules(specs.iter().map(|(id, deps)| module(*id, deps)).collect())
    }

    #[test]
    fn reverse_dependents_follow_edges() {
        let g = graph(&[(1, &[Some(2)]), (2, &[Some(3)]), (3, &[])]);
        assert_eq!(g.reverse_dependents(3), vec![2]);
        assert_eq!(g.reverse_dependents(2), vec![1]);
        assert!(g.reverse_dependents(1).is_empty());
    }

    #[test]
    fn holes_and_missing_dependencies_get_no_edge() {
        let g = graph(&[(1, &[None, Some(99)])]);
        assert_eq!(g.len(), 1);
        assert!(g.reverse_dependents(99).is_empty());
    }

    #[test]
    fn retain_drops_modules_and_edges() {
        let mut g = graph(&[(1, &[Some(2)]), (2, &[]), (3, &[Some(2)])]);
        let keep: FxHashSet<ModuleId> = [1, 2].into_iter().collect();
        g.retain(&keep);
        assert_eq!(g.ids(), vec![1, 2]);
        assert_eq!(g.reverse_dependents(2), vec![1]);
    }

    #[test]
    fn view_resolves_npm_and_internal_sources() {
        let mut g = graph(&[(1, &[]), (2, &[])]);
        g.get_mut(2).unwrap().meta.tag_as_npm_module("lodash");
        let view = g.sibling_view();
        assert_eq!(view.import_source(2), "lodash");
        assert_eq!(view.import_source(1), "./1");
    }
}
