//! Transitive-ignore propagation and entry-closure restriction

use rustc_hash::FxHashSet;

use crate::error::{Error, Result};
use crate::module::graph::ModuleGraph;
use crate::module::ModuleId;

/// The pruning predicate, applied repeatedly until a pass marks nothing.
///
/// A non-ignored, non-NPM module is prunable when it has at least one
/// reverse dependent and every reverse dependent is either already ignored
/// or is itself one of the module's own dependencies. The second arm prunes
/// mutually recursive pairs together with their last live consumer.
pub fn is_prunable(graph: &ModuleGraph, id: ModuleId) -> bool {
    let Some(module) = graph.get(id) else {
        return false;
    };
    if module.meta.ignored() || module.meta.is_npm_module {
        return false;
    }
    let dependents = graph.reverse_dependents(id);
    if dependents.is_empty() {
        return false;
    }
    dependents.iter().all(|&dep| {
        graph.get(dep).is_none_or(|m| m.meta.ignored()) || graph.depends_on(id, dep)
    })
}

/// Mark prunable modules ignored until fixed point. Returns how many
/// modules were newly ignored.
pub fn propagate_ignores(graph: &mut ModuleGraph) -> usize {
    let ids = graph.ids();
    let mut total = 0;
    loop {
        let mut marked = 0;
        for &id in &ids {
            if is_prunable(graph, id) {
                let module = graph.get_mut(id).expect("id came from the graph");
                if module.meta.ignore("all consumers ignored") {
                    log::debug!("module {id} ignored transitively");
                    marked += 1;
                }
            }
        }
        total += marked;
        if marked == 0 {
            return total;
        }
    }
}

/// Restrict the graph to `entry` and its transitive dependencies.
///
/// In the default mode a dependency slot that points outside the graph is a
/// hard error. In aggressive cache mode bodies of cached-ignored modules
/// were never parsed, so a missing dependency is skipped instead; this
/// trades correctness for speed and is documented on the CLI flag.
pub fn restrict_to_entry(graph: &mut ModuleGraph, entry: ModuleId, aggressive: bool) -> Result<()> {
    if !graph.contains(entry) {
        return Err(Error::MissingEntry { entry });
    }

    let mut reachable = FxHashSet::default();
    let mut worklist = vec![entry];
    while let Some(id) = worklist.pop() {
        if !reachable.insert(id) {
            continue;
        }
        let module = graph.get(id).expect("worklist ids are in the graph");
        for dep in module.meta.dependencies.clone() {
            let Some(dep) = dep else { continue };
            if graph.contains(dep) {
                if !reachable.contains(&dep) {
                    worklist.push(dep);
                }
            } else if aggressive {
                log::debug!("module {id}: dependency {dep} missing, skipped (aggressive cache)");
            } else {
                return Err(Error::MissingDependency { module: id, dependency: dep });
            }
        }
    }

    let before = graph.len();
    graph.retain(&reachable);
    log::info!(
        "entry closure from {entry}: kept {} of {before} modules",
        graph.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::compiler::ModuleAst;
    use crate::module::{FactoryBindings, Module, ModuleMeta};
    use smallvec::SmallVec;

    fn module(id: ModuleId, deps: &[ModuleId]) -> Module {
        let meta = ModuleMeta::new(
            id,
            None,
            deps.iter().map(|d| Some(*d)).collect::<SmallVec<_>>(),
            String::new(),
            0,
            FactoryBindings::default(),
        );
        Module::new(meta, ModuleAst::empty())
    }

    fn graph(specs: &[(ModuleId, &[ModuleId])]) -> ModuleGraph {
        ModuleGraph::from_modules(specs.iter().map(|(id, deps)| module(*id, deps)).collect())
    }

    #[test]
    fn dependency_of_ignored_module_is_pruned() {
        let mut g = graph(&[(1, &[2]), (2, &[])]);
        g.get_mut(1).unwrap().meta.ignore("npm");
        assert_eq!(propagate_ignores(&mut g), 1);
        assert!(g.get(2).unwrap().meta.ignored());
    }

    #[test]
    fn propagation_cascades_to_fixed_point() {
        let mut g = graph(&[(1, &[2]), (2, &[3]), (3, &[])]);
        g.get_mut(1).unwrap().meta.ignore("npm");
        assert_eq!(propagate_ignores(&mut g), 2);
        assert!(g.get(3).unwrap().meta.ignored());
    }

    #[test]
    fn live_consumer_keeps_module_alive() {
        let mut g = graph(&[(1, &[3]), (2, &[3]), (3, &[])]);
        g.get_mut(1).unwrap().meta.ignore("npm");
        assert_eq!(propagate_ignores(&mut g), 0);
        assert!(!g.get(3).unwrap().meta.ignored());
    }

    #[test]
    fn module_with_no_consumers_is_kept() {
        let mut g = graph(&[(1, &[])]);
        assert_eq!(propagate_ignores(&mut g), 0);
        assert!(!g.get(1).unwrap().meta.ignored());
    }

    #[test]
    fn mutual_recursion_counts_as_prunable() {
        // 2 and 3 consume each other; 1 is 2's only outside consumer.
        let mut g = graph(&[(1, &[2]), (2, &[3]), (3, &[2])]);
        g.get_mut(1).unwrap().meta.ignore("npm");
        propagate_ignores(&mut g);
        assert!(g.get(2).unwrap().meta.ignored());
        assert!(g.get(3).unwrap().meta.ignored());
    }

    #[test]
    fn npm_modules_are_never_re_marked() {
        let mut g = graph(&[(1, &[2]), (2, &[])]);
        g.get_mut(1).unwrap().meta.ignore("npm");
        g.get_mut(2).unwrap().meta.tag_as_npm_module("lodash");
        assert_eq!(propagate_ignores(&mut g), 0);
    }

    #[test]
    fn entry_closure_keeps_reachable_modules() {
        let mut g = graph(&[(1, &[2]), (2, &[3]), (3, &[])]);
        restrict_to_entry(&mut g, 1, false).unwrap();
        assert_eq!(g.ids(), vec![1, 2, 3]);

        let mut g = graph(&[(1, &[2]), (2, &[3]), (3, &[])]);
        restrict_to_entry(&mut g, 2, false).unwrap();
        assert_eq!(g.ids(), vec![2, 3]);
    }

    #[test]
    fn missing_dependency_is_fatal_unless_aggressive() {
        let mut g = graph(&[(1, &[99])]);
        assert!(matches!(
            restrict_to_entry(&mut g, 1, false),
            Err(Error::MissingDependency { module: 1, dependency: 99 })
        ));

        let mut g = graph(&[(1, &[99])]);
        restrict_to_entry(&mut g, 1, true).unwrap();
        assert_eq!(g.ids(), vec![1]);
    }

    #[test]
    fn missing_entry_is_fatal() {
        let mut g = graph(&[(1, &[])]);
        assert!(matches!(
            restrict_to_entry(&mut g, 7, false),
            Err(Error::MissingEntry { entry: 7 })
        ));
    }
}
