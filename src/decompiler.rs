//! Main decompiler module
//!
//! Orchestrates the whole run: scan the bundle for registrations, build
//! the module graph, replay the cache, tag, prune, rewrite, and print each
//! surviving module back to source. All stages run to completion before
//! the next begins.

use crate::bundle::{build_modules, scan_bundle};
use crate::cache::{checksum_of, CacheDocument};
use crate::error::{Error, Result};
use crate::module::graph::ModuleGraph;
use crate::module::ignore::{propagate_ignores, restrict_to_entry};
use crate::module::{Module, ModuleId};
use crate::plugins::{built_in_plugins, Pass, Plugin};
use crate::router::{PluginTimings, Router};

/// Options controlling one decompilation run.
#[derive(Debug, Clone, Default)]
pub struct DecompileOptions {
    /// Restrict output to this module and its transitive dependencies.
    pub entry: Option<ModuleId>,
    /// Collect and report per-plugin wall time.
    pub performance: bool,
    /// Produce the final module dependency summary.
    pub verbose: bool,
    /// Emit modules even when they are tagged ignored.
    pub decompile_ignored: bool,
    /// Trust cached ignore/NPM flags and skip re-parsing their bodies.
    pub aggressive_cache: bool,
}

/// The bundle text as handed to the decompiler: the main bundle plus the
/// optional concatenation of per-module files from an unbundled app.
#[derive(Debug, Clone)]
pub struct BundleInput {
    pub main: String,
    pub extra: Option<String>,
}

impl BundleInput {
    pub fn new(main: String, extra: Option<String>) -> Self {
        BundleInput { main, extra }
    }

    pub fn full_text(&self) -> String {
        match &self.extra {
            Some(extra) => format!("{}\n{extra}", self.main),
            None => self.main.clone(),
        }
    }

    pub fn checksum(&self) -> String {
        checksum_of(&self.main)
    }

    pub fn input_checksum(&self) -> Option<String> {
        self.extra.as_deref().map(checksum_of)
    }
}

/// One emitted module.
#[derive(Debug, Clone)]
pub struct OutputModule {
    pub id: ModuleId,
    pub name: Option<String>,
    pub code: String,
}

/// Everything a run produces; writing files and the cache to disk is the
/// caller's job.
#[derive(Debug)]
pub struct DecompileResult {
    pub files: Vec<OutputModule>,
    pub cache: CacheDocument,
    pub timings: Vec<(Pass, PluginTimings)>,
    pub summary: Vec<String>,
}

/// Main decompiler struct
pub struct Decompiler {
    options: DecompileOptions,
    plugins: Vec<Plugin>,
}

impl Decompiler {
    pub fn new(options: DecompileOptions) -> Self {
        Decompiler { options, plugins: built_in_plugins() }
    }

    /// Decompile a bundle into per-module sources.
    ///
    /// `cache` must already be checksum-verified by the caller; its tags
    /// are replayed before the tagger pass runs.
    pub fn decompile(
        &self,
        bundle: &BundleInput,
        cache: Option<&CacheDocument>,
    ) -> Result<DecompileResult> {
        let text = bundle.full_text();

        let (registrations, malformed) = scan_bundle(&text)?;
        for error in &malformed {
            log::warn!("{error}");
        }
        if registrations.is_empty() {
            return Err(Error::NoModulesFound);
        }
        log::info!("found {} module registrations", registrations.len());

        let stubbed = match (self.options.aggressive_cache, cache) {
            (true, Some(cache)) => cache.stub_ids(),
            _ => Default::default(),
        };
        let modules = build_modules(registrations, &stubbed)?;
        let mut graph = ModuleGraph::from_modules(modules);

        if let Some(cache) = cache {
            cache.apply(&mut graph);
        }

        let router = Router::new(&self.plugins);
        let mut timings = Vec::new();

        // Tagger pass. The sibling view is refreshed after each module,
        // and the whole sweep repeats until no module's tag state changes:
        // a dependency-aware tagger whose dependency has a higher id only
        // sees that dependency's tags on the next sweep. Tag state is
        // monotone (tags accumulate, ignore and NPM flags are set-once),
        // so the sweep terminates.
        let mut pass_timings = PluginTimings::default();
        let mut view = graph.sibling_view();
        loop {
            let mut sweep_changed = false;
            for id in graph.ids() {
                let module = graph.get_mut(id).expect("ids came from the graph");
                sweep_changed |= router.route_tagger_pass(module, &view, &mut pass_timings)?;
                view.refresh(&module.meta);
            }
            if !sweep_changed {
                break;
            }
        }
        timings.push((Pass::Tagger, pass_timings));

        // Prune: entry closure first, then transitive ignores.
        if let Some(entry) = self.options.entry {
            restrict_to_entry(&mut graph, entry, self.options.aggressive_cache)?;
        }
        let pruned = propagate_ignores(&mut graph);
        if pruned > 0 {
            log::info!("{pruned} modules ignored transitively");
        }

        // Rewrite passes over every module that will be emitted.
        for pass in [Pass::Editor, Pass::Decompiler] {
            let mut pass_timings = PluginTimings::default();
            let view = graph.sibling_view();
            for id in graph.ids() {
                let module = graph.get_mut(id).expect("ids came from the graph");
                if self.should_emit(module) {
                    router.route_rewrite_pass(pass, module, &view, &mut pass_timings)?;
                }
            }
            timings.push((pass, pass_timings));
        }

        let files: Vec<OutputModule> = graph
            .iter()
            .filter(|module| self.should_emit(module))
            .map(|module| OutputModule {
                id: module.meta.id,
                name: module.meta.name.clone(),
                code: module.ast.print(),
            })
            .collect();

        let cache = CacheDocument::capture(&graph, bundle.checksum(), bundle.input_checksum());
        let summary = if self.options.verbose { dependency_summary(&graph) } else { Vec::new() };

        log::info!("emitting {} of {} modules", files.len(), graph.len());
        Ok(DecompileResult { files, cache, timings, summary })
    }

    fn should_emit(&self, module: &Module) -> bool {
        !module.meta.ignored() || self.options.decompile_ignored
    }
}

fn dependency_summary(graph: &ModuleGraph) -> Vec<String> {
    graph
        .iter()
        .map(|module| {
            let meta = &module.meta;
            let deps: Vec<String> = meta
                .dependencies
                .iter()
                .map(|dep| dep.map_or_else(|| "-".to_string(), |id| id.to_string()))
                .collect();
            let mut line = format!("module {} -> [{}]", meta.id, deps.join(", "));
            if let Some(name) = &meta.name {
                line.push_str(&format!(" ({name})"));
            }
            if meta.is_npm_module {
                line.push_str(&format!(
                    " npm:{}",
                    meta.npm_module_name.as_deref().unwrap_or("?")
                ));
            } else if meta.ignored() {
                line.push_str(" ignored");
            }
            if !meta.tags.is_empty() {
                let tags: Vec<&str> = meta.tags.iter().map(String::as_str).collect();
                line.push_str(&format!(" tags:[{}]", tags.join(", ")));
            }
            line
        })
        .collect()
}
