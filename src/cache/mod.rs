//! Checksum-guarded tagging cache
//!
//! Tagging an unchanged bundle twice is wasted work, so the per-module
//! tagging outcome is persisted next to the output, keyed by a SHA-256
//! digest of the bundle text. A digest mismatch discards the cache. In
//! aggressive mode, modules cached as `ignored && !isNpmModule` skip the
//! factory-body parse entirely; they are still registered in the graph so
//! dependency slots resolve. Aggressive mode trades correctness for speed:
//! skipped bodies can hide dependency errors a full run would surface.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::module::graph::ModuleGraph;
use crate::module::ModuleId;

/// SHA-256 of `text`, hex-encoded.
pub fn checksum_of(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// `<out>/<entry-or-null>.cache`
pub fn cache_file_path(out: &Path, entry: Option<ModuleId>) -> PathBuf {
    let stem = entry.map_or_else(|| "null".to_string(), |id| id.to_string());
    out.join(format!("{stem}.cache"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedModule {
    pub module_id: ModuleId,
    pub original_code: String,
    pub tags: Vec<String>,
    pub is_npm_module: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub npm_module_name: Option<String>,
    pub ignored: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheDocument {
    pub checksum: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_checksum: Option<String>,
    pub modules: Vec<CachedModule>,
}

impl CacheDocument {
    /// Snapshot the graph's tagging state.
    pub fn capture(graph: &ModuleGraph, checksum: String, input_checksum: Option<String>) -> Self {
        CacheDocument {
            checksum,
            input_checksum,
            modules: graph
                .iter()
                .map(|module| CachedModule {
                    module_id: module.meta.id,
                    original_code: module.meta.original_code.clone(),
                    tags: module.meta.tags.iter().cloned().collect(),
                    is_npm_module: module.meta.is_npm_module,
                    npm_module_name: module.meta.npm_module_name.clone(),
                    ignored: module.meta.ignored(),
                })
                .collect(),
        }
    }

    /// Check the recorded digests against the bundle that was just read.
    pub fn verify(&self, checksum: &str, input_checksum: Option<&str>) -> Result<()> {
        if self.checksum != checksum {
            return Err(Error::CacheChecksumMismatch {
                expected: self.checksum.clone(),
                got: checksum.to_string(),
            });
        }
        if self.input_checksum.as_deref() != input_checksum {
            return Err(Error::CacheChecksumMismatch {
                expected: self.input_checksum.clone().unwrap_or_default(),
                got: input_checksum.unwrap_or_default().to_string(),
            });
        }
        Ok(())
    }

    /// Replay cached tagging onto freshly scanned modules.
    pub fn apply(&self, graph: &mut ModuleGraph) {
        for cached in &self.modules {
            let Some(module) = graph.get_mut(cached.module_id) else {
                continue;
            };
            for tag in &cached.tags {
                module.meta.tag(tag.clone());
            }
            if cached.is_npm_module {
                if let Some(package) = &cached.npm_module_name {
                    module.meta.tag_as_npm_module(package.clone());
                }
            }
            if cached.ignored {
                module.meta.ignore("cached as ignored");
            }
        }
    }

    /// Ids whose factory bodies may be stubbed out in aggressive mode.
    pub fn stub_ids(&self) -> FxHashSet<ModuleId> {
        self.modules
            .iter()
            .filter(|m| m.ignored && !m.is_npm_module)
            .map(|m| m.module_id)
            .collect()
    }

    /// Load a cache document; a missing file is `None`, a corrupt file is
    /// discarded with a warning.
    pub fn load(path: &Path) -> Result<Option<CacheDocument>> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        match serde_json::from_str(&text) {
            Ok(document) => Ok(Some(document)),
            Err(err) => {
                log::warn!("discarding unreadable cache {}: {err}", path.display());
                Ok(None)
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::compiler::ModuleAst;
    use crate::module::{FactoryBindings, Module, ModuleMeta};
    use smallvec::SmallVec;

    fn plain_module(id: ModuleId) -> Module {
        Module::new(
            ModuleMeta::new(id, None, SmallVec::new(), String::new(), 0, FactoryBindings::default()),
            ModuleAst::empty(),
        )
    }

    fn graph() -> ModuleGraph {
        let mut meta =
            ModuleMeta::new(1, None, SmallVec::new(), "__d(...)".to_string(), 0, FactoryBindings::default());
        meta.tag("__esModule");
        meta.tag_as_npm_module("lodash");
        let npm = Module::new(meta, ModuleAst::empty());
        ModuleGraph::from_modules(vec![npm, plain_module(2)])
    }

    #[test]
    fn capture_and_apply_round_trip() {
        let captured = CacheDocument::capture(&graph(), checksum_of("bundle"), None);
        let json = serde_json::to_string(&captured).unwrap();
        let reloaded: CacheDocument = serde_json::from_str(&json).unwrap();

        // A fresh scan carries no tags; applying the cache replays them.
        let mut fresh = ModuleGraph::from_modules(vec![plain_module(1), plain_module(2)]);
        reloaded.apply(&mut fresh);
        let npm = fresh.get(1).unwrap();
        assert!(npm.meta.is_npm_module);
        assert!(npm.meta.has_tag("__esModule"));
        assert_eq!(npm.meta.npm_module_name.as_deref(), Some("lodash"));
        assert!(npm.meta.ignored());
        assert!(!fresh.get(2).unwrap().meta.ignored());
    }

    #[test]
    fn document_uses_the_specified_field_names() {
        let captured = CacheDocument::capture(&graph(), "abc".to_string(), Some("def".to_string()));
        let json = serde_json::to_string(&captured).unwrap();
        assert!(json.contains("\"checksum\":\"abc\""));
        assert!(json.contains("\"inputChecksum\":\"def\""));
        assert!(json.contains("\"moduleId\":1"));
        assert!(json.contains("\"isNpmModule\":true"));
        assert!(json.contains("\"npmModuleName\":\"lodash\""));
    }

    #[test]
    fn verify_rejects_a_stale_digest() {
        let captured = CacheDocument::capture(&graph(), checksum_of("bundle"), None);
        assert!(captured.verify(&checksum_of("bundle"), None).is_ok());
        assert!(matches!(
            captured.verify(&checksum_of("other bundle"), None),
            Err(Error::CacheChecksumMismatch { .. })
        ));
        assert!(captured.verify(&checksum_of("bundle"), Some("extra")).is_err());
    }

    #[test]
    fn stub_ids_exclude_npm_modules() {
        let mut g = graph();
        g.get_mut(2).unwrap().meta.ignore("unused");
        let captured = CacheDocument::capture(&g, String::new(), None);
        let stubs = captured.stub_ids();
        assert!(stubs.contains(&2));
        assert!(!stubs.contains(&1));
    }

    #[test]
    fn cache_path_includes_entry_or_null() {
        assert_eq!(
            cache_file_path(Path::new("out"), Some(7)),
            PathBuf::from("out/7.cache")
        );
        assert_eq!(
            cache_file_path(Path::new("out"), None),
            PathBuf::from("out/null.cache")
        );
    }
}
