//! Ignore-classification for runtime glue
//!
//! Polyfills and empty factories carry no decompilable content; marking
//! them ignored here feeds the transitive-ignore propagation.

use oxc_ast::ast::Program;

use crate::plugins::{NodeKind, PluginMeta, Tagger};
use crate::router::context::TagContext;

pub struct RuntimeGlue;

impl PluginMeta for RuntimeGlue {
    fn name(&self) -> &'static str {
        "runtime-glue"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn interest(&self) -> &'static [NodeKind] {
        &[NodeKind::Module]
    }
}

impl Tagger for RuntimeGlue {
    fn tag_module<'a>(&self, program: &Program<'a>, cx: &mut TagContext<'_>) {
        if cx.module.ignored() {
            return;
        }
        if program.body.is_empty() {
            cx.ignore("empty module");
            return;
        }
        if cx
            .module
            .name
            .as_deref()
            .is_some_and(|name| name.contains("polyfill"))
        {
            cx.ignore("polyfill module");
            return;
        }
        if cx.module.original_code.contains("polyfillGlobal") {
            cx.ignore("global polyfill installer");
        }
    }
}
