//! Bundled NPM package fingerprints
//!
//! Sentinel strings that survive minification. A match marks the module as
//! an NPM package, which also excludes it from output.

use lazy_static::lazy_static;
use oxc_ast::ast::Program;
use regex::Regex;

use crate::plugins::{NodeKind, PluginMeta, Tagger};
use crate::router::context::TagContext;

lazy_static! {
    /// `(package name, sentinel)` rows, first match wins.
    static ref CATALOG: Vec<(&'static str, Regex)> = vec![
        (
            "react",
            Regex::new(r#"Symbol\.for\("react\.element"\)|=60103"#).unwrap(),
        ),
        (
            "prop-types",
            Regex::new(r"SECRET_DO_NOT_PASS_THIS_OR_YOU_WILL_BE_FIRED").unwrap(),
        ),
        (
            "invariant",
            Regex::new(r"Invariant Violation").unwrap(),
        ),
        (
            "regenerator-runtime",
            Regex::new(r"Generator is already running").unwrap(),
        ),
        (
            "lodash",
            Regex::new(r"__lodash_hash_undefined__").unwrap(),
        ),
        (
            "object-assign",
            Regex::new(r#""abcdefghijklmnopqrst""#).unwrap(),
        ),
        (
            "base64-js",
            Regex::new(r"Invalid string\. Length must be a multiple of 4").unwrap(),
        ),
    ];
}

pub struct NpmFingerprints;

impl PluginMeta for NpmFingerprints {
    fn name(&self) -> &'static str {
        "npm-fingerprints"
    }

    fn interest(&self) -> &'static [NodeKind] {
        &[NodeKind::Module]
    }
}

impl Tagger for NpmFingerprints {
    fn tag_module<'a>(&self, _program: &Program<'a>, cx: &mut TagContext<'_>) {
        if cx.module.is_npm_module {
            return;
        }
        for (package, sentinel) in CATALOG.iter() {
            if sentinel.is_match(&cx.module.original_code) {
                cx.tag_as_npm_module(*package);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_match(code: &str) -> Option<&'static str> {
        CATALOG.iter().find(|(_, re)| re.is_match(code)).map(|(name, _)| *name)
    }

    #[test]
    fn sentinels_identify_their_packages() {
        assert_eq!(
            catalog_match(r#"var u=Symbol.for("react.element"),c=Symbol.for("react.portal")"#),
            Some("react")
        );
        assert_eq!(
            catalog_match("throw new Error('Invariant Violation: '+t)"),
            Some("invariant")
        );
        assert_eq!(
            catalog_match(r#"if(o===n)throw new Error("Generator is already running")"#),
            Some("regenerator-runtime")
        );
        assert_eq!(catalog_match("var HASH_UNDEFINED='__lodash_hash_undefined__'"), Some("lodash"));
    }

    #[test]
    fn plain_application_code_is_not_tagged() {
        assert_eq!(catalog_match("m.exports=function(){return 1}"), None);
    }
}
