//! Pattern-recognition taggers
//!
//! Fingerprint taggers run a regex catalog against the minified source and
//! are cheap, so they run first. Structural taggers inspect the AST and may
//! depend on earlier tagging of the module's dependencies.

pub mod babel_helpers;
pub mod npm_fingerprints;
pub mod runtime_glue;
pub mod structural;
