//! `@babel/runtime/helpers/*` fingerprints
//!
//! Each helper has a stable minified shape; the catalog maps a helper name
//! to a regex over the registration's original source. `#` in a pattern
//! stands for any minified identifier. The patterns are intentionally
//! brittle: new minifier output means new fingerprints, so the catalog is
//! data, not code.

use lazy_static::lazy_static;
use oxc_ast::ast::Program;
use regex::Regex;

use crate::plugins::{NodeKind, PluginMeta, Tagger};
use crate::router::context::TagContext;

macro_rules! helper_regex {
    ($pattern:expr) => {
        Regex::new(&$pattern.replace('#', r"[\w$]+")).expect("helper fingerprint must compile")
    };
}

lazy_static! {
    /// `(helper name, fingerprint)` rows, first match wins.
    static ref CATALOG: Vec<(&'static str, Regex)> = vec![
        (
            // var t=r(d[0]),n=r(d[1]),o=r(d[2]),u=r(d[3]);
            // m.exports=function(c){return t(c)||n(c)||o(c)||u()}
            "toConsumableArray",
            helper_regex!(
                r"var #=#\(#\[0\]\),#=#\(#\[1\]\),#=#\(#\[2\]\),#=#\(#\[3\]\);#\.exports=function\(#\)\{return #\(#\)\|\|#\(#\)\|\|#\(#\)\|\|#\(\)\}"
            ),
        ),
        (
            // m.exports=function(t,n){return a(t)||b(t,n)||c(t,n)||d()}
            "slicedToArray",
            helper_regex!(
                r"#\.exports=function\(#,#\)\{return #\(#\)\|\|#\(#,#\)\|\|#\(#,#\)\|\|#\(\)\}"
            ),
        ),
        (
            "arrayWithoutHoles",
            helper_regex!(r"if\(Array\.isArray\(#\)\)return #\(#\)\}"),
        ),
        (
            "arrayWithHoles",
            helper_regex!(r"if\(Array\.isArray\(#\)\)return #\}"),
        ),
        (
            "iterableToArray",
            helper_regex!(r"(?:Symbol\.iterator|@@iterator)[\s\S]*return Array\.from\(#\)"),
        ),
        (
            "nonIterableSpread",
            Regex::new(r"Invalid attempt to spread non-iterable instance").unwrap(),
        ),
        (
            "nonIterableRest",
            Regex::new(r"Invalid attempt to destructure non-iterable instance").unwrap(),
        ),
        (
            "interopRequireDefault",
            helper_regex!(r"return #&&#\.__esModule\?#:\{default:#\}"),
        ),
        (
            "interopRequireWildcard",
            helper_regex!(r"new WeakMap(?:\(\))?,#=new WeakMap(?:\(\))?"),
        ),
        (
            "classCallCheck",
            Regex::new(r"Cannot call a class as a function").unwrap(),
        ),
        (
            "createClass",
            helper_regex!(r"#\.enumerable=#\.enumerable\|\|!1,#\.configurable=!0"),
        ),
        (
            "defineProperty",
            helper_regex!(
                r"return # in #\?Object\.defineProperty\(#,#,\{value:#,enumerable:!0,configurable:!0,writable:!0\}\):#\[#\]=#"
            ),
        ),
        (
            "extends",
            helper_regex!(r"Object\.assign\|\|function\(#\)\{for\(var #=1;"),
        ),
        (
            "getPrototypeOf",
            helper_regex!(
                r"Object\.setPrototypeOf\?Object\.getPrototypeOf:function\(#\)\{return #\.__proto__\|\|Object\.getPrototypeOf\(#\)\}"
            ),
        ),
        (
            "inherits",
            Regex::new(r"Super expression must either be null or a function").unwrap(),
        ),
        (
            "possibleConstructorReturn",
            helper_regex!(r#"\("object"==typeof #\|\|"function"==typeof #\)\)return #"#),
        ),
        (
            "assertThisInitialized",
            Regex::new(r"this hasn't been initialised - super\(\) hasn't been called").unwrap(),
        ),
        (
            "objectSpread",
            helper_regex!(r"Object\.getOwnPropertyDescriptor\(#,#\)\.enumerable"),
        ),
    ];
}

pub struct BabelHelperFingerprints;

impl PluginMeta for BabelHelperFingerprints {
    fn name(&self) -> &'static str {
        "babel-helper-fingerprints"
    }

    fn interest(&self) -> &'static [NodeKind] {
        &[NodeKind::Module]
    }
}

impl Tagger for BabelHelperFingerprints {
    fn tag_module<'a>(&self, _program: &Program<'a>, cx: &mut TagContext<'_>) {
        if cx.module.is_npm_module {
            return;
        }
        for (helper, fingerprint) in CATALOG.iter() {
            if fingerprint.is_match(&cx.module.original_code) {
                cx.tag_as_npm_module(format!("@babel/runtime/helpers/{helper}"));
                cx.tag_with_params("babel-helper", vec![(*helper).to_string()]);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPREAD_HELPER: &str = "__d(function(g,r,i,a,m,e,d){var t=r(d[0]),n=r(d[1]),o=r(d[2]),u=r(d[3]);m.exports=function(c){return t(c)||n(c)||o(c)||u()};},5,[1,2,3,4]);";

    fn catalog_match(code: &str) -> Option<&'static str> {
        CATALOG.iter().find(|(_, re)| re.is_match(code)).map(|(name, _)| *name)
    }

    #[test]
    fn spread_helper_shape_is_recognized() {
        assert_eq!(catalog_match(SPREAD_HELPER), Some("toConsumableArray"));
    }

    #[test]
    fn interop_default_shape_is_recognized() {
        let code = "__d(function(g,r,i,a,m,e,d){m.exports=function(t){return t&&t.__esModule?t:{default:t}};},7,[]);";
        assert_eq!(catalog_match(code), Some("interopRequireDefault"));
    }

    #[test]
    fn class_call_check_string_is_recognized() {
        let code = r#"__d(function(g,r,i,a,m,e,d){m.exports=function(t,n){if(!(t instanceof n))throw new TypeError("Cannot call a class as a function")};},8,[]);"#;
        assert_eq!(catalog_match(code), Some("classCallCheck"));
    }

    #[test]
    fn array_with_and_without_holes_disambiguate() {
        let with_dep = "__d(function(g,r,i,a,m,e,d){var n=r(d[0]);m.exports=function(t){if(Array.isArray(t))return n(t)};},9,[2]);";
        let plain = "__d(function(g,r,i,a,m,e,d){m.exports=function(t){if(Array.isArray(t))return t};},10,[]);";
        assert_eq!(catalog_match(with_dep), Some("arrayWithoutHoles"));
        assert_eq!(catalog_match(plain), Some("arrayWithHoles"));
    }

    #[test]
    fn unrelated_code_is_not_tagged() {
        assert_eq!(
            catalog_match("__d(function(g,r,i,a,m,e,d){m.exports=function(){return 42}},0,[]);"),
            None
        );
    }
}
