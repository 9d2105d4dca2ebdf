use metro_dec_rs::decompiler::{BundleInput, DecompileOptions, Decompiler};
use metro_dec_rs::DecompilerError;

fn bundle(text: &str) -> BundleInput {
    BundleInput::new(text.to_string(), None)
}

fn decompile(text: &str, options: DecompileOptions) -> metro_dec_rs::DecompileResult {
    Decompiler::new(options).decompile(&bundle(text), None).unwrap()
}

const SPREAD_HELPER_MODULE: &str = "__d(function(g,r,i,a,m,e,d){var t=r(d[0]),n=r(d[1]),o=r(d[2]),u=r(d[3]);m.exports=function(c){return t(c)||n(c)||o(c)||u()};},5,[1,2,3,4]);";

fn helper_dep_modules() -> String {
    (1..=4)
        .map(|id| format!("__d(function(g,r,i,a,m,e,d){{m.exports=function(){{return {id}}};}},{id},[]);"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn single_module_becomes_export_default() {
    let result = decompile(
        "__d(function(g,r,i,a,m,e,d){m.exports=42;},0,[]);",
        DecompileOptions::default(),
    );
    assert_eq!(result.files.len(), 1);
    assert_eq!(result.files[0].id, 0);
    assert_eq!(result.files[0].code.trim(), "export default 42;");
}

#[test]
fn spread_helper_module_is_tagged_npm_and_ignored() {
    let text = format!("{SPREAD_HELPER_MODULE}\n{}", helper_dep_modules());
    let result = decompile(&text, DecompileOptions::default());

    let cached = result.cache.modules.iter().find(|m| m.module_id == 5).unwrap();
    assert!(cached.is_npm_module);
    assert_eq!(
        cached.npm_module_name.as_deref(),
        Some("@babel/runtime/helpers/toConsumableArray")
    );
    assert!(cached.ignored);
    assert!(result.files.iter().all(|f| f.id != 5));
}

#[test]
fn helper_consumer_imports_the_canonical_package() {
    let consumer = "__d(function(g,r,i,a,m,e,d){var t=r(d[0]);m.exports=function(x){return[].concat(t(x),[1])};},0,[5]);";
    let text = format!("{consumer}\n{SPREAD_HELPER_MODULE}\n{}", helper_dep_modules());
    let result = decompile(&text, DecompileOptions::default());

    let main = result.files.iter().find(|f| f.id == 0).unwrap();
    assert!(main.code.contains("import t from"), "{}", main.code);
    assert!(
        main.code.contains("@babel/runtime/helpers/toConsumableArray"),
        "{}",
        main.code
    );
    assert!(main.code.contains("...x"), "spread not recovered: {}", main.code);
}

#[test]
fn internal_requires_resolve_to_relative_paths() {
    let text = "__d(function(g,r,i,a,m,e,d){var t=r(d[0]);m.exports=t;},0,[1]);\n__d(function(g,r,i,a,m,e,d){m.exports=7;},1,[]);";
    let result = decompile(text, DecompileOptions::default());
    let main = result.files.iter().find(|f| f.id == 0).unwrap();
    assert!(main.code.contains("import t from \"./1\""), "{}", main.code);
    assert!(main.code.contains("export default t"), "{}", main.code);
}

#[test]
fn entry_restricts_to_the_transitive_closure() {
    let text = "__d(function(g,r,i,a,m,e,d){r(d[0]);m.exports=1;},1,[2]);\n\
                __d(function(g,r,i,a,m,e,d){r(d[0]);m.exports=2;},2,[3]);\n\
                __d(function(g,r,i,a,m,e,d){m.exports=3;},3,[]);";

    let all = decompile(text, DecompileOptions { entry: Some(1), ..Default::default() });
    let mut ids: Vec<u32> = all.files.iter().map(|f| f.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);

    let partial = decompile(text, DecompileOptions { entry: Some(2), ..Default::default() });
    let mut ids: Vec<u32> = partial.files.iter().map(|f| f.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn bundle_without_registrations_is_fatal() {
    let err = Decompiler::new(DecompileOptions::default())
        .decompile(&bundle("var x = 5; console.log(x);"), None)
        .unwrap_err();
    assert!(matches!(err, DecompilerError::NoModulesFound));
}

#[test]
fn short_circuit_statements_become_ifs() {
    let result = decompile(
        "__d(function(g,r,i,a,m,e,d){g.ready&&g.start();m.exports=0;},0,[]);",
        DecompileOptions::default(),
    );
    let code = &result.files[0].code;
    assert!(code.contains("if (g.ready)"), "{code}");
    assert!(!code.contains("&&"), "{code}");
}

#[test]
fn sequence_statements_are_split() {
    let result = decompile(
        "__d(function(g,r,i,a,m,e,d){(g.a(),g.b(),g.c());m.exports=0;},0,[]);",
        DecompileOptions::default(),
    );
    let code = &result.files[0].code;
    assert!(code.contains("g.a();"), "{code}");
    assert!(code.contains("g.b();"), "{code}");
    assert!(code.contains("g.c();"), "{code}");
}

#[test]
fn npm_dependency_and_its_private_dependency_are_pruned() {
    // 0 (app) -> 1 (react by fingerprint) -> 2 (only used by react)
    let text = r#"__d(function(g,r,i,a,m,e,d){var t=r(d[0]);m.exports=function(){return t};},0,[1]);
__d(function(g,r,i,a,m,e,d){var u=Symbol.for("react.element"),c=r(d[0]);m.exports={element:u,c:c};},1,[2]);
__d(function(g,r,i,a,m,e,d){m.exports=function(){return 2};},2,[]);"#;
    let result = decompile(text, DecompileOptions::default());

    let ids: Vec<u32> = result.files.iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![0]);

    let react = result.cache.modules.iter().find(|m| m.module_id == 1).unwrap();
    assert_eq!(react.npm_module_name.as_deref(), Some("react"));
    let private = result.cache.modules.iter().find(|m| m.module_id == 2).unwrap();
    assert!(private.ignored && !private.is_npm_module);

    let main = result.files.iter().find(|f| f.id == 0).unwrap();
    assert!(main.code.contains("import t from \"react\""), "{}", main.code);
}

#[test]
fn second_run_with_cache_produces_identical_output() {
    let text = format!(
        "__d(function(g,r,i,a,m,e,d){{var t=r(d[0]);m.exports=t;}},0,[5]);\n{SPREAD_HELPER_MODULE}\n{}",
        helper_dep_modules()
    );
    let options = DecompileOptions { entry: Some(0), ..Default::default() };

    let fresh = Decompiler::new(options.clone()).decompile(&bundle(&text), None).unwrap();
    let cached =
        Decompiler::new(options).decompile(&bundle(&text), Some(&fresh.cache)).unwrap();

    let fresh_files: Vec<(u32, &str)> =
        fresh.files.iter().map(|f| (f.id, f.code.as_str())).collect();
    let cached_files: Vec<(u32, &str)> =
        cached.files.iter().map(|f| (f.id, f.code.as_str())).collect();
    assert_eq!(fresh_files, cached_files);
    assert_eq!(fresh.cache.checksum, cached.cache.checksum);
}

#[test]
fn aggressive_cache_stubs_ignored_modules_but_keeps_the_graph() {
    // 0 (entry) -> 1 (react) -> 2 (react internal, transitively ignored)
    let text = r#"__d(function(g,r,i,a,m,e,d){var t=r(d[0]);m.exports=t;},0,[1]);
__d(function(g,r,i,a,m,e,d){var u=Symbol.for("react.element"),c=r(d[0]);m.exports=u;},1,[2]);
__d(function(g,r,i,a,m,e,d){m.exports=2;},2,[]);"#;

    let warm = Decompiler::new(DecompileOptions { entry: Some(0), ..Default::default() })
        .decompile(&bundle(text), None)
        .unwrap();

    let aggressive = Decompiler::new(DecompileOptions {
        entry: Some(0),
        aggressive_cache: true,
        ..Default::default()
    })
    .decompile(&bundle(text), Some(&warm.cache))
    .unwrap();

    let ids: Vec<u32> = aggressive.files.iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![0]);
    let main = aggressive.files.iter().find(|f| f.id == 0).unwrap();
    assert!(main.code.contains("import t from \"react\""), "{}", main.code);
}

#[test]
fn passthrough_wrapper_inherits_npm_identity_from_a_higher_id() {
    // The wrapper (id 0) is scanned before the package it re-exports
    // (id 5); only a second tagger sweep can see lodash's tag.
    let text = "__d(function(g,r,i,a,m,e,d){m.exports=r(d[0]);},0,[5]);\n\
                __d(function(g,r,i,a,m,e,d){var u='__lodash_hash_undefined__';m.exports=u;},5,[]);";
    let result = decompile(text, DecompileOptions::default());

    let wrapper = result.cache.modules.iter().find(|m| m.module_id == 0).unwrap();
    assert!(wrapper.is_npm_module);
    assert_eq!(wrapper.npm_module_name.as_deref(), Some("lodash"));
    assert!(wrapper.ignored);
    assert!(result.files.is_empty());
}

#[test]
fn react_component_detection_survives_id_order() {
    let text = "__d(function(g,r,i,a,m,e,d){var t=r(d[0]);m.exports=function(){return t.createElement('div')};},0,[3]);\n\
                __d(function(g,r,i,a,m,e,d){var u=Symbol.for(\"react.element\");m.exports=u;},3,[]);";
    let result = decompile(text, DecompileOptions::default());

    let component = result.cache.modules.iter().find(|m| m.module_id == 0).unwrap();
    assert!(component.tags.iter().any(|t| t == "react-component"), "{:?}", component.tags);
}

#[test]
fn ignored_modules_can_still_be_emitted_on_request() {
    let text = "__d(function(g,r,i,a,m,e,d){var t=r(d[0]);m.exports=t;},0,[1]);\n\
                __d(function(g,r,i,a,m,e,d){m.exports={SECRET_DO_NOT_PASS_THIS_OR_YOU_WILL_BE_FIRED:1};},1,[]);";
    let hidden = decompile(text, DecompileOptions::default());
    assert_eq!(hidden.files.len(), 1);

    let shown = decompile(text, DecompileOptions { decompile_ignored: true, ..Default::default() });
    assert_eq!(shown.files.len(), 2);
}
