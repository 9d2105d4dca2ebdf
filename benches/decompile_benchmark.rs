use criterion::{black_box, criterion_group, criterion_main, Criterion};
use metro_dec_rs::decompiler::{BundleInput, DecompileOptions, Decompiler};

fn synthetic_bundle(modules: usize) -> String {
    let mut bundle = String::new();
    for id in 0..modules {
        let dep = (id + 1) % modules;
        bundle.push_str(&format!(
            "__d(function(g,r,i,a,m,e,d){{var t=r(d[0]);m.exports=function(){{return t}};}},{id},[{dep}]);\n"
        ));
    }
    bundle
}

fn decompilation_benchmark(c: &mut Criterion) {
    let bundle = BundleInput::new(synthetic_bundle(64), None);
    c.bench_function("decompile_64_modules", |b| {
        b.iter(|| {
            let decompiler = Decompiler::new(DecompileOptions::default());
            black_box(decompiler.decompile(&bundle, None).unwrap());
        });
    });
}

criterion_group!(benches, decompilation_benchmark);
criterion_main!(benches);
