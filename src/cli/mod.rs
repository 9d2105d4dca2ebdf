//! Command-line interface module
//!
//! Reads the bundle (and the per-module folder for unbundled apps), runs
//! the decompiler, and writes the per-module sources plus the tagging
//! cache. Files are only rewritten when their content changed, so
//! timestamps survive unchanged runs.

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::cache::{cache_file_path, CacheDocument};
use crate::decompiler::{BundleInput, DecompileOptions, Decompiler};
use crate::error::{Error, Result};

#[derive(Parser)]
#[command(name = "metro-dec-rs")]
#[command(about = "Rust-based decompiler for Metro React Native bundles")]
#[command(version)]
pub struct Args {
    /// Path to the bundle file
    #[arg(long = "in", value_name = "FILE")]
    pub input: PathBuf,

    /// Output folder for the decompiled modules
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,

    /// Folder with per-module bundle files (unbundled apps)
    #[arg(long, value_name = "DIR")]
    pub bundles_folder: Option<PathBuf>,

    /// Decompile only this module and its transitive dependencies;
    /// also enables cache persistence
    #[arg(long, value_name = "MODULE_ID")]
    pub entry: Option<u32>,

    /// Emit per-plugin timing
    #[arg(long)]
    pub performance: bool,

    /// Print the final module dependency summary
    #[arg(long)]
    pub verbose: bool,

    /// Emit modules tagged as ignored
    #[arg(long)]
    pub decompile_ignored: bool,

    /// Trust cached ignore/NPM flags and skip re-parsing their bodies
    /// (trades correctness for speed; requires an existing cache)
    #[arg(long)]
    pub aggressive_cache: bool,

    /// Skip the external lint/format pass
    #[arg(long)]
    pub no_eslint: bool,
}

pub fn run(args: Args) -> Result<()> {
    let bundle = read_bundle(&args)?;

    let cache_path = cache_file_path(&args.out, args.entry);
    let cache = load_cache(&args, &bundle, &cache_path)?;

    let options = DecompileOptions {
        entry: args.entry,
        performance: args.performance,
        verbose: args.verbose,
        decompile_ignored: args.decompile_ignored,
        aggressive_cache: args.aggressive_cache,
    };
    let decompiler = Decompiler::new(options);
    let result = decompiler.decompile(&bundle, cache.as_ref())?;

    std::fs::create_dir_all(&args.out)?;
    let mut written = 0usize;
    for file in &result.files {
        if write_if_changed(&args.out.join(format!("{}.js", file.id)), &file.code)? {
            written += 1;
        }
    }
    log::info!("{written} of {} files written", result.files.len());

    if args.entry.is_some() {
        result.cache.save(&cache_path)?;
        log::info!("cache saved to {}", cache_path.display());
    }

    if args.performance {
        for (pass, timings) in &result.timings {
            println!("{} pass:", pass.name());
            for (plugin, elapsed) in timings.sorted() {
                println!("  {plugin:<28} {elapsed:?}");
            }
        }
    }
    for line in &result.summary {
        println!("{line}");
    }

    if args.no_eslint {
        log::info!("skipping the external lint/format pass");
    } else {
        // The lint/format pass runs outside the core pipeline.
        log::debug!("output ready for the external lint/format pass");
    }
    Ok(())
}

fn read_bundle(args: &Args) -> Result<BundleInput> {
    let main = std::fs::read_to_string(&args.input)
        .map_err(|err| Error::Io(format!("{}: {err}", args.input.display())))?;
    let extra = match &args.bundles_folder {
        None => None,
        Some(folder) => Some(read_bundles_folder(folder)?),
    };
    Ok(BundleInput::new(main, extra))
}

/// Concatenate the per-module script files of an unbundled app, in
/// file-name order so the result is stable.
fn read_bundles_folder(folder: &Path) -> Result<String> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(folder)
        .map_err(|err| Error::Io(format!("{}: {err}", folder.display())))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "js"))
        .collect();
    paths.sort();
    let mut combined = String::new();
    for path in paths {
        combined.push_str(&std::fs::read_to_string(&path)?);
        combined.push('\n');
    }
    Ok(combined)
}

fn load_cache(args: &Args, bundle: &BundleInput, path: &Path) -> Result<Option<CacheDocument>> {
    if args.entry.is_none() && !args.aggressive_cache {
        return Ok(None);
    }
    let cache = match CacheDocument::load(path)? {
        Some(cache) => {
            match cache.verify(&bundle.checksum(), bundle.input_checksum().as_deref()) {
                Ok(()) => Some(cache),
                Err(err) => {
                    log::warn!("{err}; discarding cache");
                    None
                }
            }
        }
        None => None,
    };
    if args.aggressive_cache && cache.is_none() {
        return Err(Error::CacheRequired { path: path.display().to_string() });
    }
    Ok(cache)
}

/// Write `content` to `path` only when the file is absent or differs.
/// Returns whether a write happened.
fn write_if_changed(path: &Path, content: &str) -> Result<bool> {
    match std::fs::read_to_string(path) {
        Ok(existing) if existing == content => Ok(false),
        Ok(_) | Err(_) => {
            std::fs::write(path, content)?;
            Ok(true)
        }
    }
}
