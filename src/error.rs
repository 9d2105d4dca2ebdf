use miette::Diagnostic;
use thiserror::Error;

/// Result type for decompiler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Custom error types for the Metro bundle decompiler
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum Error {
    #[error("I/O error: {0}")]
    #[diagnostic(code(metro_dec::io_error))]
    Io(String),

    #[error("Failed to parse bundle: {message}")]
    #[diagnostic(code(metro_dec::parse_error))]
    Parse { message: String },

    #[error("Malformed __d registration at offset {offset}: {message}")]
    #[diagnostic(code(metro_dec::malformed_registration))]
    MalformedRegistration { offset: u32, message: String },

    #[error("Module {module} depends on module {dependency}, which is not in the bundle")]
    #[diagnostic(
        code(metro_dec::missing_dependency),
        help("the bundle may be split; pass the remaining module files via --bundles-folder")
    )]
    MissingDependency { module: u32, dependency: u32 },

    #[error("Entry module {entry} is not in the bundle")]
    #[diagnostic(code(metro_dec::missing_entry))]
    MissingEntry { entry: u32 },

    #[error("{pass} pass did not reach a fixed point on module {module} after {iterations} iterations")]
    #[diagnostic(code(metro_dec::fixpoint_exceeded))]
    FixpointExceeded {
        module: u32,
        pass: &'static str,
        iterations: usize,
    },

    #[error("Cache checksum mismatch: expected {expected}, got {got}")]
    #[diagnostic(code(metro_dec::cache_checksum_mismatch))]
    CacheChecksumMismatch { expected: String, got: String },

    #[error("No __d module registrations found in the bundle")]
    #[diagnostic(
        code(metro_dec::no_modules_found),
        help("likely causes: the input is not a Metro bundle, the bundle is Hermes bytecode (decompile it to JavaScript first), or the app is unbundled and the per-module files were not supplied via --bundles-folder")
    )]
    NoModulesFound,

    #[error("Aggressive cache mode requires an existing cache at {path}")]
    #[diagnostic(code(metro_dec::cache_required))]
    CacheRequired { path: String },
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Io(err.to_string())
    }
}
