/// Errors that can occur in the extension manager.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Filesystem error from the manifest source or the enabled-set store.
    #[error("filesystem error: {0}")]
    Fs(#[from] ext_fs::Error),

    /// Installed extension directory has no manifest.
    #[error("no manifest for installed extension '{id}'")]
    MissingManifest { id: String },

    /// A required manifest field is absent or blank.
    #[error("manifest is missing required field '{field}'")]
    MissingField { field: &'static str },

    /// Invalid extension or dependency id.
    #[error("invalid extension id '{id}': {reason}")]
    InvalidId { id: String, reason: String },

    /// Manifest id does not match the directory it was found in.
    #[error("manifest id '{found}' does not match installed id '{expected}'")]
    IdMismatch { expected: String, found: String },

    /// Invalid dotted-numeric version string.
    #[error("invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    /// Extension requires a newer host.
    #[error("extension '{id}' requires host {required}, running {host}")]
    IncompatibleHost {
        id: String,
        required: String,
        host: String,
    },

    /// The enabled extensions form a dependency cycle.
    #[error("dependency cycle detected among: {}", participants.join(" -> "))]
    DependencyCycle { participants: Vec<String> },

    /// Enabled-set persistence failed outside the filesystem layer.
    #[error("failed to persist enabled extensions: {message}")]
    Persistence { message: String },

    /// Manager configuration is invalid.
    #[error("invalid manager configuration: {reason}")]
    InvalidConfig { reason: String },

    /// `start` was called on a manager that already completed its initial load.
    #[error("extension manager already started")]
    AlreadyStarted,
}

pub type Result<T> = std::result::Result<T, Error>;
