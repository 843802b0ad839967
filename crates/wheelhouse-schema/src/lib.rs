//! Shared types and wire format for wheelhouse.
//!
//! The index builder (producer) and the resolver (consumer) agree on the
//! types in this crate: the wheel filename grammar, the four-key
//! [`IndexEntry`] and the ordered [`WheelIndex`].

pub mod index;
pub mod version;
pub mod wheel;

// Re-exports
pub use index::{CompatTriple, IndexEntry, IndexError, WheelIndex};
pub use version::{compare_dotted, normalize_cuda, strip_local_version};
pub use wheel::{
    ParsedWheel, WheelGrammar, library_from_filename, normalize_library_name, parse_wheel_filename,
};

/// Platform tag of the wheels published by the default grammar.
pub const DEFAULT_PLATFORM_TAG: &str = "win_amd64";

/// Path segment between the repository URL and the wheel's relative path.
pub const RAW_PATH_SEGMENT: &str = "raw/main";

/// Default filename of the persisted index.
pub const DEFAULT_INDEX_FILE: &str = "wheels.json";
