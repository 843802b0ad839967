pub mod indexer;
pub mod probe;
pub mod readme;
pub mod reporter;
pub mod resolver;

pub use indexer::{BuildReport, build_index};
pub use probe::{EnvironmentProbe, EnvironmentSignature};
pub use reporter::{NullReporter, Reporter};
pub use resolver::{CompatibilityQuery, ResolveError, Resolution, resolve};
