pub mod browser;
pub mod error;
pub mod markers;
pub mod probe;

pub use browser::BrowserPool;
pub use error::ProbeError;
pub use probe::{ProbeOptions, ProbeOutcome, probe_batch};
