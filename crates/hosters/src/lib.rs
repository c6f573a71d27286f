pub mod media;
pub mod resolver;

pub use media::{Quality, ResolvedStream};
pub use resolver::error::ResolverError;
pub use resolver::hoster::HosterResolver;
pub use resolver::registry::Registry;
