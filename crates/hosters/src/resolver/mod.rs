mod default;
pub mod cascade;
pub mod credential;
pub mod descriptor;
pub mod error;
pub mod generic;
pub mod hoster;
pub mod hosters;
pub mod registry;
pub mod unpack;

pub use default::{ProxyConfig, default_client, default_registry, registry_with_proxy};
