use thiserror::Error;

/// Internal probe failures. These never escape `probe_batch`; a failed probe
/// is simply absent from the alive set.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("browser launch failed: {0}")]
    Launch(String),
    #[error("browser navigation failed: {0}")]
    Navigation(String),
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
