use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompositorError {
    #[error("no composition output has been configured")]
    NoOutput,
}
