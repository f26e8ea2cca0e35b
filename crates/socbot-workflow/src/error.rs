use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Browser(#[from] socbot_browser::Error),

    #[error("Frame '{0}' did not become available")]
    FrameUnavailable(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Primary window {0} is no longer open")]
    PrimaryWindowLost(String),
}

pub type Result<T> = std::result::Result<T, Error>;
