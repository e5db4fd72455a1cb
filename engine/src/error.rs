use thiserror::Error;

#[derive(Error, Debug)]
pub enum FinderError {
    /// A prompt or panel was requested while another mode is active on the
    /// same instance. Prompt and panel are mutually exclusive per finder.
    #[error("finder `{0}` is already open")]
    AlreadyOpen(String),

    #[error("host operation failed: {0}")]
    Host(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, FinderError>;
