/// A type alias for handling errors throughout mg2
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An error that occurred while allocating pipeline scratch memory
    #[error("memory error: {0}")]
    Memory(std::borrow::Cow<'static, str>),

    /// An error that occurred while decoding a malformed or truncated stream
    #[error("format error: {0}")]
    Format(std::borrow::Cow<'static, str>),

    /// An input mesh that violates the codec's invariants
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// An unexpected I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    #[inline]
    pub(crate) fn memory(msg: &'static str) -> Self {
        Self::Memory(std::borrow::Cow::Borrowed(msg))
    }

    #[inline]
    pub(crate) fn format(msg: &'static str) -> Self {
        Self::Format(std::borrow::Cow::Borrowed(msg))
    }

    #[inline]
    pub(crate) fn format_dynamic(msg: String) -> Self {
        Self::Format(std::borrow::Cow::Owned(msg))
    }

    #[inline]
    pub(crate) fn invalid_mesh(msg: impl Into<String>) -> Self {
        Self::InvalidMesh(msg.into())
    }
}
