use thiserror::Error;

use std::fmt;

#[derive(Debug)]
pub struct LprError(LprErrorKind);

#[derive(Debug, Error, PartialEq)]
pub enum LprErrorKind {
    /// Malformed image buffer or non-finite geometry.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The upright box around a rotated rectangle collapsed to zero width or height.
    #[error("degenerate crop of {width}x{height}")]
    DegenerateCrop { width: u32, height: u32 },
}

impl LprError {
    pub fn kind(&self) -> &LprErrorKind {
        &self.0
    }

    pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
        Self(LprErrorKind::InvalidInput(msg.into()))
    }
}

impl From<LprErrorKind> for LprError {
    fn from(e: LprErrorKind) -> Self {
        Self(e)
    }
}

impl fmt::Display for LprError {

    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind().fmt(f)
    }
}

impl std::error::Error for LprError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.kind())
    }
}
