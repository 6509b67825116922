pub type DecodeResult<T> = core::result::Result<T, DecodeError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("frame too short: needed {needed} bytes, got {available}")]
    TooShort { needed: usize, available: usize },
}
