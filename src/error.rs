use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantizeError {
    #[error("pixel buffer is empty")]
    EmptyBuffer,

    #[error("pixel buffer length {len} is not a multiple of 4 (RGBA)")]
    UnalignedBuffer { len: usize },

    #[error("max_colors must be between 1 and 256, got {0}")]
    InvalidMaxColors(u32),

    #[error("quality must be at least 1, got {0}")]
    InvalidQuality(u32),

    #[error("no pixels left after alpha and white filtering")]
    NoSampledPixels,

    #[error("color index {index} is outside the histogram")]
    IndexOutOfRange { index: usize },
}

impl QuantizeError {
    /// Whether this error was caused by the caller's input rather than by the engine.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::EmptyBuffer
                | Self::UnalignedBuffer { .. }
                | Self::InvalidMaxColors(_)
                | Self::InvalidQuality(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseColorError {
    #[error("expected `rgb(R,G,B)`")]
    Syntax,

    #[error("channel value `{0}` is not an integer in 0..=255")]
    Channel(alloc::string::String),
}
