//! Error taxonomy shared by every fallible operation.

use thiserror::Error;

/// Errors returned by [`Session`](crate::Session), [`Spatializer`](crate::Spatializer)
/// and the [`Expression`](crate::signals::Expression) generator.
///
/// Every variant maps to a stable integer through [`Error::code`], so hosts that
/// speak numeric status codes can translate results without matching on text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("no output device matches the request")]
    InvalidDevice,
    #[error("session is not open")]
    NotOpen,
    #[error("session is already open")]
    AlreadyOpen,
    #[error("channel {channel} is out of range (session has {count} channels)")]
    InvalidChannel { channel: usize, count: usize },
    #[error("channel count {0} is not supported by the device")]
    InvalidChannelCount(usize),
    #[error("sample rate {0} Hz is not supported by the device")]
    InvalidSampleRate(u32),
    #[error("signal has no waveform to play")]
    NoWaveform,
    #[error("device control panel could not be opened")]
    ControlPanelFail,
    #[error("no output device is available for the requested host API")]
    InvalidApi,
    #[error("command queue is full")]
    QueueFull,
    #[error("invalid expression `{text}`: {reason}")]
    InvalidExpression { text: String, reason: String },
    #[error("audio backend error: {0}")]
    Backend(String),
}

impl Error {
    /// Code reported for success by hosts that use numeric status codes.
    pub const NO_ERROR: i32 = 0;

    /// Stable numeric code for this error. Never zero.
    pub fn code(&self) -> i32 {
        match self {
            Error::InvalidDevice => -1,
            Error::NotOpen => -2,
            Error::AlreadyOpen => -3,
            Error::InvalidChannel { .. } => -4,
            Error::InvalidChannelCount(_) => -5,
            Error::InvalidSampleRate(_) => -6,
            Error::NoWaveform => -7,
            Error::ControlPanelFail => -8,
            Error::InvalidApi => -9,
            Error::QueueFull => -10,
            Error::InvalidExpression { .. } => -11,
            Error::Backend(_) => -12,
        }
    }

    /// Collapse a result into the numeric code convention.
    pub fn code_of<T>(result: &Result<T>) -> i32 {
        match result {
            Ok(_) => Self::NO_ERROR,
            Err(e) => e.code(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
