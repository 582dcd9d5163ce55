//! Display name validation.

use airlock_protocol::Status;

use crate::SessionConfig;

/// Why a display name was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("name is missing")]
    Missing,

    #[error("name is {len} characters, expected {min}..={max}")]
    WrongLength { len: usize, min: usize, max: usize },

    #[error("name contains non-printable characters")]
    NotPrintable,
}

impl NameError {
    /// The status code sent back to the client.
    pub fn status(&self) -> Status {
        match self {
            Self::Missing | Self::NotPrintable => Status::Invalid,
            Self::WrongLength { .. } => Status::WrongLength,
        }
    }
}

/// Returns `true` if every character is printable ASCII (0x20–0x7E).
pub fn is_printable(text: &str) -> bool {
    text.chars().all(|c| matches!(c, ' '..='~'))
}

/// Validates a requested display name and returns it trimmed.
///
/// The raw text must be printable ASCII throughout, padding included;
/// only then are surrounding spaces trimmed and the length counted.
///
/// # Errors
/// - [`NameError::Missing`] — no name given
/// - [`NameError::WrongLength`] — outside `name_len_min..=name_len_max`
/// - [`NameError::NotPrintable`] — contains anything but printable ASCII
pub fn validate_name(
    raw: Option<&str>,
    config: &SessionConfig,
) -> Result<String, NameError> {
    let raw = raw.ok_or(NameError::Missing)?;
    if !is_printable(raw) {
        return Err(NameError::NotPrintable);
    }
    let name = raw.trim_matches(' ');

    let len = name.chars().count();
    if len < config.name_len_min || len > config.name_len_max {
        return Err(NameError::WrongLength {
            len,
            min: config.name_len_min,
            max: config.name_len_max,
        });
    }

    Ok(name.to_string())
}
