//! Validated document codes.
//!
//! A document code is the unique human-readable identifier of a controlled
//! document, e.g. `SOP-QMS-001`: one or more uppercase alphanumeric segments
//! followed by a zero-padded sequence number.

use std::{fmt, num::NonZeroU32, ops::Deref, str::FromStr};

use non_empty_string::NonEmptyString;

use super::record::DocumentType;

/// Width of the zero-padded sequence portion of a document code.
pub const SEQUENCE_DIGITS: usize = 3;

/// A validated document-code segment: non-empty, uppercase ASCII letters and
/// digits only.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SegmentString(NonEmptyString);

impl SegmentString {
    /// Creates a new `SegmentString` from a string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSegmentError` if the string is empty or contains
    /// characters other than uppercase ASCII letters and digits.
    pub fn new(s: String) -> Result<Self, InvalidSegmentError> {
        let non_empty =
            NonEmptyString::new(s.clone()).map_err(|_| InvalidSegmentError(s.clone()))?;

        if !s
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        {
            return Err(InvalidSegmentError(s));
        }

        Ok(Self(non_empty))
    }

    /// Returns the string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for SegmentString {
    type Error = InvalidSegmentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for SegmentString {
    type Error = InvalidSegmentError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value.to_string())
    }
}

impl AsRef<str> for SegmentString {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for SegmentString {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0.as_str()
    }
}

impl fmt::Display for SegmentString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SegmentString {
    type Err = InvalidSegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

/// Error returned when a string is not a valid document-code segment.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error(
    "Invalid code segment '{0}': must be non-empty and contain only uppercase letters and digits"
)]
pub struct InvalidSegmentError(String);

/// A parsed, validated document code.
///
/// Format: `{SEGMENT}(-{SEGMENT})*-{NNN}`, where each `SEGMENT` is uppercase
/// alphanumeric and `NNN` is a positive integer, displayed zero-padded to
/// [`SEQUENCE_DIGITS`] digits.
///
/// Examples: `SOP-QMS-001`, `DPM-HQ-QMS-SOP-042`, `DOC-GEN-007`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct DocumentCode {
    segments: Vec<SegmentString>,
    sequence: NonZeroU32,
}

impl DocumentCode {
    /// Creates a document code from pre-validated parts.
    ///
    /// This is an infallible constructor that takes pre-validated types.
    #[must_use]
    pub const fn new(segments: Vec<SegmentString>, sequence: NonZeroU32) -> Self {
        Self { segments, sequence }
    }

    /// Returns the prefix segments as strings.
    pub fn segments(&self) -> Vec<&str> {
        self.segments.iter().map(SegmentString::as_str).collect()
    }

    /// Returns the numeric sequence component.
    #[must_use]
    pub const fn sequence(&self) -> NonZeroU32 {
        self.sequence
    }

    /// Returns the code's prefix, including the trailing separator.
    ///
    /// For `SOP-QMS-001` this is `SOP-QMS-`, the exact string the allocator
    /// scans the collections for.
    #[must_use]
    pub fn prefix(&self) -> String {
        let mut prefix = self
            .segments
            .iter()
            .map(SegmentString::as_str)
            .collect::<Vec<_>>()
            .join("-");
        prefix.push('-');
        prefix
    }
}

impl fmt::Display for DocumentCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{:0width$}",
            self.prefix(),
            self.sequence,
            width = SEQUENCE_DIGITS
        )
    }
}

/// Errors that can occur during document-code parsing or construction.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// Malformed code structure.
    #[error("Invalid document code format: {0}")]
    Syntax(String),

    /// Invalid sequence value (non-numeric or zero).
    #[error("Invalid sequence in document code '{0}': expected a non-zero integer, got {1}")]
    Sequence(String, String),

    /// Invalid segment (not uppercase alphanumeric).
    #[error(transparent)]
    Segment(InvalidSegmentError),
}

impl From<InvalidSegmentError> for Error {
    fn from(err: InvalidSegmentError) -> Self {
        Self::Segment(err)
    }
}

impl FromStr for DocumentCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty()
            || s.starts_with('-')
            || s.ends_with('-')
            || s.contains("--")
            || !s.contains('-')
        {
            return Err(Error::Syntax(s.to_string()));
        }

        let parts: Vec<&str> = s.split('-').collect();

        // At least one segment plus the sequence.
        if parts.len() < 2 {
            return Err(Error::Syntax(s.to_string()));
        }

        let sequence_str = parts[parts.len() - 1];
        let sequence = sequence_str
            .parse::<u32>()
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| Error::Sequence(s.to_string(), sequence_str.to_string()))?;

        let segments = parts[..parts.len() - 1]
            .iter()
            .map(|&segment| SegmentString::new(segment.to_string()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(segments, sequence))
    }
}

impl TryFrom<&str> for DocumentCode {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}

/// Derives the document-code prefix for a new document.
///
/// The prefix is `{TYPE}-{PROCESS}-`: the type's fixed token followed by up to
/// three uppercase alphanumeric characters taken from the process or function
/// name (`GEN` when the name yields none).
#[must_use]
pub fn code_prefix(document_type: DocumentType, process_or_function: &str) -> String {
    let process: String = process_or_function
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_uppercase())
        .take(3)
        .collect();
    let process = if process.is_empty() {
        "GEN".to_string()
    } else {
        process
    };
    format!("{}-{process}-", document_type.type_prefix())
}
