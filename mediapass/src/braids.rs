use aliri_braid::braid;
use std::{convert::Infallible, fmt};
use thiserror::Error;

/// File extensions accepted at the end of a [`ResourcePath`]
///
/// Matching is ASCII case-insensitive.
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "mp4", "mp3", "wav", "avi", "mov", "pdf", "jpg", "jpeg", "png",
];

/// Shortest accepted [`RequesterId`], in bytes
pub const REQUESTER_ID_MIN_LEN: usize = 3;

/// Longest accepted [`RequesterId`], in bytes
pub const REQUESTER_ID_MAX_LEN: usize = 50;

macro_rules! limited_reveal {
    ($ty:ty: $hidden:literal, $default:literal) => {
        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                if f.alternate() {
                    f.write_str("\"")?;
                    limited_reveal(&self.0, &mut *f, $default)?;
                    f.write_str("\"")
                } else {
                    f.write_str(concat!("***", $hidden, "***"))
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                if f.alternate() {
                    limited_reveal(&self.0, &mut *f, usize::MAX)
                } else {
                    f.write_str(concat!("***", $hidden, "***"))
                }
            }
        }
    };
}

fn limited_reveal(unprotected: &str, f: &mut fmt::Formatter, default_len: usize) -> fmt::Result {
    let max_len = f.width().unwrap_or(default_len);
    if max_len <= 1 {
        f.write_str("…")
    } else if max_len > unprotected.len() {
        f.write_str(unprotected)
    } else {
        match unprotected.char_indices().nth(max_len - 2) {
            Some((idx, c)) if idx + c.len_utf8() < unprotected.len() => {
                f.write_str(&unprotected[0..idx + c.len_utf8()])?;
                f.write_str("…")
            }
            _ => f.write_str(unprotected),
        }
    }
}

/// An opaque media access token
///
/// The value is redacted by `Debug` and `Display` unless the alternate
/// flag (`{:#}`) is given, so that tokens do not leak into logs.
#[braid(serde, debug = "owned", display = "owned")]
pub struct AccessToken;

limited_reveal!(AccessTokenRef: "ACCESS TOKEN", 8);

/// An invalid resource path
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidResourcePath {
    /// The resource path was the empty string
    #[error("resource path cannot be empty")]
    EmptyString,
    /// The resource path did not begin with `/`
    #[error("resource path must begin with '/'")]
    MissingLeadingSlash,
    /// The resource path contained a byte outside of the path-safe set
    #[error("invalid resource path byte at position {position}: 0x{value:02x}")]
    InvalidByte {
        /// The index in the resource path where the invalid byte was found
        position: usize,
        /// The invalid byte value
        value: u8,
    },
    /// The resource path contained a `.` or `..` directory segment
    #[error("resource path cannot contain '.' or '..' segments")]
    RelativeSegment,
    /// The resource path had no name before its extension
    #[error("resource path has no file name")]
    MissingFileName,
    /// The resource path did not end in a file extension
    #[error("resource path has no file extension")]
    MissingExtension,
    /// The resource path's file extension is not an accepted media type
    #[error("unsupported media extension '{0}'")]
    UnsupportedExtension(String),
}

/// The path of a protected media resource, such as `/videos/intro.mp4`
///
/// A resource path begins with `/`, is composed of ASCII alphanumerics,
/// `_`, `-`, `.`, and `/`, and ends with `.` followed by one of the
/// [`MEDIA_EXTENSIONS`]. Segments of `.` or `..` are not allowed.
#[braid(
    serde,
    validator,
    ref_doc = "A borrowed reference to a [`ResourcePath`]"
)]
pub struct ResourcePath;

impl aliri_braid::Validator for ResourcePath {
    type Error = InvalidResourcePath;

    fn validate(s: &str) -> Result<(), Self::Error> {
        if s.is_empty() {
            return Err(InvalidResourcePath::EmptyString);
        }

        let body = s
            .strip_prefix('/')
            .ok_or(InvalidResourcePath::MissingLeadingSlash)?;

        let (stem, extension) = body
            .rsplit_once('.')
            .ok_or(InvalidResourcePath::MissingExtension)?;

        // Offset by one for the leading slash
        if let Some((position, &value)) = stem
            .as_bytes()
            .iter()
            .enumerate()
            .find(|(_, &b)| !is_path_byte(b))
        {
            return Err(InvalidResourcePath::InvalidByte {
                position: position + 1,
                value,
            });
        }

        if stem.split('/').any(|segment| segment == "." || segment == "..") {
            return Err(InvalidResourcePath::RelativeSegment);
        }

        if stem.is_empty() || stem.ends_with('/') {
            return Err(InvalidResourcePath::MissingFileName);
        }

        if extension.is_empty() {
            return Err(InvalidResourcePath::MissingExtension);
        }

        if !MEDIA_EXTENSIONS
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
        {
            return Err(InvalidResourcePath::UnsupportedExtension(
                extension.to_owned(),
            ));
        }

        Ok(())
    }
}

#[inline]
fn is_path_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.' | b'/')
}

impl From<Infallible> for InvalidResourcePath {
    fn from(x: Infallible) -> Self {
        match x {}
    }
}

/// An invalid requester identifier
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidRequesterId {
    /// The requester identifier was the empty string
    #[error("requester identifier cannot be empty")]
    EmptyString,
    /// The requester identifier was too short or too long
    #[error(
        "requester identifier must be between {} and {} bytes, got {len}",
        REQUESTER_ID_MIN_LEN,
        REQUESTER_ID_MAX_LEN
    )]
    InvalidLength {
        /// The length of the rejected identifier
        len: usize,
    },
    /// The requester identifier contained a byte other than `[A-Za-z0-9_]`
    #[error("invalid requester identifier byte at position {position}: 0x{value:02x}")]
    InvalidByte {
        /// The index in the identifier where the invalid byte was found
        position: usize,
        /// The invalid byte value
        value: u8,
    },
}

/// The identifier of the party permitted to redeem a token
///
/// A requester identifier is 3 to 50 ASCII alphanumerics or underscores.
#[braid(
    serde,
    validator,
    ref_doc = "A borrowed reference to a [`RequesterId`]"
)]
pub struct RequesterId;

impl aliri_braid::Validator for RequesterId {
    type Error = InvalidRequesterId;

    fn validate(s: &str) -> Result<(), Self::Error> {
        if s.is_empty() {
            Err(InvalidRequesterId::EmptyString)
        } else if let Some((position, &value)) = s
            .as_bytes()
            .iter()
            .enumerate()
            .find(|(_, &b)| !(b.is_ascii_alphanumeric() || b == b'_'))
        {
            Err(InvalidRequesterId::InvalidByte { position, value })
        } else if !(REQUESTER_ID_MIN_LEN..=REQUESTER_ID_MAX_LEN).contains(&s.len()) {
            Err(InvalidRequesterId::InvalidLength { len: s.len() })
        } else {
            Ok(())
        }
    }
}

impl From<Infallible> for InvalidRequesterId {
    fn from(x: Infallible) -> Self {
        match x {}
    }
}
