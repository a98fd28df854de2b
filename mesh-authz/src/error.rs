//! error types
//!

use std::convert::From;
use thiserror::Error;

/// the global error type for authorization checks
#[derive(Error, Clone, Debug, PartialEq)]
pub enum Auth {
    #[error("invalid token: {0}")]
    TokenInvalid(Format),
    #[error("token does not exist or was reset")]
    TokenNotExist,
    #[error("token is disabled")]
    TokenDisabled,
    #[error("user not found")]
    NoUser,
    #[error("user group not found")]
    NoUserGroup,
    #[error("operator has no permission on the requested resources")]
    NotPermission,
    #[error("access not allowed: {0}")]
    NotAllowedAccess(String),
    #[error("invalid principal: {0}")]
    InvalidPrincipal(String),
    #[error("configuration error: {0}")]
    Config(Config),
    #[error("directory error: {0}")]
    Directory(Directory),
}

impl Auth {
    /// errors that the anonymous downgrade policy may recover from
    ///
    /// everything else (disabled tokens, missing permissions, store failures)
    /// always propagates to the caller
    pub fn is_downgradable(&self) -> bool {
        matches!(
            self,
            Auth::TokenInvalid(_) | Auth::TokenNotExist | Auth::NoUser | Auth::NoUserGroup
        )
    }
}

impl From<Format> for Auth {
    fn from(e: Format) -> Self {
        Auth::TokenInvalid(e)
    }
}

impl From<Config> for Auth {
    fn from(e: Config) -> Self {
        Auth::Config(e)
    }
}

impl From<Directory> for Auth {
    fn from(e: Directory) -> Self {
        Auth::Directory(e)
    }
}

impl From<base64::DecodeError> for Format {
    fn from(e: base64::DecodeError) -> Self {
        let err = match e {
            base64::DecodeError::InvalidByte(offset, byte) => {
                Base64Error::InvalidByte(offset, byte)
            }
            base64::DecodeError::InvalidLength => Base64Error::InvalidLength,
            base64::DecodeError::InvalidLastSymbol(offset, byte) => {
                Base64Error::InvalidLastSymbol(offset, byte)
            }
        };

        Format::Base64(err)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Base64Error {
    InvalidByte(usize, u8),
    InvalidLength,
    InvalidLastSymbol(usize, u8),
}

impl std::fmt::Display for Base64Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            Base64Error::InvalidByte(index, byte) => {
                write!(f, "Invalid byte {}, offset {}.", byte, index)
            }
            Base64Error::InvalidLength => write!(f, "Encoded text cannot have a 6-bit remainder."),
            Base64Error::InvalidLastSymbol(index, byte) => {
                write!(f, "Invalid last symbol {}, offset {}.", byte, index)
            }
        }
    }
}

/// Errors related to the token's wire format
#[derive(Error, Clone, Debug, PartialEq)]
pub enum Format {
    #[error("cannot decode base64 token: {0}")]
    Base64(Base64Error),
    #[error("ciphertext is shorter than one block ({0} bytes)")]
    TooShort(usize),
    #[error("decrypted payload is not valid UTF-8")]
    NotUtf8,
    #[error("payload does not split into nonce and principal")]
    MissingNonceSeparator,
    #[error("principal does not split into kind and id")]
    MissingKindSeparator,
    #[error("unknown principal kind {0:?}")]
    UnknownKind(String),
    #[error("empty principal id")]
    EmptyPrincipalId,
}

/// configuration loading errors
#[derive(Error, Clone, Debug, PartialEq)]
pub enum Config {
    #[error("salt must be 16, 24 or 32 bytes long, got {0}")]
    InvalidSaltLength(usize),
    #[error("could not read configuration: {0}")]
    Io(String),
    #[error("could not parse configuration: {0}")]
    Parse(String),
}

/// errors reported by the principal directory
#[derive(Error, Clone, Debug, PartialEq)]
pub enum Directory {
    #[error("store failure: {0}")]
    Store(String),
    #[error("resync did not complete within {0:?}")]
    Timeout(std::time::Duration),
}
