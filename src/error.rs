use anyhow::anyhow;
use serde::Serialize;

use crate::models::Permission;

pub type Result<T> = std::result::Result<T, LibError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Forbidden,
    InvalidInput,
    NotFound,
    Unknown,
}

/// Structured payload for security-relevant denials, so callers can surface a
/// distinguishable reason without parsing message strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AccessDenialDetails {
    InvalidToken,
    GuestIdentityRequired,
    PermissionDenied {
        required: Permission,
        granted: Permission,
    },
}

#[derive(Debug)]
pub struct LibError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub public: &'static str,
    pub details: Option<AccessDenialDetails>,
    pub source: anyhow::Error,
}

impl LibError {
    pub fn invalid(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            code: "invalid_input",
            public,
            details: None,
            source,
        }
    }

    pub fn invalid_with_details(
        code: &'static str,
        public: &'static str,
        details: AccessDenialDetails,
        source: anyhow::Error,
    ) -> Self {
        Self {
            kind: ErrorKind::InvalidInput,
            code,
            public,
            details: Some(details),
            source,
        }
    }

    pub fn forbidden(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Forbidden,
            code: "forbidden",
            public,
            details: None,
            source,
        }
    }

    pub fn forbidden_with_details(
        code: &'static str,
        public: &'static str,
        details: AccessDenialDetails,
        source: anyhow::Error,
    ) -> Self {
        Self {
            kind: ErrorKind::Forbidden,
            code,
            public,
            details: Some(details),
            source,
        }
    }

    pub fn not_found(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::NotFound,
            code: "not_found",
            public,
            details: None,
            source,
        }
    }

    pub fn not_found_with_details(
        code: &'static str,
        public: &'static str,
        details: AccessDenialDetails,
        source: anyhow::Error,
    ) -> Self {
        Self {
            kind: ErrorKind::NotFound,
            code,
            public,
            details: Some(details),
            source,
        }
    }

    pub fn unknown(public: &'static str, source: anyhow::Error) -> Self {
        Self {
            kind: ErrorKind::Unknown,
            code: "unknown_error",
            public,
            details: None,
            source,
        }
    }

    pub fn message(public: &'static str) -> Self {
        Self::unknown(public, anyhow!(public))
    }
}

impl std::fmt::Display for LibError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.public)
    }
}

impl std::error::Error for LibError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}
