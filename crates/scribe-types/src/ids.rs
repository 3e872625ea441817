//! Type-safe identifier wrappers.
//!
//! Upstream systems are inconsistent about whether identifiers travel as
//! JSON strings or numbers (`"lead_id": 42` and `"lead_id": "42"` both
//! occur). Every ID here accepts either shape on input and serializes in
//! its canonical form on output.
//!
//! - Text keys ([`LeadId`], [`MeetingId`]) are opaque non-empty strings.
//! - Serial keys ([`RecordId`], [`EmployeeId`], [`OrganizationId`]) are
//!   database integers.

use serde::{Deserialize, Serialize};

/// Raw wire representation accepted for any identifier.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IdRepr {
    /// Identifier sent as a JSON string.
    Text(String),
    /// Identifier sent as a JSON integer.
    Number(i64),
}

/// Error returned when an identifier cannot be built from its wire form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identifier: {0}")]
pub struct InvalidId(pub String);

/// Generates a newtype wrapper around an opaque, non-empty string key of at
/// most `max_len` characters.
macro_rules! define_text_id {
    (
        $(#[$meta:meta])*
        $name:ident, max_len = $max:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "IdRepr")]
        pub struct $name(String);

        impl $name {
            /// Longest accepted identifier, in characters.
            pub const MAX_LEN: usize = $max;

            /// Build the identifier, rejecting empty, whitespace-only or
            /// overlong input.
            pub fn new(raw: impl Into<String>) -> Result<Self, InvalidId> {
                let raw = raw.into();
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(InvalidId(format!("{} must not be empty", stringify!($name))));
                }
                if trimmed.chars().count() > Self::MAX_LEN {
                    return Err(InvalidId(format!(
                        "{} must be at most {} characters",
                        stringify!($name),
                        Self::MAX_LEN
                    )));
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<IdRepr> for $name {
            type Error = InvalidId;

            fn try_from(repr: IdRepr) -> Result<Self, Self::Error> {
                match repr {
                    IdRepr::Text(s) => Self::new(s),
                    IdRepr::Number(n) => Self::new(n.to_string()),
                }
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

/// Generates a newtype wrapper around a database serial key.
macro_rules! define_serial_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "IdRepr")]
        pub struct $name(pub i64);

        impl $name {
            /// Return the inner integer value.
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl TryFrom<IdRepr> for $name {
            type Error = InvalidId;

            fn try_from(repr: IdRepr) -> Result<Self, Self::Error> {
                match repr {
                    IdRepr::Number(n) => Ok(Self(n)),
                    IdRepr::Text(s) => s.trim().parse::<i64>().map(Self).map_err(|e| {
                        InvalidId(format!("{} must be an integer, got {s:?}: {e}", stringify!($name)))
                    }),
                }
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_text_id! {
    /// Identifier of a lead (client); groups SOW versions into one chain.
    LeadId, max_len = 64
}

define_text_id! {
    /// Identifier of the meeting the answers were captured in.
    MeetingId, max_len = 64
}

define_serial_id! {
    /// Store-assigned identifier of one versioned SOW record.
    RecordId
}

define_serial_id! {
    /// Identifier of an employee (record creator or updater).
    EmployeeId
}

define_serial_id! {
    /// Identifier of an organization.
    OrganizationId
}
