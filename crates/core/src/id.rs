// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Row identifiers.
//!
//! Every persisted row is keyed by a store-assigned integer. The newtypes
//! keep a build id from being passed where a step id is expected.

/// Define a newtype ID wrapper around `u64`.
///
/// Generates `new()`, `get()`, `Display`, `FromStr`, and `From<u64>`
/// implementations. Serializes transparently as a number.
///
/// ```ignore
/// define_row_id! {
///     /// Doc comment for the ID type.
///     pub struct MyId;
/// }
/// ```
#[macro_export]
macro_rules! define_row_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u64>().map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

define_row_id! {
    /// One triggered run of a pipeline.
    pub struct BuildId;
}

define_row_id! {
    /// A `BuildJob` row.
    pub struct BuildJobId;
}

define_row_id! {
    /// A `BuildStep` row. Log chunks reference steps by this id.
    pub struct BuildStepId;
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
