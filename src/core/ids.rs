//! Identifiers
//!
//! String-backed newtypes for every entity the engine references.
//! All of them implement `Ord` so they can key a `BTreeMap`.

use std::fmt;
use serde::{Serialize, Deserialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap an existing identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh random identifier (UUID v4).
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Borrow as `&str`.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Unique match identifier.
    MatchId
);

string_id!(
    /// Unique team identifier.
    TeamId
);

string_id!(
    /// Unique player identifier.
    PlayerId
);

string_id!(
    /// Tournament a fixture belongs to.
    TournamentId
);

string_id!(
    /// Unique score event identifier.
    EventId
);
