//! Platform identifiers.
//!
//! Every object on the chat platform is addressed by a 64-bit snowflake.
//! Each kind of object gets its own newtype so a user id can never be
//! passed where a channel id is expected.

use std::fmt;

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(pub u64);

        impl $name {
            /// Creates an id from its raw snowflake.
            #[must_use]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw snowflake.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

snowflake_id!(
    /// Identifies a user (human or bot).
    UserId,
    "UserId"
);
snowflake_id!(
    /// Identifies a text channel or direct-message channel.
    ChannelId,
    "ChannelId"
);
snowflake_id!(
    /// Identifies a guild (server).
    GuildId,
    "GuildId"
);
snowflake_id!(
    /// Identifies a message.
    MessageId,
    "MessageId"
);
snowflake_id!(
    /// Identifies a guild role.
    RoleId,
    "RoleId"
);
snowflake_id!(
    /// Identifies an interaction payload.
    InteractionId,
    "InteractionId"
);
