//! Snowflake identifiers for platform objects.

use serde::{Deserialize, Serialize};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Serialize,
            Deserialize,
            derive_more::Display,
            derive_more::From,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wrap a raw snowflake.
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Raw snowflake value.
            pub const fn get(self) -> u64 {
                self.0
            }
        }
    };
}

snowflake!(
    /// A user (member, bot or the initiator).
    UserId
);
snowflake!(
    /// A text channel.
    ChannelId
);
snowflake!(
    /// A message within a channel.
    MessageId
);
snowflake!(
    /// A guild (server) hosting session channels.
    GuildId
);
