//! Conversions between serenity's model types and the session core's.

use serenity::model::channel::ReactionType;
use writers_room::{ChannelId, GuildId, MessageId, UserId};

/// A core identifier with a serenity counterpart.
///
/// Serenity identifiers are non-zero; every core identifier handed to
/// [`SerenityId::to_serenity`] originates from Discord or from validated
/// configuration.
pub trait SerenityId: Sized {
    /// The serenity identifier type.
    type Serenity;

    /// Convert into the serenity identifier.
    fn to_serenity(self) -> Self::Serenity;

    /// Convert from the serenity identifier.
    fn from_serenity(id: Self::Serenity) -> Self;
}

macro_rules! serenity_id {
    ($core:ty => $serenity:ty) => {
        impl SerenityId for $core {
            type Serenity = $serenity;

            fn to_serenity(self) -> $serenity {
                <$serenity>::new(self.get())
            }

            fn from_serenity(id: $serenity) -> Self {
                Self::new(id.get())
            }
        }
    };
}

serenity_id!(UserId => serenity::model::id::UserId);
serenity_id!(ChannelId => serenity::model::id::ChannelId);
serenity_id!(MessageId => serenity::model::id::MessageId);
serenity_id!(GuildId => serenity::model::id::GuildId);

/// The unicode emoji of a reaction, if it is one.
///
/// Custom guild emoji never match a session affordance, so they map to `None`.
pub fn reaction_emoji(reaction: &ReactionType) -> Option<String> {
    match reaction {
        ReactionType::Unicode(emoji) => Some(emoji.clone()),
        _ => None,
    }
}

/// Reaction payload for a unicode emoji.
pub fn emoji_reaction(emoji: &str) -> ReactionType {
    ReactionType::Unicode(emoji.to_string())
}
