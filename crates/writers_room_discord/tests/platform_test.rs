//! Discord-facing helpers that need no live connection.

use serenity::all::Permissions;
use writers_room::{Access, JOIN_EMOJI};
use writers_room_discord::{
    BotCommand, DISCORD_MAX_MESSAGE_LENGTH, access_permissions, emoji_reaction, reaction_emoji,
    split_message,
};

#[test]
fn short_messages_are_sent_whole() {
    assert_eq!(
        split_message("Here's the final story:\nOnce upon a time.", 2000),
        vec!["Here's the final story:\nOnce upon a time.".to_string()]
    );
}

#[test]
fn long_stories_split_on_line_breaks() {
    let line = "x".repeat(1200);
    let story = format!("{line}\n{line}\n{line}");
    let chunks = split_message(&story, DISCORD_MAX_MESSAGE_LENGTH);
    assert_eq!(chunks, vec![line.clone(), line.clone(), line]);
}

#[test]
fn unbroken_text_splits_at_the_limit_on_char_boundaries() {
    let text = "é".repeat(4500);
    let chunks = split_message(&text, DISCORD_MAX_MESSAGE_LENGTH);
    let sizes: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
    assert_eq!(sizes, vec![2000, 2000, 500]);
    assert_eq!(chunks.concat(), text);
}

#[test]
fn hidden_access_denies_viewing_and_sending() {
    let (allow, deny) = access_permissions(Access::NONE);
    assert!(allow.is_empty());
    assert!(deny.contains(Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES));
}

#[test]
fn read_only_access_can_follow_along() {
    let (allow, deny) = access_permissions(Access {
        read: true,
        write: false,
    });
    assert!(allow.contains(Permissions::VIEW_CHANNEL));
    assert!(!allow.contains(Permissions::SEND_MESSAGES));
    assert_eq!(deny, Permissions::SEND_MESSAGES);
}

#[test]
fn join_reactions_round_trip() {
    assert_eq!(
        reaction_emoji(&emoji_reaction(JOIN_EMOJI)),
        Some(JOIN_EMOJI.to_string())
    );
}

#[test]
fn commands_follow_the_configured_prefix() {
    let prefix = writers_room::WritersRoomConfig::default().command_prefix;
    assert_eq!(
        BotCommand::parse(&prefix, "!start_session 2 <@99>"),
        Some(BotCommand::StartSession { participants: 2 })
    );
    assert_eq!(BotCommand::parse(&prefix, "Once upon a time"), None);
}
