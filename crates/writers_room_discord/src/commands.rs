//! Prefixed text commands understood by the bot.

/// A recognized bot command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    /// `start_session <participants> [@mentions...]`
    ///
    /// `participants` is zero when the count is missing or not a number, so
    /// the request is still echoed and then rejected like any other bad count.
    StartSession {
        /// Requested roster size
        participants: usize,
    },
    /// `share`
    Share,
    /// `delete`
    Delete,
    /// `test`
    Test,
}

impl BotCommand {
    /// Parse a message body into a command.
    ///
    /// Returns `None` for anything that is not a known command, including
    /// prefixed words the bot does not handle; such messages are ordinary
    /// chat and may be story contributions.
    pub fn parse(prefix: &str, content: &str) -> Option<Self> {
        let rest = content.trim_start().strip_prefix(prefix)?;
        let mut words = rest.split_whitespace();
        match words.next()? {
            "start_session" => Some(Self::StartSession {
                participants: words
                    .next()
                    .and_then(|count| count.parse().ok())
                    .unwrap_or_default(),
            }),
            "share" => Some(Self::Share),
            "delete" => Some(Self::Delete),
            "test" => Some(Self::Test),
            _ => None,
        }
    }

    /// Command name as typed after the prefix.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartSession { .. } => "start_session",
            Self::Share => "share",
            Self::Delete => "delete",
            Self::Test => "test",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_session_reads_the_count_and_ignores_mentions() {
        assert_eq!(
            BotCommand::parse("!", "!start_session 3 <@12> <@34>"),
            Some(BotCommand::StartSession { participants: 3 })
        );
    }

    #[test]
    fn bad_counts_read_as_zero() {
        for content in ["!start_session", "!start_session three", "!start_session -2"] {
            assert_eq!(
                BotCommand::parse("!", content),
                Some(BotCommand::StartSession { participants: 0 }),
                "{content}"
            );
        }
    }

    #[test]
    fn plain_commands() {
        assert_eq!(BotCommand::parse("!", "!share"), Some(BotCommand::Share));
        assert_eq!(BotCommand::parse("!", "  !delete now"), Some(BotCommand::Delete));
        assert_eq!(BotCommand::parse("!", "!test"), Some(BotCommand::Test));
        assert_eq!(BotCommand::parse("?", "?share"), Some(BotCommand::Share));
    }

    #[test]
    fn everything_else_is_chat() {
        assert_eq!(BotCommand::parse("!", "share"), None);
        assert_eq!(BotCommand::parse("!", "!shout"), None);
        assert_eq!(BotCommand::parse("!", "!"), None);
        assert_eq!(BotCommand::parse("!", "The dragon said !share"), None);
        assert_eq!(BotCommand::parse("?", "!share"), None);
    }

    #[test]
    fn names_round_trip() {
        for command in [
            BotCommand::StartSession { participants: 0 },
            BotCommand::Share,
            BotCommand::Delete,
            BotCommand::Test,
        ] {
            let typed = format!("!{} 2", command.name());
            assert_eq!(
                BotCommand::parse("!", &typed).map(|c| c.name()),
                Some(command.name())
            );
        }
    }
}
