use regex::Regex;

use super::regex::{CHANNEL_MENTION, ROLE_MENTION, SNOWFLAKE, USER_MENTION};

fn capture_id(regex: &Regex, text: &str) -> Option<u64> {
    regex.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Extracts the ID from a `<@id>` or `<@!id>` mention.
pub fn user_mention_to_id(text: &str) -> Option<u64> {
    capture_id(&USER_MENTION, text)
}

/// Extracts the ID from a `<#id>` mention.
pub fn channel_mention_to_id(text: &str) -> Option<u64> {
    capture_id(&CHANNEL_MENTION, text)
}

/// Extracts the ID from a `<@&id>` mention.
pub fn role_mention_to_id(text: &str) -> Option<u64> {
    capture_id(&ROLE_MENTION, text)
}

/// Parses a bare snowflake ID. Short numbers are not treated as IDs, so that names such as
/// `2024` still resolve by name.
pub fn snowflake(text: &str) -> Option<u64> {
    if SNOWFLAKE.is_match(text) {
        text.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_mentions() {
        assert_eq!(user_mention_to_id("<@123456789012345678>"), Some(123456789012345678));
        assert_eq!(user_mention_to_id("<@!123456789012345678>"), Some(123456789012345678));
        assert_eq!(user_mention_to_id("<@&123456789012345678>"), None);
        assert_eq!(user_mention_to_id("someone"), None);
    }

    #[test]
    fn channel_and_role_mentions() {
        assert_eq!(channel_mention_to_id("<#42>"), Some(42));
        assert_eq!(role_mention_to_id("<@&42>"), Some(42));
        assert_eq!(role_mention_to_id("<@42>"), None);
    }

    #[test]
    fn snowflakes() {
        assert_eq!(snowflake("123456789012345678"), Some(123456789012345678));
        assert_eq!(snowflake("2024"), None);
        assert_eq!(snowflake("12345678901234567a"), None);
    }
}
