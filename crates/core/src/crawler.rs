//! Known-crawler classification by `User-Agent`.
//!
//! Link-preview bots and search engines are matched with a case-insensitive
//! substring search over an ordered table; the first entry that matches wins.

/// `(lowercase substring, label)` pairs, checked in order.
pub const KNOWN_CRAWLERS: &[(&str, &str)] = &[
    ("facebookexternalhit", "facebook"),
    ("facebot", "facebook"),
    ("twitterbot", "twitter"),
    ("linkedinbot", "linkedin"),
    ("whatsapp", "whatsapp"),
    ("slackbot", "slack"),
    ("telegrambot", "telegram"),
    ("discordbot", "discord"),
    ("pinterest", "pinterest"),
    ("googlebot", "google"),
    ("bingbot", "bing"),
    ("applebot", "apple"),
    ("duckduckbot", "duckduckgo"),
    ("yandexbot", "yandex"),
    ("baiduspider", "baidu"),
];

/// Seconds crawler responses may be cached for.
pub const CRAWLER_CACHE_MAX_AGE: u32 = 3600;

/// Return the crawler label for a user agent, if it belongs to a known bot.
///
/// ```
/// use helix_research_core::crawler::classify;
///
/// assert_eq!(classify("facebookexternalhit/1.1"), Some("facebook"));
/// assert_eq!(classify("Mozilla/5.0 (Macintosh) Safari/605.1.15"), None);
/// ```
#[must_use]
pub fn classify(user_agent: &str) -> Option<&'static str> {
    if user_agent.is_empty() {
        return None;
    }
    let haystack = user_agent.to_ascii_lowercase();
    KNOWN_CRAWLERS
        .iter()
        .find(|(needle, _)| haystack.contains(*needle))
        .map(|&(_, label)| label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facebook() {
        assert_eq!(
            classify("facebookexternalhit/1.1 (+http://www.facebook.com/externalhit_uatext.php)"),
            Some("facebook")
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify("Mozilla/5.0 (compatible; GOOGLEBOT/2.1)"), Some("google"));
        assert_eq!(classify("Twitterbot/1.0"), Some("twitter"));
    }

    #[test]
    fn test_ordinary_browsers_pass() {
        assert_eq!(
            classify(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/126.0 Safari/537.36"
            ),
            None
        );
        assert_eq!(classify(""), None);
    }

    #[test]
    fn test_first_match_wins() {
        // Contains both "whatsapp" and "facebookexternalhit"
        assert_eq!(
            classify("WhatsApp/2.23 facebookexternalhit/1.1"),
            Some("facebook")
        );
    }

    #[test]
    fn test_table_is_lowercase() {
        assert!(
            KNOWN_CRAWLERS
                .iter()
                .all(|(needle, _)| needle.chars().all(|c| !c.is_ascii_uppercase()))
        );
    }

    #[test]
    fn test_idempotent() {
        let ua = "Mozilla/5.0 (compatible; bingbot/2.0)";
        assert_eq!(classify(ua), classify(ua));
    }
}
