//! Listing page parser: anchors → identifier set.

use std::collections::BTreeSet;

use channelkeys_shared::{ChannelKeysError, Identifier, Result};
use regex::Regex;
use scraper::{Html, Selector};

/// Compiled anchor selector plus the `href` pattern whose first capture
/// group is the identifier.
#[derive(Debug, Clone)]
pub struct IdentifierPattern {
    selector: Selector,
    id_re: Regex,
}

impl IdentifierPattern {
    /// Compile a selector and id pattern. Bad input is a config error since
    /// both come from configuration.
    pub fn new(selector: &str, id_pattern: &str) -> Result<Self> {
        let selector = Selector::parse(selector).map_err(|e| {
            ChannelKeysError::config(format!("invalid listing selector '{selector}': {e:?}"))
        })?;
        let id_re = Regex::new(id_pattern).map_err(|e| {
            ChannelKeysError::config(format!("invalid identifier pattern '{id_pattern}': {e}"))
        })?;
        if id_re.captures_len() < 2 {
            return Err(ChannelKeysError::config(format!(
                "identifier pattern '{id_pattern}' needs a capture group"
            )));
        }
        Ok(Self { selector, id_re })
    }
}

/// Collect the distinct identifiers linked from `html`.
///
/// Anchors matching the selector whose `href` lacks the pattern are ignored.
pub(crate) fn parse_identifiers(html: &str, pattern: &IdentifierPattern) -> BTreeSet<Identifier> {
    let doc = Html::parse_document(html);

    doc.select(&pattern.selector)
        .filter_map(|el| el.value().attr("href"))
        .filter_map(|href| pattern.id_re.captures(href))
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| Identifier::new(m.as_str()).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_pattern() -> IdentifierPattern {
        IdentifierPattern::new(r#"a[href*="play.php?id="]"#, "id=([a-fA-F0-9]+)").unwrap()
    }

    fn ids(set: &BTreeSet<Identifier>) -> Vec<&str> {
        set.iter().map(Identifier::as_str).collect()
    }

    #[test]
    fn duplicate_anchors_collapse() {
        let html = r#"<div class="channel"><a href="https://tv.example.com/play.php?id=AB12">One</a></div>
                      <div class="channel"><a href="/play.php?id=AB12">Again</a></div>"#;
        let found = parse_identifiers(html, &default_pattern());
        assert_eq!(ids(&found), vec!["AB12"]);
    }

    #[test]
    fn unrelated_links_ignored() {
        let html = r#"<a href="/about">About</a>
                      <a href="/play.php?id=ff00">Ch</a>
                      <a href="/watch?id=1234">Other</a>
                      <a>no href</a>"#;
        let found = parse_identifiers(html, &default_pattern());
        assert_eq!(ids(&found), vec!["ff00"]);
    }

    #[test]
    fn non_hex_identifier_skipped() {
        let html = r#"<a href="/play.php?id=zzz">Bad</a><a href="/play.php?id=0a1b">Good</a>"#;
        let found = parse_identifiers(html, &default_pattern());
        assert_eq!(ids(&found), vec!["0a1b"]);
    }

    #[test]
    fn identifier_stops_at_non_hex() {
        let html = r#"<a href="/play.php?id=AB12&amp;lang=en">Ch</a>"#;
        let found = parse_identifiers(html, &default_pattern());
        assert_eq!(ids(&found), vec!["AB12"]);
    }

    #[test]
    fn container_selector_narrows_matches() {
        let pattern =
            IdentifierPattern::new(r#"div.channel a[href*="play.php?id="]"#, "id=([a-fA-F0-9]+)")
                .unwrap();
        let html = r#"<div class="channel"><a href="/play.php?id=aa">In</a></div>
                      <nav><a href="/play.php?id=bb">Out</a></nav>"#;
        let found = parse_identifiers(html, &pattern);
        assert_eq!(ids(&found), vec!["aa"]);
    }

    #[test]
    fn empty_listing_yields_nothing() {
        assert!(parse_identifiers("<html><body></body></html>", &default_pattern()).is_empty());
    }

    #[test]
    fn invalid_selector_is_config_error() {
        let err = IdentifierPattern::new("a[", "id=(x)").unwrap_err();
        assert!(matches!(err, ChannelKeysError::Config { .. }));
    }

    #[test]
    fn pattern_without_group_is_config_error() {
        let err = IdentifierPattern::new("a", "id=[0-9]+").unwrap_err();
        assert!(err.to_string().contains("capture group"));
    }
}
