//! `[groups]` lookup in a `servers` document.

use regex::Regex;
use tracing::debug;

use crate::ini::{IniDocument, IniSection};

/// Name of the section mapping group names to host patterns.
pub const GROUPS_SECTION: &str = "groups";

/// Returns the settings section of the first group whose pattern list
/// matches `host`.
///
/// Groups are tried in their declared order. A matching group without a
/// section of the same name yields `None`.
pub fn server_group<'a>(servers: &'a IniDocument, host: &str) -> Option<&'a IniSection> {
    let groups = servers.section(GROUPS_SECTION)?;
    let (group, _) = groups.iter().find(|(_, patterns)| matches(patterns, host))?;
    debug!(host, group, "host matched server group");
    servers.section(group)
}

/// Whether `host` matches any entry of the comma-separated `patterns` list.
///
/// An entry is `*`, an exact host name, or a pattern where each `*` stands
/// for any (possibly empty) run of characters. The whole host must match.
pub fn matches(patterns: &str, host: &str) -> bool {
    patterns
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .any(|pattern| match_pattern(pattern, host))
}

fn match_pattern(pattern: &str, host: &str) -> bool {
    if pattern == "*" || pattern == host {
        return true;
    }
    if !pattern.contains('*') {
        return false;
    }
    let expr = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    match Regex::new(&format!("^(?:{expr})$")) {
        Ok(re) => re.is_match(host),
        Err(err) => {
            debug!(pattern, error = %err, "ignoring unusable host pattern");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn wildcard_patterns_match_whole_host() {
        assert!(matches("*.example.com", "foo.example.com"));
        assert!(matches("192.168.0.*", "192.168.0.5"));
        assert!(!matches("*.example.com", "other.org"));
        assert!(!matches("192.168.0.*", "other.org"));
        assert!(!matches("*.example.com", "foo.example.com.evil.org"));
        assert!(matches("*", "anything.at.all"));
    }

    #[test]
    fn dots_are_literal() {
        assert!(!matches("192.168.0.*", "192x168.0.5"));
        assert!(!matches("a.b", "axb"));
    }

    #[test]
    fn pattern_lists_are_comma_separated_and_trimmed() {
        assert!(matches("svn.collab.net, *.collab.net", "www.collab.net"));
        assert!(matches("svn.collab.net, *.collab.net", "svn.collab.net"));
        assert!(!matches("svn.collab.net, *.collab.net", "collab.org"));
        assert!(!matches(" , ", "host"));
    }

    #[test]
    fn regex_metacharacters_in_patterns_are_escaped() {
        assert!(matches("host+(1)*", "host+(1)-a"));
        assert!(!matches("host+*", "hosttt"));
    }

    #[test]
    fn server_group_returns_first_matching_group_section() {
        let servers = IniDocument::parse_str(
            "[groups]\nfirst = *.example.com\nsecond = foo.example.com\n\
             [second]\nhttp-timeout = 2\n[first]\nhttp-timeout = 1\n",
        );
        let section = server_group(&servers, "foo.example.com").unwrap();
        assert_eq!(section.name(), "first");
        assert_eq!(section.get("http-timeout"), Some("1"));
        assert!(server_group(&servers, "other.org").is_none());
    }

    #[test]
    fn server_group_without_matching_section_is_none() {
        let servers = IniDocument::parse_str("[groups]\nlonely = *\n");
        assert!(server_group(&servers, "host").is_none());
        assert!(server_group(&IniDocument::new(), "host").is_none());
    }
}
