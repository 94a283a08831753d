//! URL-safe aliases for tags and categories.

/// Derives an alias from a meta name: lowercase, whitespace runs become a
/// single `-`, and everything outside `[a-z0-9\u{4e00}-\u{9fa5}-]` is dropped.
pub fn generate_alias(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut alias = String::with_capacity(lowered.len());
    let mut in_whitespace = false;

    for ch in lowered.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                alias.push('-');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if is_alias_char(ch) {
            alias.push(ch);
        }
    }

    alias
}

/// Like [`generate_alias`], but yields `None` when nothing survives.
pub fn alias_or_none(name: &str) -> Option<String> {
    let alias = generate_alias(name);
    (!alias.is_empty()).then_some(alias)
}

fn is_alias_char(ch: char) -> bool {
    ch.is_ascii_lowercase()
        || ch.is_ascii_digit()
        || ch == '-'
        || ('\u{4e00}'..='\u{9fa5}').contains(&ch)
}
