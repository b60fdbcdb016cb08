//! `Accept-Language` negotiation against the configured language list.

const FALLBACK_LANGUAGE: &str = "en";

/// Lower-cased, trimmed language tag with surrounding quotes removed.
pub fn normalize(tag: &str) -> String {
    tag.trim().trim_matches(|c| c == '"' || c == '\'').to_lowercase()
}

/// Whether `language` is one of `supported` after normalization.
pub fn is_supported(language: &str, supported: &[String]) -> bool {
    let language = normalize(language);
    !language.is_empty() && supported.iter().any(|s| normalize(s) == language)
}

/// Pick the best supported language for an `Accept-Language` header.
///
/// Tags are tried by descending quality, header order breaking ties. A tag matches
/// exactly or through its base language (`en-US` -> `en`). Without a match the
/// first supported language is returned, or `en` when none is configured.
pub fn negotiate(accept_language: &str, supported: &[String]) -> String {
    let supported: Vec<String> = supported
        .iter()
        .map(|s| normalize(s))
        .filter(|s| !s.is_empty())
        .collect();

    let mut tags: Vec<(String, f32)> = accept_language
        .split(',')
        .filter_map(|entry| {
            let mut parts = entry.split(';');
            let tag = normalize(parts.next()?);
            if tag.is_empty() {
                return None;
            }
            let quality = parts
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            (quality > 0.0).then_some((tag, quality))
        })
        .collect();
    // Stable, so equal qualities keep header order.
    tags.sort_by(|a, b| b.1.total_cmp(&a.1));

    for (tag, _) in &tags {
        if supported.contains(tag) {
            return tag.clone();
        }
        if let Some((base, _)) = tag.split_once('-')
            && supported.iter().any(|s| s == base)
        {
            return base.to_string();
        }
    }

    supported
        .into_iter()
        .next()
        .unwrap_or_else(|| FALLBACK_LANGUAGE.to_string())
}
