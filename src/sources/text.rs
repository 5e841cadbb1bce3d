// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text cleanup shared by providers

/// Truncate to at most `max_chars` characters on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Collapse runs of whitespace into single spaces and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Simple HTML entity decoding with tag stripping
pub fn html_decode(s: &str) -> String {
    let decoded = s
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ");

    let stripped = decoded
        .split('<')
        .map(|part| match part.find('>') {
            Some(pos) => &part[pos + 1..],
            None => part,
        })
        .collect::<Vec<_>>()
        .join("");

    // &amp; last so "&amp;lt;" stays literal
    collapse_whitespace(&stripped.replace("&amp;", "&"))
}
