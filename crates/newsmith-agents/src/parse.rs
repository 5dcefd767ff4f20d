// SPDX-FileCopyrightText: 2026 Newsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing of LLM responses.
//!
//! Models wrap JSON in code fences, add stray prose, and disagree about
//! delimiters. Every parser here tolerates that and leaves the fallback
//! decision to the caller.

/// Strips common code-fence wrappers (```json ... ``` or ``` ... ```)
/// and surrounding whitespace.
pub fn strip_code_fences(response: &str) -> &str {
    let mut text = response.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parses a keyword list from a free-form response. Splits on commas,
/// newlines, semicolons and pipes, trims wrapping punctuation, drops
/// fragments of two characters or fewer, and de-duplicates preserving
/// first-seen order.
pub fn parse_keywords(response: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for part in response.split(|c| matches!(c, ',' | '\n' | ';' | '|')) {
        let keyword = part.trim().trim_matches(|c: char| {
            matches!(c, '"' | '\'' | '.' | ',' | '!' | '?' | ';' | ':' | '-' | '*')
        });
        let keyword = keyword.trim();
        if keyword.len() > 2 && !keywords.iter().any(|k| k.eq_ignore_ascii_case(keyword)) {
            keywords.push(keyword.to_string());
        }
    }
    keywords
}

/// Extracts the `ENHANCED_QUERY:` line from a query-expansion response.
pub fn parse_enhanced_query(response: &str) -> Option<String> {
    for line in response.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("ENHANCED_QUERY:") {
            let query = rest.trim();
            if !query.is_empty() {
                return Some(query.to_string());
            }
        }
    }
    None
}
