// SPDX-FileCopyrightText: 2026 Tgrelay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text normalization shared by the title resolver, keyword matching, and
//! status previews.
//!
//! Titles and keywords compare equal under: trim, Unicode lowercasing,
//! folding `ё` to `е`, and collapsing runs of whitespace to a single space.

/// Normalize a title or keyword for comparison.
///
/// Idempotent: `normalize(normalize(s)) == normalize(s)`.
pub fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_space = false;
    for ch in raw.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() {
            out.push(' ');
        }
        pending_space = false;
        for low in ch.to_lowercase() {
            out.push(if low == 'ё' { 'е' } else { low });
        }
    }
    out
}

/// Bounded preview of a message body for status events. Truncates to
/// `max_chars` characters and appends an ellipsis when truncated.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

/// Clip a string to at most `max_chars` characters, without a marker.
/// Used for error messages bound for 4000-char storage columns.
pub fn clip(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_case_yo_and_whitespace() {
        // The three spellings the admin UI historically produced.
        let a = normalize("Тест  Канал");
        let b = normalize("тест канал");
        let c = normalize("ТЕСТ КАНАЛ");
        assert_eq!(a, "тест канал");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn normalize_treats_yo_as_ye() {
        assert_eq!(normalize("Ёжик"), normalize("ежик"));
        assert_eq!(normalize("ёлка"), "елка");
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize("  Mixed\tCase \u{00a0} Title ");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn normalize_trims_edges() {
        assert_eq!(normalize("  edges  "), "edges");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn preview_passes_short_text_through() {
        assert_eq!(preview("hello", 120), "hello");
    }

    #[test]
    fn preview_truncates_at_char_boundary_with_ellipsis() {
        let text = "привет".repeat(40); // 240 chars, multibyte
        let p = preview(&text, 120);
        assert_eq!(p.chars().count(), 121);
        assert!(p.ends_with('…'));
    }

    #[test]
    fn preview_exact_length_is_not_truncated() {
        let text = "x".repeat(120);
        assert_eq!(preview(&text, 120), text);
    }

    #[test]
    fn clip_bounds_length_without_marker() {
        assert_eq!(clip("abcdef", 3), "abc");
        assert_eq!(clip("ab", 3), "ab");
    }
}
