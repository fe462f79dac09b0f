//! Text encoding for Turtle string literals.
//!
//! Catalog text arrives with arbitrary line breaks and indentation. Every
//! literal is flattened to a single logical line before it is quoted.
//! Multi-paragraph annotations (content history, bibliographic references)
//! join their paragraphs with the `\n` escape marker instead of physical line
//! breaks, so a decoded literal still reads as separate paragraphs.

/// Characters treated as line boundaries when flattening.
const LINE_BREAKS: &[char] = &[
    '\n', '\r', '\u{0b}', '\u{0c}', '\u{1c}', '\u{1d}', '\u{1e}', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Collapses a multi-line text into one line.
///
/// Each physical line is trimmed; blank lines are dropped and the remaining
/// lines are joined with a single space.
#[must_use]
pub fn flatten(raw: &str) -> String {
    raw.split(LINE_BREAKS)
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Escapes backslash and double quote so `s` can sit inside `"..."`.
#[must_use]
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out
}

/// Flattens and escapes raw text into the body of a double-quoted literal.
///
/// The result never contains a physical line break, an unescaped `"` or a
/// lone `\`. Empty input yields an empty string.
#[must_use]
pub fn escape(raw: &str) -> String {
    quote(&flatten(raw))
}

/// Encodes a sequence of paragraphs as one literal body.
///
/// Paragraphs are separated by the `\n` escape marker. Leading tab
/// indentation of a paragraph is kept as `\t` escapes; the rest of the
/// paragraph goes through [`escape`].
#[must_use]
pub fn escape_paragraphs<I, S>(paragraphs: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    paragraphs
        .into_iter()
        .map(|p| {
            let p = p.as_ref();
            let body = p.trim_start_matches('\t');
            let indent = p.len() - body.len();
            format!("{}{}", "\\t".repeat(indent), escape(body))
        })
        .collect::<Vec<_>>()
        .join("\\n")
}

/// Makes `s` usable as the local part of a prefixed name (`:local`).
///
/// ASCII letters, digits, `_` and `-` pass through; anything else becomes `_`.
/// A leading `-` is not allowed in a Turtle local name and is replaced too.
#[must_use]
pub fn local_name(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for (i, c) in s.trim().chars().enumerate() {
        if c.is_ascii_alphanumeric() || c == '_' || (c == '-' && i > 0) {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    if out.is_empty() {
        "_".to_string()
    } else {
        out
    }
}
