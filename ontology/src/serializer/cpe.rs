//! CPE 2.3 formatted string to CPE 2.2 URI binding.
//!
//! Platform references are stored in the 2.3 formatted-string binding
//! (`cpe:2.3:a:vendor:product:version:...`) and rendered in the compressed
//! URI binding (`cpe:/a:vendor:product:version`) the platform ontology uses
//! for its individual names.

/// Number of components after the `cpe:2.3:` header.
const COMPONENTS: usize = 11;

/// Converts a CPE 2.3 formatted string to its URI binding.
///
/// Trailing unspecified (`*`) components are dropped; `-` becomes the empty
/// NA marker; the four extended attributes (`sw_edition`, `target_sw`,
/// `target_hw`, `other`) are packed into the edition with `~` when any of
/// them is set. Input that is not a 2.3 formatted string is returned
/// trimmed and otherwise unchanged.
#[must_use]
pub fn to_uri(formatted: &str) -> String {
    let formatted = formatted.trim();
    let Some(rest) = formatted.strip_prefix("cpe:2.3:") else {
        return formatted.to_string();
    };
    let mut parts = split_components(rest);
    parts.resize(COMPONENTS, "*".to_string());

    let mut uri: Vec<String> = parts[..6].iter().map(|c| uri_component(c)).collect();
    let extended = &parts[7..11];
    let edition = if extended.iter().all(|c| c == "*") {
        uri_component(&parts[5])
    } else {
        let mut packed = format!("~{}", uri_component(&parts[5]));
        for c in extended {
            packed.push('~');
            packed.push_str(&uri_component(c));
        }
        packed
    };
    uri[5] = edition;
    uri.push(uri_component(&parts[6]));

    while uri.last().is_some_and(String::is_empty) {
        uri.pop();
    }
    format!("cpe:/{}", uri.join(":"))
}

/// Splits on `:` except where the colon is escaped with a backslash.
fn split_components(s: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push(c);
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            ':' => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

fn uri_component(c: &str) -> String {
    match c {
        "*" => String::new(),
        "-" => "-".to_string(),
        _ => {
            let mut out = String::with_capacity(c.len());
            let mut chars = c.chars();
            while let Some(ch) = chars.next() {
                match ch {
                    '\\' => {
                        if let Some(escaped) = chars.next() {
                            out.push_str(&percent(escaped));
                        }
                    }
                    '?' => out.push_str("%01"),
                    '*' => out.push_str("%02"),
                    _ => out.push(ch.to_ascii_lowercase()),
                }
            }
            out
        }
    }
}

fn percent(c: char) -> String {
    if c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-' {
        c.to_ascii_lowercase().to_string()
    } else {
        let mut buf = [0u8; 4];
        c.encode_utf8(&mut buf)
            .bytes()
            .map(|b| format!("%{b:02x}"))
            .collect()
    }
}
