use percent_encoding::percent_decode_str;

use crate::ArtifactKind;

const MAX_FILENAME_CHARS: usize = 120;

/// Extracts the suggested file name from a `Content-Disposition` header value.
///
/// `filename*=` (RFC 5987, percent-encoded) wins over plain `filename=`. The
/// result is sanitized; `None` when the header carries no usable name.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for param in header.split(';').map(str::trim) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                // charset'language'percent-encoded
                let encoded = value.trim().splitn(3, '\'').nth(2).unwrap_or(value);
                extended = Some(
                    percent_decode_str(encoded.trim_matches('"'))
                        .decode_utf8_lossy()
                        .into_owned(),
                );
            }
            "filename" => plain = Some(value.trim().trim_matches('"').to_string()),
            _ => {}
        }
    }

    extended
        .or(plain)
        .map(|name| sanitize_filename(&name))
        .filter(|name| !name.is_empty())
}

/// Name used when the service does not suggest one: `{stem}-{kind}.{ext}`.
pub fn fallback_filename(stem: &str, kind: Option<ArtifactKind>) -> String {
    let stem = sanitize_filename(stem);
    let stem = if stem.is_empty() { "download" } else { &stem };
    match kind {
        Some(ArtifactKind::View) => format!("{stem}.html"),
        Some(ArtifactKind::FullArchive) | None => format!("{stem}.zip"),
        Some(ArtifactKind::Images) => format!("{stem}-images.zip"),
        Some(ArtifactKind::Html) => format!("{stem}-html.zip"),
    }
}

/// Windows-safe file name: forbidden characters and path separators become
/// `_`, runs of `_` collapse, reserved device names get a suffix.
pub fn sanitize_filename(input: &str) -> String {
    // Only the last path component of a suggested name is ever used.
    let base = input.rsplit(['/', '\\']).next().unwrap_or(input);
    let cleaned: String = base
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);

    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars().take(MAX_FILENAME_CHARS) {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }

    let stem_len = compacted.find('.').unwrap_or(compacted.len());
    if is_reserved_windows_name(&compacted[..stem_len]) {
        compacted.insert(stem_len, '_');
    }
    compacted
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
