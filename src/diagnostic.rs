//! Diagnostic text for failed decompressions.
//!
//! Decompressors report problems on stderr in the conventional
//! `program: context: reason` shape, often over several lines. Callers want a
//! single short, capitalized reason, optionally folded into a MIME-type-like
//! token.

/// Reduces raw decompressor stderr to a single capitalized line.
///
/// Leading whitespace is skipped, the text is cut at the first newline and
/// then at the first `;`, and if a `:` remains only the text after the last
/// one is kept.
///
/// ```rust
/// use zmagic::diagnostic::normalize_stderr;
///
/// assert_eq!(
///     normalize_stderr(b"xz: (stdin): File format not recognized\n"),
///     "File format not recognized"
/// );
/// assert_eq!(
///     normalize_stderr(b"  bzip2: data integrity error; try -vv\nmore"),
///     "Data integrity error"
/// );
/// ```
pub fn normalize_stderr(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let mut line = text.trim_start();
    if let Some(end) = line.find('\n') {
        line = &line[..end];
    }
    if let Some(end) = line.find(';') {
        line = &line[..end];
    }
    if let Some(colon) = line.rfind(':') {
        line = line[colon + 1..].trim_start();
    }
    capitalize(line.trim_end())
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {
            let mut out = String::with_capacity(text.len());
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
            out
        }
        _ => text.to_string(),
    }
}

/// Formats a decompression failure for display in place of a file type.
///
/// Plain output reads `ERROR:[<method>: <message>]`. MIME output replaces
/// every non-alphanumeric byte of the message with `-` and reads
/// `application/x-decompression-error-<method>-<message>`.
///
/// ```rust
/// use zmagic::diagnostic::format_decompression_error;
///
/// assert_eq!(
///     format_decompression_error("bzlib", "bunzip error: not a bzip2 file", false),
///     "ERROR:[bzlib: bunzip error: not a bzip2 file]"
/// );
/// assert_eq!(
///     format_decompression_error("gzip", "Unexpected end of file", true),
///     "application/x-decompression-error-gzip-Unexpected-end-of-file"
/// );
/// ```
pub fn format_decompression_error(method: &str, message: &str, mime: bool) -> String {
    if !mime {
        return format!("ERROR:[{}: {}]", method, message);
    }
    let token: String = message
        .bytes()
        .map(|b| if b.is_ascii_alphanumeric() { char::from(b) } else { '-' })
        .collect();
    format!("application/x-decompression-error-{}-{}", method, token)
}
