use mime_guess::mime::{self, Mime};
use reqwest::Url;

/// Why a candidate filename was refused.
#[derive(Debug)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename is `..`.
    PathTraversal,
    /// Filename contains null bytes.
    NullByte,
    /// Filename starts with a dot (hidden file).
    Hidden,
    /// Filename contains control characters (CR, LF, etc.).
    ControlCharacter,
}

impl FilenameError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::PathTraversal => "Invalid filename: '..' is not allowed",
            Self::NullByte => "Invalid filename: null bytes are not allowed",
            Self::Hidden => "Invalid filename: hidden files (starting with '.') are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
        }
    }
}

/// Validates a flat filename (no directory components allowed).
///
/// Returns the trimmed name on success.
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    // The name ends up in a Content-Disposition header on download.
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed == ".." {
        return Err(FilenameError::PathTraversal);
    }

    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    Ok(trimmed)
}

/// Name announced by a `Content-Disposition` header value.
///
/// An RFC 5987 `filename*` parameter takes precedence over a plain `filename`.
pub fn filename_from_disposition(value: &str) -> Option<String> {
    let mut plain = None;

    for param in value.split(';') {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        let raw = raw.trim();

        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => {
                // charset'language'percent-encoded-value
                if let Some(decoded) = raw.splitn(3, '\'').nth(2).and_then(percent_decode) {
                    if !decoded.is_empty() {
                        return Some(decoded);
                    }
                }
            }
            "filename" => {
                let unquoted = raw.trim_matches('"');
                if !unquoted.is_empty() {
                    plain = Some(unquoted.to_string());
                }
            }
            _ => {}
        }
    }

    plain
}

/// Last path segment of `url`, if it looks like a filename (has an extension).
pub fn filename_from_url(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    let decoded = percent_decode(segment)?;
    decoded.contains('.').then_some(decoded)
}

/// `file_<millis>.<ext>`, with the extension taken from `content_type`.
pub fn synthesize_filename(content_type: Option<&str>, now_millis: i64) -> String {
    let ext = content_type
        .and_then(|ct| ct.parse::<Mime>().ok())
        .and_then(|mime| extension_for(&mime))
        .unwrap_or_else(|| "bin".to_string());
    format!("file_{now_millis}.{ext}")
}

/// Pick a safe filename for content fetched from `url`.
///
/// Tries the `Content-Disposition` header, then the URL path, then synthesizes
/// one from the content type. Candidates that are not flat filenames are skipped.
pub fn derive_filename(
    disposition: Option<&str>,
    url: &Url,
    content_type: Option<&str>,
    now_millis: i64,
) -> String {
    disposition
        .and_then(filename_from_disposition)
        .and_then(|name| validate_flat_filename(&name).ok().map(str::to_string))
        .or_else(|| {
            filename_from_url(url)
                .and_then(|name| validate_flat_filename(&name).ok().map(str::to_string))
        })
        .unwrap_or_else(|| synthesize_filename(content_type, now_millis))
}

fn extension_for(mime: &Mime) -> Option<String> {
    if mime.essence_str() == mime::APPLICATION_OCTET_STREAM.essence_str() {
        return None;
    }
    if let Some(ext) = mime_guess::get_mime_extensions(mime).and_then(|exts| exts.first()) {
        return Some((*ext).to_string());
    }

    let subtype = mime.subtype().as_str();
    subtype
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
        .then(|| subtype.to_ascii_lowercase())
}

fn percent_decode(input: &str) -> Option<String> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = input.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    String::from_utf8(out).ok()
}
