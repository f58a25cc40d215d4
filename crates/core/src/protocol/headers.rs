//! Byte-level matching of the header lines that drive the client.
//!
//! Lines are raw `&[u8]` slices including their `\r\n` terminator, exactly as
//! read off the socket. Nothing here assumes UTF-8.

use crate::error::{MjpegError, Result};

/// JPEG Start-Of-Image marker.
pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

const MULTIPART_CONTENT_TYPE: &[u8] = b"content-type: multipart";
const CONTENT_LENGTH: &[u8] = b"content-length";

/// Case-insensitive (ASCII) substring search.
pub fn contains_ignore_case(line: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty()
        && line
            .windows(needle.len())
            .any(|window| window.eq_ignore_ascii_case(needle))
}

/// Exact substring search.
pub fn contains(line: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && line.windows(needle.len()).any(|window| window == needle)
}

/// True for an empty line or one holding only whitespace / `\r\n`.
pub fn is_blank(line: &[u8]) -> bool {
    line.trim_ascii().is_empty()
}

pub fn is_multipart_content_type(line: &[u8]) -> bool {
    contains_ignore_case(line, MULTIPART_CONTENT_TYPE)
}

pub fn is_content_length(line: &[u8]) -> bool {
    contains_ignore_case(line, CONTENT_LENGTH)
}

/// True when the trimmed line begins with the JPEG SOI marker.
pub fn starts_with_soi(line: &[u8]) -> bool {
    line.trim_ascii().starts_with(&JPEG_SOI)
}

/// Extract the boundary token from a `Content-Type: multipart/...` line.
///
/// The value is split on `;`, and the token is whatever follows the final `=`
/// of the first parameter that has one. Surrounding quotes are removed.
///
/// ```text
/// Content-Type: multipart/x-mixed-replace; boundary=frame   -> b"frame"
/// Content-Type: multipart/x-mixed-replace;boundary="--myb"  -> b"--myb"
/// ```
pub fn parse_boundary(line: &[u8]) -> Option<Vec<u8>> {
    let colon = line.iter().position(|&b| b == b':')?;
    let value = &line[colon + 1..];

    let param = value
        .split(|&b| b == b';')
        .skip(1)
        .find(|param| param.contains(&b'='))?;
    let eq = param.iter().rposition(|&b| b == b'=')?;

    let token = param[eq + 1..].trim_ascii();
    let token = token
        .strip_prefix(b"\"")
        .and_then(|t| t.strip_suffix(b"\""))
        .unwrap_or(token);

    (!token.is_empty()).then(|| token.to_vec())
}

/// Parse a chunk header line as `Content-Length: <n>`.
///
/// Returns `Ok(None)` when the line is some other header, and
/// [`MjpegError::Format`] when it is a length header whose value is not a
/// base-10 integer.
pub fn parse_content_length(line: &[u8]) -> Result<Option<usize>> {
    let Some(colon) = line.iter().position(|&b| b == b':') else {
        return Ok(None);
    };
    if !contains_ignore_case(&line[..colon], CONTENT_LENGTH) {
        return Ok(None);
    }

    let value = line[colon + 1..].trim_ascii();
    std::str::from_utf8(value)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .map(Some)
        .ok_or_else(|| {
            MjpegError::Format(format!(
                "non-numeric Content-Length: {:?}",
                String::from_utf8_lossy(value)
            ))
        })
}
