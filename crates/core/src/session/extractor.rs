//! Frame extraction: find the next part and slice out its JPEG bytes.
//!
//! Each part on the wire looks like:
//!
//! ```text
//! --<boundary>\r\n
//! <part headers, one of them Content-Length: N>\r\n
//! <skip_lines lines>
//! <exactly N bytes of JPEG>
//! ```
//!
//! The header scan runs in line mode; once `N` is known the reader switches
//! to byte mode for exactly `N` bytes.

use std::io::Read;

use crate::error::{MjpegError, Result};
use crate::protocol::headers;
use crate::transport::StreamReader;

/// Read the next frame's raw bytes.
///
/// Returns `Ok(None)` when the peer closes the stream during the header scan.
pub fn read_frame<S: Read>(
    reader: &mut StreamReader<S>,
    boundary: &[u8],
    skip_lines: i32,
    max_frame_len: usize,
) -> Result<Option<Vec<u8>>> {
    let Some(len) = read_frame_length(reader, boundary)? else {
        return Ok(None);
    };

    if len > max_frame_len {
        return Err(MjpegError::Format(format!(
            "Content-Length {len} exceeds limit of {max_frame_len} bytes"
        )));
    }

    // an early close here is caught by the exact read below
    for _ in 0..skip_lines.max(0) {
        if reader.read_line()?.is_none() {
            break;
        }
    }

    reader.read_exact_or_truncated(len).map(Some)
}

/// Skip to the next boundary line, then parse the part's `Content-Length`.
fn read_frame_length<S: Read>(
    reader: &mut StreamReader<S>,
    boundary: &[u8],
) -> Result<Option<usize>> {
    loop {
        match reader.read_line()? {
            Some(line) if headers::contains(line, boundary) => break,
            Some(_) => {}
            None => return Ok(None),
        }
    }

    loop {
        let Some(line) = reader.read_line()? else {
            return Ok(None);
        };
        if headers::is_blank(line) {
            return Err(MjpegError::Format(
                "part headers ended without a Content-Length".to_string(),
            ));
        }
        // a zero length is treated as absent
        if let Some(len @ 1..) = headers::parse_content_length(line)? {
            return Ok(Some(len));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const MAX: usize = 1024;

    fn part(boundary: &str, payload: &[u8]) -> Vec<u8> {
        let mut data = format!(
            "--{boundary}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
            payload.len()
        )
        .into_bytes();
        data.extend_from_slice(payload);
        data.extend_from_slice(b"\r\n");
        data
    }

    fn reader(data: Vec<u8>) -> StreamReader<Cursor<Vec<u8>>> {
        StreamReader::new(Cursor::new(data))
    }

    #[test]
    fn reads_exactly_declared_length() {
        let payload = [0xFF, 0xD8, b'\n', 3, 4, 5, b'\r', b'\n', 0xFF, 0xD9];
        let mut data = part("frame", &payload);
        data.extend_from_slice(b"--frame\r\n");
        let mut r = reader(data);

        let frame = read_frame(&mut r, b"frame", 1, MAX).unwrap().unwrap();
        assert_eq!(frame.len(), 10);
        assert_eq!(frame, payload);
    }

    #[test]
    fn skips_leftover_bytes_before_boundary() {
        let mut data = vec![0x12, 0x34, b'\r', b'\n', 0xFF, 0xD9, b'\r', b'\n'];
        data.extend(part("frame", b"abc"));
        let mut r = reader(data);
        assert_eq!(read_frame(&mut r, b"frame", 1, MAX).unwrap().unwrap(), b"abc");
    }

    #[test]
    fn end_of_stream_while_scanning() {
        let mut r = reader(Vec::new());
        assert!(read_frame(&mut r, b"frame", 1, MAX).unwrap().is_none());

        let mut r = reader(b"garbage\r\nmore garbage".to_vec());
        assert!(read_frame(&mut r, b"frame", 1, MAX).unwrap().is_none());

        let mut r = reader(b"--frame\r\nContent-Type: image/jpeg\r\n".to_vec());
        assert!(read_frame(&mut r, b"frame", 1, MAX).unwrap().is_none());
    }

    #[test]
    fn truncated_payload() {
        let mut data = b"--frame\r\nContent-Length: 100\r\n\r\n".to_vec();
        data.extend_from_slice(&[0xAB; 40]);
        let mut r = reader(data);
        match read_frame(&mut r, b"frame", 1, MAX) {
            Err(MjpegError::TruncatedFrame { expected, received }) => {
                assert_eq!((expected, received), (100, 40));
            }
            other => panic!("expected TruncatedFrame, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_length() {
        let mut r = reader(b"--frame\r\nContent-Length: lots\r\n\r\nxx".to_vec());
        assert!(matches!(
            read_frame(&mut r, b"frame", 1, MAX),
            Err(MjpegError::Format(_))
        ));
    }

    #[test]
    fn missing_length() {
        let mut r = reader(b"--frame\r\nContent-Type: image/jpeg\r\n\r\nxx".to_vec());
        assert!(matches!(
            read_frame(&mut r, b"frame", 1, MAX),
            Err(MjpegError::Format(_))
        ));

        let mut r = reader(b"--frame\r\nContent-Length: 0\r\n\r\n".to_vec());
        assert!(matches!(
            read_frame(&mut r, b"frame", 1, MAX),
            Err(MjpegError::Format(_))
        ));
    }

    #[test]
    fn oversized_length() {
        let mut r = reader(b"--frame\r\nContent-Length: 4096\r\n\r\n".to_vec());
        assert!(matches!(
            read_frame(&mut r, b"frame", 1, MAX),
            Err(MjpegError::Format(_))
        ));
    }

    #[test]
    fn honours_skip_lines() {
        let mut data = b"--frame\r\nContent-Length: 3\r\nX-Timestamp: 7\r\n\r\n".to_vec();
        data.extend_from_slice(b"xyz\r\n");
        let mut r = reader(data);
        assert_eq!(read_frame(&mut r, b"frame", 2, MAX).unwrap().unwrap(), b"xyz");
    }

    #[test]
    fn zero_skip_lines() {
        let mut r = reader(b"--frame\r\nContent-Length: 3\r\nxyz".to_vec());
        assert_eq!(read_frame(&mut r, b"frame", 0, MAX).unwrap().unwrap(), b"xyz");

        let mut r = reader(b"--frame\r\nContent-Length: 3\r\nxyz".to_vec());
        assert_eq!(read_frame(&mut r, b"frame", -1, MAX).unwrap().unwrap(), b"xyz");
    }
}
