//! The HTTP side of an MJPEG stream.
//!
//! An MJPEG camera answers a single `GET` with a never-ending
//! `multipart/x-mixed-replace` body:
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: multipart/x-mixed-replace; boundary=frame\r\n
//! \r\n
//! --frame\r\n
//! Content-Type: image/jpeg\r\n
//! Content-Length: 48213\r\n
//! \r\n
//! <48213 bytes of JPEG, starting FF D8>\r\n
//! --frame\r\n
//! ...
//! ```
//!
//! Only what is needed to follow that layout is implemented: building the
//! request ([`request`]) and recognising the handful of header lines the
//! client cares about ([`headers`]). Everything is matched on raw bytes
//! because header lines and JPEG payloads share one stream.

pub mod headers;
pub mod request;

pub use request::HttpRequest;
