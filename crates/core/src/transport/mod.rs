//! Socket plumbing for the stream client.
//!
//! - **TCP** ([`tcp`]): connecting with a timeout, and a [`ShutdownHandle`]
//!   for interrupting a blocked session from another thread.
//!
//! - **Reader** ([`reader`]): one buffered cursor over the socket that is
//!   read either a line at a time (HTTP and part headers) or an exact number
//!   of bytes (JPEG payloads). Nothing ever seeks backward.

pub mod reader;
pub mod tcp;

pub use reader::StreamReader;
pub use tcp::ShutdownHandle;
