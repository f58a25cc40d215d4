//! Blocking MJPEG-over-HTTP stream client.
//!
//! ```no_run
//! use mjpeg::StreamSession;
//!
//! let mut session = StreamSession::open("http://camera.local:8080/?action=stream", 10)?;
//! while let Some(frame) = session.next_frame()? {
//!     match frame.image() {
//!         Some(img) => println!("{}x{} ({} bytes)", img.width(), img.height(), frame.len()),
//!         None => eprintln!("undecodable frame ({} bytes)", frame.len()),
//!     }
//! }
//! # Ok::<(), mjpeg::MjpegError>(())
//! ```

pub mod decoder;
pub mod endpoint;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

pub use decoder::{FrameDecoder, JpegDecoder};
pub use endpoint::Endpoint;
pub use error::{DecodeError, MjpegError, ProtocolErrorKind, Result};
pub use session::{ClientConfig, Frame, Frames, StreamSession};
pub use transport::ShutdownHandle;
