use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use mjpeg::{MjpegError, StreamSession};

/// mjpg-streamer wants a dummy parameter so some clients treat the URL as MJPEG.
const DEFAULT_URL: &str = "http://localhost:8080/?action=stream?dummy=param.mjpg";

#[derive(Parser)]
#[command(
    name = "mjpeg-fps",
    about = "Measure the frame rate of an MJPEG-over-HTTP stream"
)]
struct Args {
    /// Stream URL, optionally with user:password@ for Basic auth
    #[arg(default_value = DEFAULT_URL)]
    url: String,

    /// Number of frames to time
    #[arg(long, short, default_value_t = 50)]
    frames: u32,

    /// Connect and read timeout in seconds
    #[arg(long, short, default_value_t = mjpeg::session::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "stream failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), MjpegError> {
    tracing::info!(url = %args.url, frames = args.frames, "capturing");

    let mut session = StreamSession::open(&args.url, args.timeout)?;

    let (width, height) = match session.next_frame()? {
        Some(frame) => {
            let img = frame.into_image()?;
            (img.width(), img.height())
        }
        None => {
            tracing::warn!("stream ended before the first frame");
            return session.close();
        }
    };
    tracing::info!("Resolution: {width}x{height}");

    if width > 0 && height > 0 {
        tracing::info!("Calculate FPS using {} frames", args.frames);
        let start = Instant::now();
        let mut captured = 0u32;
        while captured < args.frames {
            match session.next_frame()? {
                Some(_) => captured += 1,
                None => {
                    tracing::warn!(captured, "stream ended early");
                    break;
                }
            }
        }
        let elapsed = start.elapsed().as_secs_f64();
        if captured > 0 && elapsed > 0.0 {
            let fps = f64::from(captured) / elapsed;
            tracing::info!("Calculated {fps:4.1} FPS, elapsed time: {elapsed:4.2} seconds");
        }
    }

    session.close()
}
