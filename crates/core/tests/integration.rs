//! Integration test: open a real TCP session against a loopback MJPEG server.
//!
//! Each test starts a one-shot server on an ephemeral port that records the
//! client's request, replies with a canned multipart stream, then closes.

use std::io::{BufRead, BufReader, Cursor, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use mjpeg::{MjpegError, ProtocolErrorKind, StreamSession};

const BOUNDARY: &str = "mjpegboundary";

fn encode_jpeg(width: u32, height: u32, shade: u8) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([shade, 128, 255 - shade]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Jpeg)
        .unwrap();
    out.into_inner()
}

fn preamble() -> Vec<u8> {
    format!(
        "HTTP/1.1 200 OK\r\n\
         Server: test-cam\r\n\
         Cache-Control: no-cache\r\n\
         Content-Type: multipart/x-mixed-replace; boundary={BOUNDARY}\r\n\
         \r\n"
    )
    .into_bytes()
}

fn part(jpeg: &[u8]) -> Vec<u8> {
    let mut data = format!(
        "--{BOUNDARY}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        jpeg.len()
    )
    .into_bytes();
    data.extend_from_slice(jpeg);
    data.extend_from_slice(b"\r\n");
    data
}

/// Serve `response` to the first client, sending its request text back over
/// the returned channel. The connection is held open until `hold` (if any)
/// receives a message or is dropped.
fn serve(
    response: Vec<u8>,
    hold: Option<mpsc::Receiver<()>>,
) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut request = String::new();
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap() == 0 {
                break;
            }
            request.push_str(&line);
            if line == "\r\n" {
                break;
            }
        }
        tx.send(request).unwrap();

        stream.write_all(&response).unwrap();
        stream.flush().unwrap();
        if let Some(hold) = hold {
            let _ = hold.recv();
        }
    });

    (format!("127.0.0.1:{port}"), rx)
}

#[test]
fn open_reads_every_frame_then_end_of_stream() {
    let mut response = preamble();
    for shade in [10u8, 80, 160, 240] {
        response.extend(part(&encode_jpeg(32, 24, shade)));
    }
    let (addr, requests) = serve(response, None);

    let url = format!("http://alice:secret@{addr}/?action=stream");
    let mut session = StreamSession::open(&url, 5).expect("open session");
    assert_eq!(session.boundary(), BOUNDARY.as_bytes());
    assert_eq!(session.skip_lines(), 1);

    let request = requests.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(
        request,
        "GET /?action=stream HTTP/1.1\r\n\
         Host: 127.0.0.1\r\n\
         Authorization: Basic YWxpY2U6c2VjcmV0\r\n\
         \r\n"
    );

    // the first part is consumed by the handshake
    for _ in 0..3 {
        let frame = session.next_frame().unwrap().expect("frame");
        assert_eq!(&frame.data[..2], &[0xFF, 0xD8]);
        let img = frame.image().expect("decoded image");
        assert_eq!((img.width(), img.height()), (32, 24));
    }
    assert!(session.next_frame().unwrap().is_none());
    assert_eq!(session.frames_read(), 3);
    session.close().unwrap();
}

/// mjpg-streamer puts an `X-Timestamp` header after `Content-Length`.
fn streamer_part(jpeg: &[u8], timestamp: &str) -> Vec<u8> {
    let mut data = format!(
        "--{BOUNDARY}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\
         X-Timestamp: {timestamp}\r\n\r\n",
        jpeg.len()
    )
    .into_bytes();
    data.extend_from_slice(jpeg);
    data.extend_from_slice(b"\r\n");
    data
}

#[test]
fn open_handles_timestamped_part_headers() {
    let mut response = preamble();
    for (i, shade) in [20u8, 90, 170, 230].into_iter().enumerate() {
        response.extend(streamer_part(&encode_jpeg(40, 30, shade), &format!("{i}.250000")));
    }
    let (addr, _requests) = serve(response, None);

    let url = format!("http://{addr}/?action=stream?dummy=param.mjpg");
    let mut session = StreamSession::open(&url, 5).unwrap();
    assert_eq!(session.skip_lines(), 2);

    let frames: Vec<_> = session.frames().collect::<Result<_, _>>().unwrap();
    assert_eq!(frames.len(), 3);
    for frame in &frames {
        assert_eq!(&frame.data[frame.len() - 2..], &[0xFF, 0xD9]);
        let img = frame.image().expect("decoded image");
        assert_eq!((img.width(), img.height()), (40, 30));
    }
}

#[test]
fn truncated_frame_over_tcp() {
    let jpeg = encode_jpeg(16, 16, 50);
    let mut response = preamble();
    response.extend(part(&jpeg));
    response.extend_from_slice(format!("--{BOUNDARY}\r\nContent-Length: 100\r\n\r\n").as_bytes());
    response.extend_from_slice(&[0x55; 40]);
    let (addr, _requests) = serve(response, None);

    let mut session = StreamSession::open(&format!("http://{addr}/"), 5).unwrap();
    match session.next_frame() {
        Err(MjpegError::TruncatedFrame { expected, received }) => {
            assert_eq!((expected, received), (100, 40));
        }
        Err(e) => panic!("expected TruncatedFrame, got {e}"),
        Ok(frame) => panic!("expected TruncatedFrame, got {:?}", frame.map(|f| f.len())),
    }
}

#[test]
fn non_multipart_response_is_protocol_error() {
    let response =
        b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 2\r\n\r\nok".to_vec();
    let (addr, _requests) = serve(response, None);

    match StreamSession::open(&format!("http://{addr}/index.html"), 5) {
        Err(MjpegError::Protocol { kind }) => assert_eq!(kind, ProtocolErrorKind::MissingBoundary),
        Err(e) => panic!("expected Protocol error, got {e}"),
        Ok(_) => panic!("expected Protocol error, got a session"),
    }
}

#[test]
fn connection_refused() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    assert!(matches!(
        StreamSession::open(&format!("http://{addr}/"), 2),
        Err(MjpegError::Connection(_))
    ));
}

#[test]
fn shutdown_handle_interrupts_blocked_read() {
    let mut response = preamble();
    response.extend(part(&encode_jpeg(8, 8, 0)));
    let (release, hold) = mpsc::channel();
    let (addr, _requests) = serve(response, Some(hold));

    let mut session = StreamSession::open(&format!("http://{addr}/"), 30).unwrap();
    let handle = session.shutdown_handle().unwrap();
    let interrupter = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        handle.shutdown().unwrap();
    });

    let started = Instant::now();
    let result = session.next_frame();
    assert!(
        started.elapsed() < Duration::from_secs(10),
        "read was not interrupted"
    );
    match result {
        Err(MjpegError::Connection(e)) => {
            assert_eq!(e.kind(), std::io::ErrorKind::ConnectionAborted)
        }
        Err(e) => panic!("expected an aborted connection, got {e}"),
        Ok(frame) => panic!(
            "local shutdown reported as {:?} instead of an error",
            frame.map(|f| f.len())
        ),
    }
    assert!(matches!(session.next_frame(), Err(MjpegError::Connection(_))));

    interrupter.join().unwrap();
    let _ = release.send(());
}

#[test]
fn read_timeout_surfaces_as_connection_error() {
    let mut response = preamble();
    response.extend(part(&encode_jpeg(8, 8, 0)));
    let (release, hold) = mpsc::channel();
    let (addr, _requests) = serve(response, Some(hold));

    let mut session = StreamSession::open(&format!("http://{addr}/"), 1).unwrap();
    let started = Instant::now();
    assert!(matches!(session.next_frame(), Err(MjpegError::Connection(_))));
    assert!(started.elapsed() < Duration::from_secs(10));

    let _ = release.send(());
}
