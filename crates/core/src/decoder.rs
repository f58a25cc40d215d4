//! JPEG decoding seam.
//!
//! The client hands every frame's bytes to a [`FrameDecoder`]. The default,
//! [`JpegDecoder`], produces an [`image::DynamicImage`]; any closure of the
//! form `FnMut(&[u8]) -> Result<I, DecodeError>` can be used instead, e.g. to
//! skip decoding entirely or to feed another imaging library.

use image::{DynamicImage, ImageFormat};

use crate::error::DecodeError;

/// Turns the raw bytes of one frame into an image.
pub trait FrameDecoder {
    type Image;

    fn decode(&mut self, jpeg: &[u8]) -> Result<Self::Image, DecodeError>;
}

impl<F, I> FrameDecoder for F
where
    F: FnMut(&[u8]) -> Result<I, DecodeError>,
{
    type Image = I;

    fn decode(&mut self, jpeg: &[u8]) -> Result<I, DecodeError> {
        self(jpeg)
    }
}

/// Decodes frames with the `image` crate's JPEG codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegDecoder;

impl FrameDecoder for JpegDecoder {
    type Image = DynamicImage;

    fn decode(&mut self, jpeg: &[u8]) -> Result<DynamicImage, DecodeError> {
        image::load_from_memory_with_format(jpeg, ImageFormat::Jpeg)
            .map_err(|e| DecodeError(e.to_string()))
    }
}
