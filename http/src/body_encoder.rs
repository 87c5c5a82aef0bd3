use crate::{chunked_encoder::ChunkedEncoder, Body};
use futures_lite::io::AsyncRead;
use pin_project_lite::pin_project;
use std::{
    io,
    pin::Pin,
    task::{Context, Poll},
};

pin_project! {
    #[project = BodyEncoderProjection]
    /// An http encoder for a [`Body`], selected from the body's declared
    /// length: known lengths are copied through unframed, unknown lengths
    /// go through the [`ChunkedEncoder`]. You probably don't want to
    /// interact with this directly.
    #[derive(Debug)]
    pub enum BodyEncoder {
        /// a chunked body
        Chunked { #[pin] encoder: ChunkedEncoder<Body> },

        /// a fixed-length body
        Fixed { #[pin] body: Body },
    }
}

impl BodyEncoder {
    /// builds a body encoder for the provided [`Body`]
    pub fn new(body: Body) -> Self {
        match body.len() {
            Some(_) => Self::Fixed { body },
            None => Self::Chunked {
                encoder: ChunkedEncoder::new(body),
            },
        }
    }
}

impl AsyncRead for BodyEncoder {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        match self.project() {
            BodyEncoderProjection::Chunked { encoder } => encoder.poll_read(cx, buf),
            BodyEncoderProjection::Fixed { body } => body.poll_read(cx, buf),
        }
    }
}
