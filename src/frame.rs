//! Video frame sources.
//!
//! Camera acquisition is outside this crate. A [`FrameSourceProvider`] opens a
//! stream asynchronously (permission prompts, device warm-up) and resolves
//! once frames with known dimensions are available; the resulting
//! [`FrameSource`] is then polled once per tick.

use std::future::Future;

use glam::UVec2;
use image::RgbaImage;

use crate::error::SetupError;

/// One captured video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Pixel data.
    pub image: RgbaImage,
    /// Sequence number assigned by the source.
    pub index: u64,
}

impl Frame {
    pub fn new(image: RgbaImage, index: u64) -> Self {
        Self { image, index }
    }

    /// Frame size in pixels.
    pub fn dimensions(&self) -> UVec2 {
        UVec2::new(self.image.width(), self.image.height())
    }
}

/// A live stream of frames.
pub trait FrameSource {
    /// Pixel dimensions of the frames this source yields.
    fn dimensions(&self) -> UVec2;

    /// The most recent frame, or `None` if nothing new is available.
    fn current_frame(&mut self) -> Option<Frame>;

    /// Release the underlying device. Must tolerate repeated calls.
    fn stop(&mut self);

    /// `false` once [`stop`](FrameSource::stop) has been called.
    fn is_live(&self) -> bool;
}

/// Opens a [`FrameSource`].
pub trait FrameSourceProvider {
    type Source: FrameSource;

    /// Acquire the device. Resolves once the first frame's dimensions are
    /// known.
    fn open(&self) -> impl Future<Output = Result<Self::Source, SetupError>>;
}
