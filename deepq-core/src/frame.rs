//! Preprocessed frames and stacks of consecutive frames.
use crate::error::DqnError;
use anyhow::Result;
use ndarray::{Array2, Array4, ArrayView2, ArrayViewMut3};
use std::sync::Arc;

/// The number of consecutive frames in a [`StackedInput`].
pub const FRAME_STACK: usize = 4;

/// An immutable grayscale frame.
///
/// Clones share the pixel storage, so one frame can be referenced by all the
/// stacked inputs it appears in.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame(Arc<Array2<u8>>);

impl Frame {
    /// Constructs a frame from row-major pixel intensities.
    ///
    /// Fails if `data.len() != height * width`.
    pub fn from_vec(height: usize, width: usize, data: Vec<u8>) -> Result<Self> {
        let len = data.len();
        let pixels = Array2::from_shape_vec((height, width), data).map_err(|_| {
            DqnError::ShapeMismatch {
                expected: vec![height * width],
                actual: vec![len],
            }
        })?;
        Ok(Self(Arc::new(pixels)))
    }

    /// Returns `[height, width]`.
    pub fn shape(&self) -> [usize; 2] {
        let (h, w) = self.0.dim();
        [h, w]
    }

    /// Returns a view of the pixels.
    pub fn view(&self) -> ArrayView2<'_, u8> {
        self.0.view()
    }
}

/// [`FRAME_STACK`] consecutive frames of the same shape, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct StackedInput([Frame; FRAME_STACK]);

impl StackedInput {
    /// Stacks frames, oldest first.
    ///
    /// Fails if the frames do not share the same shape.
    pub fn new(frames: [Frame; FRAME_STACK]) -> Result<Self> {
        let expected = frames[0].shape();
        if let Some(frame) = frames.iter().find(|f| f.shape() != expected) {
            return Err(DqnError::ShapeMismatch {
                expected: expected.to_vec(),
                actual: frame.shape().to_vec(),
            }
            .into());
        }
        Ok(Self(frames))
    }

    /// Repeats a single frame, as at the first step of an episode.
    pub fn repeat(frame: Frame) -> Self {
        Self(std::array::from_fn(|_| frame.clone()))
    }

    /// Returns the frames, oldest first.
    pub fn frames(&self) -> &[Frame; FRAME_STACK] {
        &self.0
    }

    /// Returns the most recent frame.
    pub fn latest(&self) -> &Frame {
        &self.0[FRAME_STACK - 1]
    }

    /// Returns the shape shared by all frames.
    pub fn frame_shape(&self) -> [usize; 2] {
        self.0[0].shape()
    }

    /// Returns the successor stack: the oldest frame is dropped and `next` is appended.
    pub fn advance(&self, next: &Frame) -> Result<Self> {
        if next.shape() != self.frame_shape() {
            return Err(DqnError::ShapeMismatch {
                expected: self.frame_shape().to_vec(),
                actual: next.shape().to_vec(),
            }
            .into());
        }
        Ok(self.shifted(next))
    }

    /// Same as [`StackedInput::advance`] for a frame already known to match.
    pub(crate) fn shifted(&self, next: &Frame) -> Self {
        let mut frames = self.0.clone();
        frames.rotate_left(1);
        frames[FRAME_STACK - 1] = next.clone();
        Self(frames)
    }

    fn write_into(&self, mut dst: ArrayViewMut3<f32>) {
        for (mut plane, frame) in dst.outer_iter_mut().zip(self.0.iter()) {
            plane.zip_mut_with(&frame.view(), |d, &s| *d = f32::from(s));
        }
    }
}

/// Stacks inputs into a tensor of shape `(batch, FRAME_STACK, height, width)`.
///
/// All inputs must share the frame shape of the first one.
pub fn batch_inputs<'a, I>(inputs: I) -> Result<Array4<f32>>
where
    I: IntoIterator<Item = &'a StackedInput>,
    I::IntoIter: ExactSizeIterator,
{
    let inputs = inputs.into_iter();
    let n = inputs.len();
    let mut inputs = inputs.peekable();
    let [h, w] = match inputs.peek() {
        Some(input) => input.frame_shape(),
        None => return Ok(Array4::zeros((0, FRAME_STACK, 0, 0))),
    };

    let mut batch = Array4::zeros((n, FRAME_STACK, h, w));
    for (dst, input) in batch.outer_iter_mut().zip(inputs) {
        if input.frame_shape() != [h, w] {
            return Err(DqnError::ShapeMismatch {
                expected: vec![h, w],
                actual: input.frame_shape().to_vec(),
            }
            .into());
        }
        input.write_into(dst);
    }
    Ok(batch)
}
