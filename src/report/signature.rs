//! Freehand signature capture and rasterization.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use thiserror::Error;

/// Ink color used for strokes.
const INK: Rgb<u8> = Rgb([24, 24, 64]);

/// A single pointer position on the pad, in canvas pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Error)]
pub enum SignatureError {
    /// Saving an empty pad is a validation problem, not an I/O one.
    #[error("please provide a signature")]
    EmptyPad,
    #[error("could not encode signature image: {0}")]
    Encode(#[from] image::ImageError),
}

/// Capture state for one signature pad.
///
/// A stroke opens on pointer-down, grows on drag, and is committed on
/// pointer-up. Strokes are append-only until [`SignaturePad::clear`] resets
/// the whole pad. Rasterization renders the committed strokes plus any
/// stroke still in progress, and does not consume the pad; the owner clears
/// it once the raster has been taken.
#[derive(Clone, Debug)]
pub struct SignaturePad {
    width: u32,
    height: u32,
    jpeg_quality: u8,
    strokes: Vec<Vec<Point>>,
    current: Option<Vec<Point>>,
}

impl SignaturePad {
    pub fn new(width: u32, height: u32, jpeg_quality: u8) -> Self {
        Self {
            width,
            height,
            jpeg_quality: jpeg_quality.clamp(1, 100),
            strokes: Vec::new(),
            current: None,
        }
    }

    /// Pointer-down: open a new stroke. An unfinished stroke is committed
    /// first, so a missed pointer-up cannot lose ink.
    pub fn stroke_start(&mut self, p: Point) {
        self.stroke_end();
        self.current = Some(vec![self.clamp(p)]);
    }

    /// Pointer-drag: extend the open stroke. Ignored when no stroke is open.
    pub fn stroke_move(&mut self, p: Point) {
        let p = self.clamp(p);
        if let Some(stroke) = self.current.as_mut() {
            stroke.push(p);
        }
    }

    /// Pointer-up: commit the open stroke.
    pub fn stroke_end(&mut self) {
        if let Some(stroke) = self.current.take() {
            if !stroke.is_empty() {
                self.strokes.push(stroke);
            }
        }
    }

    /// Discard all strokes and return to the empty state.
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.current = None;
    }

    /// True when nothing has been drawn since the last clear.
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.current.as_ref().is_none_or(|s| s.is_empty())
    }

    fn clamp(&self, p: Point) -> Point {
        Point {
            x: p.x.clamp(0.0, (self.width.saturating_sub(1)) as f32),
            y: p.y.clamp(0.0, (self.height.saturating_sub(1)) as f32),
        }
    }

    /// Render the stroke set onto a white canvas and encode it as JPEG.
    ///
    /// Deterministic: the same stroke set always encodes to the same bytes.
    /// An empty pad is rejected before any rendering happens.
    pub fn rasterize(&self) -> Result<Vec<u8>, SignatureError> {
        if self.is_empty() {
            return Err(SignatureError::EmptyPad);
        }

        let mut canvas = RgbImage::from_pixel(self.width, self.height, Rgb([255, 255, 255]));
        for stroke in self.strokes.iter().chain(self.current.as_ref()) {
            draw_stroke(&mut canvas, stroke);
        }

        let mut out = Vec::new();
        let mut encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, self.jpeg_quality);
        encoder.encode(
            canvas.as_raw(),
            self.width,
            self.height,
            image::ExtendedColorType::Rgb8,
        )?;
        Ok(out)
    }
}

/// Draw one stroke as connected segments with a little thickness. A stroke
/// of a single point becomes a dot.
fn draw_stroke(canvas: &mut RgbImage, stroke: &[Point]) {
    if stroke.len() == 1 {
        draw_dot(canvas, stroke[0]);
        return;
    }
    for pair in stroke.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        for (dx, dy) in [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)] {
            draw_line_segment_mut(
                canvas,
                (a.x + dx, a.y + dy),
                (b.x + dx, b.y + dy),
                INK,
            );
        }
    }
}

fn draw_dot(canvas: &mut RgbImage, p: Point) {
    let (w, h) = canvas.dimensions();
    for dy in 0..2u32 {
        for dx in 0..2u32 {
            let x = (p.x as u32).saturating_add(dx);
            let y = (p.y as u32).saturating_add(dy);
            if x < w && y < h {
                canvas.put_pixel(x, y, INK);
            }
        }
    }
}
