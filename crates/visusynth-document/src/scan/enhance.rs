// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pre-recognition enhancement: contrast stretch, grayscale conversion and
// global binarization, producing a monochrome PNG for the recognition engine.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tracing::{debug, info, instrument};
use visusynth_core::error::{Result, VisusynthError};

/// Fixed contrast gain applied around the channel midpoint.
pub const CONTRAST_GAIN: f64 = 1.5;

/// Luma values strictly above this become white; everything else black.
pub const BINARIZE_THRESHOLD: u8 = 128;

/// Makes an image easier to recognize by pushing it to pure black and white.
///
/// The transform runs in one pass over an RGBA copy of the decoded image:
///
/// 1. contrast stretch `v -> clamp((v - 128) * 1.5 + 128)` per colour channel
/// 2. luma `0.299 R + 0.587 G + 0.114 B` of the stretched channels
/// 3. threshold at 128, written to all three colour channels
///
/// Alpha is carried through untouched. Every intermediate is quantized to a
/// byte with round-half-to-even, so the output is reproducible bit for bit.
pub struct ImageEnhancer {
    /// Working copy; never shared with the caller.
    image: RgbaImage,
    /// Source name used in error messages.
    file_name: String,
}

impl ImageEnhancer {
    // -- Construction ---------------------------------------------------------

    /// Decode raw image bytes (PNG, JPEG, TIFF, ...).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8], file_name: &str) -> Result<Self> {
        let image = image::load_from_memory(data).map_err(|err| VisusynthError::Decode {
            file: file_name.to_string(),
            detail: err.to_string(),
        })?;
        debug!(
            width = image.width(),
            height = image.height(),
            "Image decoded for enhancement"
        );
        Ok(Self::from_dynamic(&image, file_name))
    }

    /// Take an RGBA copy of an already-decoded image.
    pub fn from_dynamic(image: &DynamicImage, file_name: &str) -> Self {
        Self {
            image: image.to_rgba8(),
            file_name: file_name.to_string(),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Consume the enhancer and return the working buffer.
    pub fn into_rgba(self) -> RgbaImage {
        self.image
    }

    // -- Pipeline -------------------------------------------------------------

    /// Apply the stretch → luma → threshold transform to every pixel.
    #[instrument(skip(self), fields(file = %self.file_name))]
    pub fn enhance(mut self) -> Self {
        for pixel in self.image.pixels_mut() {
            *pixel = enhance_pixel(*pixel);
        }
        debug!("Enhancement pass complete");
        self
    }

    /// Encode the working buffer as PNG.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        self.image
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|err| VisusynthError::Decode {
                file: self.file_name.clone(),
                detail: format!("failed to encode enhanced image: {err}"),
            })?;
        Ok(out.into_inner())
    }

    /// Decode, enhance and re-encode in one call.
    ///
    /// The output always has the input's pixel dimensions and is always PNG,
    /// whatever the input format was.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn enhance_bytes(data: &[u8], file_name: &str) -> Result<Vec<u8>> {
        let enhanced = Self::from_bytes(data, file_name)?.enhance();
        let (width, height) = enhanced.dimensions();
        let png = enhanced.to_png_bytes()?;
        info!(width, height, png_bytes = png.len(), "Image enhanced");
        Ok(png)
    }
}

/// Enhance a single RGBA pixel.
pub fn enhance_pixel(pixel: Rgba<u8>) -> Rgba<u8> {
    let [r, g, b, a] = pixel.0;
    let (r, g, b) = (stretch(r), stretch(g), stretch(b));
    let luma = quantize(0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64);
    let value = if luma > BINARIZE_THRESHOLD { 255 } else { 0 };
    Rgba([value, value, value, a])
}

fn stretch(channel: u8) -> u8 {
    quantize((channel as f64 - 128.0) * CONTRAST_GAIN + 128.0)
}

fn quantize(value: f64) -> u8 {
    value.clamp(0.0, 255.0).round_ties_even() as u8
}

// -- Tests --------------------------------------------------------------------
