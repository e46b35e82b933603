use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use imageproc::definitions::{Clamp, Image};
use imageproc::filter::separable_filter_equal;
use imageproc::map::map_subpixels;
use log::debug;
use rayon::prelude::*;
use tempfile::NamedTempFile;

use crate::utils::{IdCardError, PreprocessConfig};

/// ImageProcessor turns a card photograph into a two-level image for OCR:
/// grayscale, local contrast equalisation, smoothing, Gaussian adaptive
/// threshold and a non-local means pass.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Decode an uploaded image from memory.
    pub fn decode(image_bytes: &[u8]) -> Result<DynamicImage, IdCardError> {
        image::load_from_memory(image_bytes)
            .map_err(|e| IdCardError::ImageDecodeError(format!("Failed to load image: {}", e)))
    }

    /// Decode then preprocess in one step.
    pub fn process_bytes(image_bytes: &[u8], config: &PreprocessConfig) -> Result<GrayImage, IdCardError> {
        let image = Self::decode(image_bytes)?;
        Self::preprocess(&image, config)
    }

    /// Produce a single-channel image whose pixels are all 0 or 255, with the
    /// dimensions of the input.
    pub fn preprocess(image: &DynamicImage, config: &PreprocessConfig) -> Result<GrayImage, IdCardError> {
        config.validate()?;
        if image.width() == 0 || image.height() == 0 {
            return Err(IdCardError::ImageProcessingError("Image has no pixels".to_string()));
        }
        debug!("Preprocessing {}x{} image", image.width(), image.height());

        let gray = image.to_luma8();
        let contrast = Self::clahe(&gray, config.clahe_clip_limit, config.clahe_tile_grid);
        let blurred = Self::gaussian_blur(&contrast, config.blur_kernel);
        let binary = Self::adaptive_threshold(&blurred, config.threshold_block_size, config.threshold_bias);
        let denoised = Self::denoise(
            &binary,
            config.denoise_strength,
            config.denoise_template_window,
            config.denoise_search_window,
        );

        debug!("Image preprocessing complete");
        Ok(denoised)
    }

    /// Contrast limited adaptive histogram equalisation over a `grid` x `grid`
    /// layout of tiles, bilinearly blending the mappings of neighbouring tiles.
    pub fn clahe(image: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
        let (width, height) = image.dimensions();
        let tile_w = (width + grid - 1) / grid;
        let tile_h = (height + grid - 1) / grid;
        let tiles_x = (width + tile_w - 1) / tile_w;
        let tiles_y = (height + tile_h - 1) / tile_h;

        let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
        for ty in 0..tiles_y {
            for tx in 0..tiles_x {
                let x_end = ((tx + 1) * tile_w).min(width);
                let y_end = ((ty + 1) * tile_h).min(height);
                luts.push(Self::tile_lut(image, tx * tile_w, ty * tile_h, x_end, y_end, clip_limit));
            }
        }
        let lut = |tx: usize, ty: usize| &luts[ty * tiles_x as usize + tx];

        let axis = |pos: u32, tile: u32, tiles: u32| -> (usize, usize, f32) {
            let f = (pos as f32 + 0.5) / tile as f32 - 0.5;
            if f <= 0.0 {
                return (0, 0, 0.0);
            }
            let lo = (f.floor() as u32).min(tiles - 1);
            let hi = (lo + 1).min(tiles - 1);
            (lo as usize, hi as usize, f - f.floor())
        };

        let mut result = GrayImage::new(width, height);
        for y in 0..height {
            let (ty0, ty1, ay) = axis(y, tile_h, tiles_y);
            for x in 0..width {
                let (tx0, tx1, ax) = axis(x, tile_w, tiles_x);
                let v = image.get_pixel(x, y)[0] as usize;

                let top = lut(tx0, ty0)[v] * (1.0 - ax) + lut(tx1, ty0)[v] * ax;
                let bottom = lut(tx0, ty1)[v] * (1.0 - ax) + lut(tx1, ty1)[v] * ax;
                let value = top * (1.0 - ay) + bottom * ay;
                result.put_pixel(x, y, Luma([value.round().clamp(0.0, 255.0) as u8]));
            }
        }
        result
    }

    /// Clipped histogram of one tile turned into an intensity mapping.
    fn tile_lut(image: &GrayImage, x_start: u32, y_start: u32, x_end: u32, y_end: u32, clip_limit: f32) -> [f32; 256] {
        let mut histogram = [0u32; 256];
        let mut area = 0u32;
        for y in y_start..y_end {
            for x in x_start..x_end {
                histogram[image.get_pixel(x, y)[0] as usize] += 1;
                area += 1;
            }
        }

        let mut lut = [0f32; 256];
        if area == 0 {
            return lut;
        }

        let clip = ((clip_limit * area as f32 / 256.0) as u32).max(1);
        let mut excess = 0u32;
        for bin in histogram.iter_mut() {
            if *bin > clip {
                excess += *bin - clip;
                *bin = clip;
            }
        }
        let share = excess / 256;
        let remainder = (excess % 256) as usize;
        for (i, bin) in histogram.iter_mut().enumerate() {
            *bin += share + u32::from(i < remainder);
        }

        let scale = 255.0 / area as f32;
        let mut cumulative = 0u32;
        for (i, bin) in histogram.iter().enumerate() {
            cumulative += bin;
            lut[i] = cumulative as f32 * scale;
        }
        lut
    }

    /// Normalised 1-D Gaussian of odd `size`; sigma follows the usual
    /// `0.3 * ((size - 1) / 2 - 1) + 0.8` rule for a size-only kernel.
    pub fn gaussian_kernel(size: u32) -> Vec<f32> {
        let sigma = 0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
        let center = (size / 2) as f32;
        let mut kernel: Vec<f32> = (0..size)
            .map(|i| {
                let d = i as f32 - center;
                (-(d * d) / (2.0 * sigma * sigma)).exp()
            })
            .collect();
        let sum: f32 = kernel.iter().sum();
        kernel.iter_mut().for_each(|k| *k /= sum);
        kernel
    }

    /// Filtered in floating point and rounded once, so a blur never darkens
    /// the image by truncation.
    pub fn gaussian_blur(image: &GrayImage, size: u32) -> GrayImage {
        let kernel = Self::gaussian_kernel(size);
        let image: Image<Luma<f32>> = map_subpixels(image, |v| v as f32);
        let smooth = separable_filter_equal(&image, kernel.as_slice());
        map_subpixels(&smooth, |v: f32| <u8 as Clamp<f32>>::clamp(v.round()))
    }

    /// White where a pixel is brighter than its Gaussian-weighted
    /// neighbourhood minus `bias`, black elsewhere.
    pub fn adaptive_threshold(image: &GrayImage, block_size: u32, bias: f32) -> GrayImage {
        let local_mean = Self::gaussian_blur(image, block_size);
        let mut result = GrayImage::new(image.width(), image.height());
        for (x, y, pixel) in image.enumerate_pixels() {
            let threshold = local_mean.get_pixel(x, y)[0] as f32 - bias;
            let value = if pixel[0] as f32 > threshold { 255 } else { 0 };
            result.put_pixel(x, y, Luma([value]));
        }
        result
    }

    /// Non-local means: every pixel becomes a weighted mean of the pixels in
    /// its search window, weighted by how similar their surrounding patches
    /// are. The result is snapped back to two levels.
    pub fn denoise(image: &GrayImage, strength: f32, template_window: u32, search_window: u32) -> GrayImage {
        if Self::denoise_is_identity(image, strength, template_window, search_window) {
            debug!("Two-level image with strength {}: non-local means leaves it unchanged", strength);
            return image.clone();
        }
        Self::weighted_means(image, strength, template_window, search_window)
    }

    /// True when the image holds only 0 and 255 and every patch that differs
    /// from the centre patch gets a weight too small to move any pixel across
    /// the snapping threshold. The weighted mean then snaps back to the input.
    fn denoise_is_identity(image: &GrayImage, strength: f32, template_window: u32, search_window: u32) -> bool {
        if !Self::is_binary(image) {
            return false;
        }
        // One differing pixel in a full patch is the closest a different patch gets.
        let gap = 255.0f64;
        let area = (template_window as f64).powi(2);
        let min_distance = gap * gap / area;
        let max_weight = (-min_distance / (strength as f64).powi(2)).exp();
        let neighbours = (search_window as f64).powi(2) - 1.0;
        neighbours * max_weight * gap < 127.0
    }

    /// Full weighted-mean pass. Patch distances are integer sums of squared
    /// differences, one offset at a time, with rows handled in parallel.
    fn weighted_means(image: &GrayImage, strength: f32, template_window: u32, search_window: u32) -> GrayImage {
        let (width, height) = image.dimensions();
        let (w, h) = (width as usize, height as usize);
        let t = (template_window / 2) as usize;
        let s = (search_window / 2) as isize;
        let h2 = strength * strength;
        let src = image.as_raw().as_slice();

        let shifted = |pos: usize, delta: isize, len: usize| (pos as isize + delta).clamp(0, len as isize - 1) as usize;
        let span = |pos: usize, len: usize| (pos.saturating_sub(t), (pos + t).min(len - 1) + 1);

        let mut accum = vec![0f32; w * h];
        let mut weights = vec![0f32; w * h];
        let mut row_sums = vec![0u32; w * h];

        for dy in -s..=s {
            for dx in -s..=s {
                // Squared differences summed along each row's template span.
                row_sums.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
                    let sy = shifted(y, dy, h);
                    let mut prefix = vec![0u32; w + 1];
                    for x in 0..w {
                        let d = src[y * w + x] as i32 - src[sy * w + shifted(x, dx, w)] as i32;
                        prefix[x + 1] = prefix[x] + (d * d) as u32;
                    }
                    for (x, sum) in row.iter_mut().enumerate() {
                        let (x0, x1) = span(x, w);
                        *sum = prefix[x1] - prefix[x0];
                    }
                });

                let row_sums = row_sums.as_slice();
                accum
                    .par_chunks_mut(w)
                    .zip(weights.par_chunks_mut(w))
                    .enumerate()
                    .for_each(|(y, (accum_row, weight_row))| {
                        let (y0, y1) = span(y, h);
                        let sy = shifted(y, dy, h);
                        for x in 0..w {
                            let (x0, x1) = span(x, w);
                            let sum: u32 = (y0..y1).map(|yy| row_sums[yy * w + x]).sum();
                            let distance = sum as f32 / ((y1 - y0) * (x1 - x0)) as f32;
                            let weight = (-distance / h2).exp();

                            accum_row[x] += weight * src[sy * w + shifted(x, dx, w)] as f32;
                            weight_row[x] += weight;
                        }
                    });
            }
        }

        let mut result = GrayImage::new(width, height);
        for (i, pixel) in result.pixels_mut().enumerate() {
            let mean = accum[i] / weights[i];
            pixel[0] = if mean >= 128.0 { 255 } else { 0 };
        }
        result
    }

    pub fn is_binary(image: &GrayImage) -> bool {
        image.pixels().all(|p| p[0] == 0 || p[0] == 255)
    }

    /// Write the image as PNG to a temporary file the OCR engine can read.
    /// The file is removed when the handle is dropped.
    pub fn save_to_temp_file(image: &GrayImage) -> Result<NamedTempFile, IdCardError> {
        let temp_file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .map_err(|e| IdCardError::IoError(format!("Failed to create temp file: {}", e)))?;

        image
            .save_with_format(temp_file.path(), ImageFormat::Png)
            .map_err(|e| IdCardError::ImageProcessingError(format!("Failed to write processed image: {}", e)))?;

        Ok(temp_file)
    }
}
