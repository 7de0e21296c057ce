//! Groups built on the `image` crate.

use super::TARGET_SIDE;
use anyhow::anyhow;
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbImage};
use perfpair_core::{Bencher, Capabilities};
use rand::Rng;

/// Width of the full HD source image
pub const HD_WIDTH: u32 = 1920;
/// Height of the full HD source image
pub const HD_HEIGHT: u32 = 1080;
/// Video frame width
pub const FRAME_WIDTH: u32 = 640;
/// Video frame height
pub const FRAME_HEIGHT: u32 = 480;
/// Frames in the simulated video
pub const VIDEO_FRAMES: usize = 300;
/// Only every this many frames is processed
pub const FRAME_STRIDE: usize = 5;
/// Images generated by the memory group
pub const MEMORY_IMAGES: usize = 200;
/// Images run through the preprocessing pipeline
pub const PIPELINE_IMAGES: usize = 20;

/// RGB image filled with random bytes
pub fn random_rgb(width: u32, height: u32) -> anyhow::Result<RgbImage> {
    let mut buf = vec![0u8; width as usize * height as usize * 3];
    rand::thread_rng().fill(&mut buf[..]);
    RgbImage::from_raw(width, height, buf)
        .ok_or_else(|| anyhow!("buffer does not fit a {width}x{height} RGB image"))
}

fn random_rgbs(count: usize, width: u32, height: u32) -> anyhow::Result<Vec<RgbImage>> {
    (0..count).map(|_| random_rgb(width, height)).collect()
}

/// Mean of the grayscale conversion
pub fn gray_mean(image: &RgbImage) -> f64 {
    let gray = imageops::grayscale(image);
    let pixels = gray.as_raw();
    if pixels.is_empty() {
        return 0.0;
    }
    pixels.iter().map(|&p| f64::from(p)).sum::<f64>() / pixels.len() as f64
}

// -- resizing ---------------------------------------------------------------

/// Nearest-neighbor resize written as a per-pixel loop.
pub fn nearest_by_hand(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    let (src_w, src_h) = image.dimensions();
    let mut out = RgbImage::new(width, height);
    for y in 0..height {
        let src_y = (u64::from(y) * u64::from(src_h) / u64::from(height)) as u32;
        for x in 0..width {
            let src_x = (u64::from(x) * u64::from(src_w) / u64::from(width)) as u32;
            out.put_pixel(x, y, *image.get_pixel(src_x, src_y));
        }
    }
    out
}

/// Per-pixel resize to the network input size.
pub fn resize_manual_loop(image: &RgbImage) -> RgbImage {
    nearest_by_hand(image, TARGET_SIDE, TARGET_SIDE)
}

/// Library resize with a smoothing filter.
pub fn resize_with_triangle(image: &RgbImage) -> RgbImage {
    imageops::resize(image, TARGET_SIDE, TARGET_SIDE, FilterType::Triangle)
}

/// Library resize with nearest-neighbor sampling.
pub fn resize_with_nearest(image: &RgbImage) -> RgbImage {
    imageops::resize(image, TARGET_SIDE, TARGET_SIDE, FilterType::Nearest)
}

pub(super) fn image_resizing(b: &mut Bencher<'_>, _: &Capabilities) -> anyhow::Result<()> {
    let image = random_rgb(HD_WIDTH, HD_HEIGHT)?;
    b.time_fn(resize_manual_loop, &image);
    b.time_fn(resize_with_triangle, &image);
    b.time_fn(resize_with_nearest, &image);
    Ok(())
}

// -- frame skipping ---------------------------------------------------------

/// Reduces every frame.
pub fn process_every_frame(frames: &[RgbImage]) -> Vec<f64> {
    frames.iter().map(gray_mean).collect()
}

/// Reduces every `n`th frame only.
pub fn process_every_nth_frame(frames: &[RgbImage], n: usize) -> Vec<f64> {
    frames.iter().step_by(n.max(1)).map(gray_mean).collect()
}

pub(super) fn frame_processing(b: &mut Bencher<'_>, _: &Capabilities) -> anyhow::Result<()> {
    let frames = random_rgbs(VIDEO_FRAMES, FRAME_WIDTH, FRAME_HEIGHT)?;
    b.time_fn(process_every_frame, frames.as_slice());
    b.time("process_every_nth_frame", || {
        process_every_nth_frame(&frames, FRAME_STRIDE)
    });
    Ok(())
}

// -- memory ----------------------------------------------------------------

/// Generates every image up front, then reduces them.
pub fn load_all_then_process(count: usize) -> anyhow::Result<Vec<f64>> {
    let images = random_rgbs(count, FRAME_WIDTH, FRAME_HEIGHT)?;
    Ok(images.iter().map(gray_mean).collect())
}

/// Generates and reduces one image at a time; each is dropped before the next.
pub fn process_on_the_fly(count: usize) -> anyhow::Result<Vec<f64>> {
    (0..count)
        .map(|_| random_rgb(FRAME_WIDTH, FRAME_HEIGHT).map(|img| gray_mean(&img)))
        .collect()
}

pub(super) fn memory_efficiency(b: &mut Bencher<'_>, _: &Capabilities) -> anyhow::Result<()> {
    b.try_time("load_all_then_process", || {
        load_all_then_process(MEMORY_IMAGES)
    })?;
    b.try_time("process_on_the_fly", || process_on_the_fly(MEMORY_IMAGES))?;
    Ok(())
}

// -- preprocessing ----------------------------------------------------------

/// Smooth resize, grayscale, then a round trip through normalized floats.
pub fn inefficient_preprocessing(images: &[RgbImage]) -> anyhow::Result<Vec<GrayImage>> {
    images
        .iter()
        .map(|img| {
            let resized = imageops::resize(img, TARGET_SIDE, TARGET_SIDE, FilterType::Triangle);
            let gray = imageops::grayscale(&resized);
            let normalized: Vec<f32> = gray.as_raw().iter().map(|&p| f32::from(p) / 255.0).collect();
            let restored: Vec<u8> = normalized.iter().map(|&p| (p * 255.0) as u8).collect();
            GrayImage::from_raw(gray.width(), gray.height(), restored)
                .ok_or_else(|| anyhow!("restored buffer does not match the grayscale image"))
        })
        .collect()
}

/// Nearest resize, then grayscale.
pub fn efficient_preprocessing(images: &[RgbImage]) -> Vec<GrayImage> {
    images
        .iter()
        .map(|img| {
            let resized = imageops::resize(img, TARGET_SIDE, TARGET_SIDE, FilterType::Nearest);
            imageops::grayscale(&resized)
        })
        .collect()
}

pub(super) fn preprocessing_pipeline(
    b: &mut Bencher<'_>,
    _: &Capabilities,
) -> anyhow::Result<()> {
    let images = random_rgbs(PIPELINE_IMAGES, HD_WIDTH, HD_HEIGHT)?;
    b.try_time("inefficient_preprocessing", || {
        inefficient_preprocessing(&images)
    })?;
    b.time_fn(efficient_preprocessing, images.as_slice());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_random_image_has_requested_shape() {
        let img = random_rgb(7, 3).unwrap();
        assert_eq!(img.dimensions(), (7, 3));
        assert_eq!(img.as_raw().len(), 7 * 3 * 3);
    }

    #[test]
    fn test_manual_resize_samples_nearest_source_pixel() {
        let mut img = RgbImage::new(4, 2);
        img.put_pixel(0, 0, Rgb([10, 20, 30]));
        img.put_pixel(3, 1, Rgb([200, 100, 50]));

        let out = nearest_by_hand(&img, 2, 1);

        assert_eq!(out.dimensions(), (2, 1));
        assert_eq!(*out.get_pixel(0, 0), Rgb([10, 20, 30]));
    }

    #[test]
    fn test_resizers_hit_target_and_keep_flat_color() {
        let flat = RgbImage::from_pixel(48, 27, Rgb([90, 90, 90]));

        for out in [
            resize_manual_loop(&flat),
            resize_with_triangle(&flat),
            resize_with_nearest(&flat),
        ] {
            assert_eq!(out.dimensions(), (TARGET_SIDE, TARGET_SIDE));
            assert!(out.pixels().all(|p| p.0.iter().all(|&c| c.abs_diff(90) <= 1)));
        }
    }

    #[test]
    fn test_every_nth_frame_is_a_subsequence() {
        let frames = random_rgbs(12, 8, 6).unwrap();

        let all = process_every_frame(&frames);
        let sampled = process_every_nth_frame(&frames, 5);

        assert_eq!(all.len(), 12);
        assert_eq!(sampled, vec![all[0], all[5], all[10]]);
    }

    #[test]
    fn test_memory_variants_produce_one_mean_per_image() {
        assert_eq!(load_all_then_process(3).unwrap().len(), 3);
        assert_eq!(process_on_the_fly(3).unwrap().len(), 3);
    }

    #[test]
    fn test_preprocessing_variants_yield_gray_targets() {
        let images = random_rgbs(2, 32, 18).unwrap();

        let slow = inefficient_preprocessing(&images).unwrap();
        let fast = efficient_preprocessing(&images);

        assert_eq!(slow.len(), 2);
        assert_eq!(fast.len(), 2);
        for img in slow.iter().chain(&fast) {
            assert_eq!(img.dimensions(), (TARGET_SIDE, TARGET_SIDE));
        }
    }

    #[test]
    fn test_gray_mean_of_flat_image() {
        let img = RgbImage::from_pixel(3, 3, Rgb([100, 100, 100]));
        assert!((gray_mean(&img) - 100.0).abs() < 1.0);
    }
}
