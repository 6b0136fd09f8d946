use crate::{error::PreprocessError, geometry::AffineTransform, geometry::build_transform};
use common::span;
use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image, ImageRef},
};
use image::{Rgb, RgbImage};
use std::str::FromStr;

/// How source pixels are sampled when drawing into the destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResampleFilter {
    /// Unfiltered drawing: the source pixel under the mapped center.
    #[default]
    Nearest,
    /// Bilinear blend of the four nearest source pixel centers.
    Bilinear,
    /// Bilinear convolution kernel (area-aware, smoother when downscaling).
    /// Only applies to whole-frame scaling; [`warp_affine`] samples it bilinearly.
    Convolution,
}

impl FromStr for ResampleFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "bilinear" => Ok(Self::Bilinear),
            "convolution" => Ok(Self::Convolution),
            other => Err(format!("unknown resample filter: {}", other)),
        }
    }
}

/// Resize `source` to exactly `size x size`, scaling each axis independently.
pub fn resample(
    source: &RgbImage,
    size: u32,
    filter: ResampleFilter,
) -> Result<RgbImage, PreprocessError> {
    let _s = span!("resample");

    let (width, height) = source.dimensions();
    let transform = build_transform(width, height, size, size, 0, false)?;

    match filter {
        ResampleFilter::Convolution => resize_convolution(source, size),
        _ => warp_affine(source, &transform, size, size, filter),
    }
}

/// Draw `source` through `transform` onto a new `dst_width x dst_height`
/// canvas. Destination pixels whose center maps outside the source stay zero.
pub fn warp_affine(
    source: &RgbImage,
    transform: &AffineTransform,
    dst_width: u32,
    dst_height: u32,
    filter: ResampleFilter,
) -> Result<RgbImage, PreprocessError> {
    if dst_width == 0 || dst_height == 0 {
        return Err(PreprocessError::InvalidDimensions {
            width: dst_width,
            height: dst_height,
        });
    }
    let inverse = transform
        .invert()
        .ok_or(PreprocessError::SingularTransform)?;

    let mut canvas = RgbImage::new(dst_width, dst_height);

    for (x, y, pixel) in canvas.enumerate_pixels_mut() {
        let (sx, sy) = inverse.map_point(x as f32 + 0.5, y as f32 + 0.5);
        *pixel = match filter {
            ResampleFilter::Nearest => sample_nearest(source, sx, sy),
            ResampleFilter::Bilinear | ResampleFilter::Convolution => {
                sample_bilinear(source, sx, sy)
            }
        };
    }

    Ok(canvas)
}

#[inline]
fn fetch(source: &RgbImage, x: i64, y: i64) -> Option<&Rgb<u8>> {
    if x < 0 || y < 0 || x >= source.width() as i64 || y >= source.height() as i64 {
        return None;
    }
    Some(source.get_pixel(x as u32, y as u32))
}

#[inline]
fn sample_nearest(source: &RgbImage, sx: f32, sy: f32) -> Rgb<u8> {
    fetch(source, sx.floor() as i64, sy.floor() as i64)
        .copied()
        .unwrap_or(Rgb([0, 0, 0]))
}

fn sample_bilinear(source: &RgbImage, sx: f32, sy: f32) -> Rgb<u8> {
    let (width, height) = (source.width() as i64, source.height() as i64);
    if sx < 0.0 || sy < 0.0 || sx >= width as f32 || sy >= height as f32 {
        return Rgb([0, 0, 0]);
    }

    // Pixel centers sit at half-integer coordinates.
    let u = sx - 0.5;
    let v = sy - 0.5;
    let x0 = u.floor();
    let y0 = v.floor();
    let fx = u - x0;
    let fy = v - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    // Inside the source, neighbours past the border repeat the edge pixel.
    let clamp_x = |x: i64| x.clamp(0, width - 1) as u32;
    let clamp_y = |y: i64| y.clamp(0, height - 1) as u32;

    let taps = [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x0 + 1, y0, fx * (1.0 - fy)),
        (x0, y0 + 1, (1.0 - fx) * fy),
        (x0 + 1, y0 + 1, fx * fy),
    ];

    let mut acc = [0.0f32; 3];
    for (x, y, weight) in taps {
        let px = source.get_pixel(clamp_x(x), clamp_y(y));
        for (channel, value) in acc.iter_mut().zip(px.0) {
            *channel += value as f32 * weight;
        }
    }

    Rgb(acc.map(|v| v.round().clamp(0.0, 255.0) as u8))
}

fn resize_convolution(source: &RgbImage, size: u32) -> Result<RgbImage, PreprocessError> {
    let _s = span!("resize_convolution");

    let src = ImageRef::new(
        source.width(),
        source.height(),
        source.as_raw(),
        PixelType::U8x3,
    )
    .map_err(|e| PreprocessError::Resize(e.to_string()))?;

    let mut resized = Image::new(size, size, PixelType::U8x3);

    Resizer::new()
        .resize(
            &src,
            &mut resized,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        )
        .map_err(|e| PreprocessError::Resize(e.to_string()))?;

    let actual = resized.buffer().len();
    RgbImage::from_raw(size, size, resized.into_vec()).ok_or(PreprocessError::SizeMismatch {
        expected: (size * size * 3) as usize,
        actual,
    })
}
