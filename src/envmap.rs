use glam::{DVec2, DVec3};
use std::path::Path;

/// Linear-radiance equirectangular image, row-major, origin at the top left.
pub struct RadianceMap {
    width: u32,
    height: u32,
    data: Vec<DVec3>,
}

fn srgb_to_linear(c: f64) -> f64 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

pub fn luminance(radiance: DVec3) -> f64 {
    0.2126 * radiance.x + 0.7152 * radiance.y + 0.0722 * radiance.z
}

impl RadianceMap {
    pub fn new(width: u32, height: u32, data: Vec<DVec3>) -> Result<Self, EnvMapError> {
        if width == 0 || height == 0 {
            return Err(EnvMapError::EmptyImage);
        }
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(EnvMapError::DimensionMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(RadianceMap {
            width,
            height,
            data,
        })
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, EnvMapError> {
        let path = path.as_ref();
        let is_hdr = path
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_lowercase();
                ext == "hdr" || ext == "exr"
            })
            .unwrap_or(false);

        let img = image::open(path)?.into_rgb32f();
        let width = img.width();
        let height = img.height();

        let data: Vec<DVec3> = if is_hdr {
            img.pixels()
                .map(|p| DVec3::new(p.0[0] as f64, p.0[1] as f64, p.0[2] as f64))
                .collect()
        } else {
            img.pixels()
                .map(|p| {
                    DVec3::new(
                        srgb_to_linear(p.0[0] as f64),
                        srgb_to_linear(p.0[1] as f64),
                        srgb_to_linear(p.0[2] as f64),
                    )
                })
                .collect()
        };

        Self::new(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> DVec3 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Bilinear reconstruction at continuous pixel coordinates. Integer
    /// coordinates return the stored pixel value exactly. The horizontal
    /// seam wraps (phi is periodic); the vertical axis clamps to the pole
    /// rows, so `y == height` reads the bottom row.
    pub fn bilerp(&self, xy: DVec2) -> DVec3 {
        debug_assert!(
            xy.x >= -1.0 && xy.x <= self.width as f64 + 1.0,
            "x out of range: {}",
            xy.x
        );
        debug_assert!(
            xy.y >= 0.0 && xy.y <= self.height as f64,
            "y out of range: {}",
            xy.y
        );

        let w = self.width as i64;
        let h = self.height as i64;

        let fx = xy.x - xy.x.floor();
        let fy = xy.y - xy.y.floor();
        let x0 = xy.x.floor() as i64;
        let y0 = xy.y.floor() as i64;

        let xa = x0.rem_euclid(w) as u32;
        let xb = (x0 + 1).rem_euclid(w) as u32;
        let ya = y0.clamp(0, h - 1) as u32;
        let yb = (y0 + 1).clamp(0, h - 1) as u32;

        let c00 = self.pixel(xa, ya);
        let c10 = self.pixel(xb, ya);
        let c01 = self.pixel(xa, yb);
        let c11 = self.pixel(xb, yb);

        let top = c00.lerp(c10, fx);
        let bottom = c01.lerp(c11, fx);
        top.lerp(bottom, fy)
    }
}

#[derive(Debug)]
pub enum EnvMapError {
    EmptyImage,
    DimensionMismatch { expected: usize, actual: usize },
    Image(image::ImageError),
}

impl From<image::ImageError> for EnvMapError {
    fn from(e: image::ImageError) -> Self {
        EnvMapError::Image(e)
    }
}

impl std::fmt::Display for EnvMapError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            EnvMapError::EmptyImage => write!(f, "environment map has zero width or height"),
            EnvMapError::DimensionMismatch { expected, actual } => write!(
                f,
                "pixel buffer length {} does not match dimensions (expected {})",
                actual, expected
            ),
            EnvMapError::Image(e) => write!(f, "image error: {}", e),
        }
    }
}

impl std::error::Error for EnvMapError {}
