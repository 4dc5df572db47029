use crate::envmap::{luminance, RadianceMap};
use image::{Rgba, RgbaImage};
use log::{info, warn};
use std::f64::consts::PI;
use std::path::Path;

/// Piecewise-constant probability distribution over the pixels of an
/// equirectangular radiance map, decomposed into a marginal CDF over rows
/// and a conditional CDF over columns within each row.
#[derive(Debug)]
pub struct Distribution2D {
    width: u32,
    height: u32,
    density: Vec<f64>,
    marginal_cdf: Vec<f64>,
    conditional_cdf: Vec<f64>,
}

impl Distribution2D {
    /// Builds the normalized density and both CDFs in a single pass over
    /// the image. Fails on maps with no luminance at all, which would
    /// otherwise divide by zero during normalization.
    pub fn build(map: &RadianceMap) -> Result<Self, DistributionError> {
        let w = map.width() as usize;
        let h = map.height() as usize;

        info!("building environment light distribution ({}x{})", w, h);

        let mut density = vec![0.0f64; w * h];
        let mut sum = 0.0;
        for j in 0..h {
            // Rows near the poles cover less solid angle per pixel, so
            // their importance is scaled down by sin(theta) at row center.
            let sin_theta = (PI * (j as f64 + 0.5) / h as f64).sin();
            for i in 0..w {
                let weight = luminance(map.pixel(i as u32, j as u32)) * sin_theta;
                density[j * w + i] = weight;
                sum += weight;
            }
        }

        if sum <= 0.0 || !sum.is_finite() {
            return Err(DistributionError::ZeroLuminance);
        }
        for p in &mut density {
            *p /= sum;
        }

        let mut marginal_cdf = vec![0.0f64; h];
        let mut acc = 0.0;
        for j in 0..h {
            acc += density[j * w..(j + 1) * w].iter().sum::<f64>();
            marginal_cdf[j] = acc;
        }

        let mut conditional_cdf = vec![0.0f64; w * h];
        for j in 0..h {
            let row_mass = if j == 0 {
                marginal_cdf[0]
            } else {
                marginal_cdf[j] - marginal_cdf[j - 1]
            };
            if row_mass <= 0.0 {
                // Zero-mass rows keep an all-zero CDF; the marginal search
                // never selects them because their cumulative value equals
                // the previous row's.
                continue;
            }
            let mut acc = 0.0;
            for i in 0..w {
                acc += density[j * w + i];
                conditional_cdf[j * w + i] = acc / row_mass;
            }
        }

        Ok(Distribution2D {
            width: map.width(),
            height: map.height(),
            density,
            marginal_cdf,
            conditional_cdf,
        })
    }

    /// Inverse-transform sampling: picks the first row whose marginal CDF
    /// value exceeds `v`, then the first column in that row whose
    /// conditional CDF value exceeds `u`. Rounding at the distribution
    /// tail clamps to the last row/column.
    pub fn sample(&self, u: f64, v: f64) -> (u32, u32) {
        let h = self.height as usize;
        let w = self.width as usize;

        let j = self
            .marginal_cdf
            .partition_point(|&c| c <= v)
            .min(h - 1);

        let row = &self.conditional_cdf[j * w..(j + 1) * w];
        let i = row.partition_point(|&c| c <= u).min(w - 1);

        (i as u32, j as u32)
    }

    /// Probability mass of pixel `(i, j)`.
    pub fn density_at(&self, i: u32, j: u32) -> f64 {
        self.density[j as usize * self.width as usize + i as usize]
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn density(&self) -> &[f64] {
        &self.density
    }

    pub fn marginal_cdf(&self) -> &[f64] {
        &self.marginal_cdf
    }

    pub fn conditional_cdf(&self) -> &[f64] {
        &self.conditional_cdf
    }

    /// Writes the CDF tables as a PNG for offline inspection: red encodes
    /// the row's marginal CDF, green the conditional CDF at the pixel.
    /// A failed write is logged and ignored; diagnostics never abort
    /// construction.
    pub fn save_probability_debug<P: AsRef<Path>>(&self, path: P) {
        let w = self.width as usize;
        let img = RgbaImage::from_fn(self.width, self.height, |x, y| {
            let marginal = self.marginal_cdf[y as usize];
            let cond = self.conditional_cdf[y as usize * w + x as usize];
            Rgba([
                (marginal * 255.0) as u8,
                (cond * 255.0) as u8,
                0,
                255,
            ])
        });
        if let Err(e) = img.save(path.as_ref()) {
            warn!(
                "failed to write probability debug image {}: {}",
                path.as_ref().display(),
                e
            );
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum DistributionError {
    ZeroLuminance,
}

impl std::fmt::Display for DistributionError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DistributionError::ZeroLuminance => {
                write!(f, "environment map carries no luminance to sample")
            }
        }
    }
}

impl std::error::Error for DistributionError {}
