use crate::coords;
use crate::distribution::{Distribution2D, DistributionError};
use crate::envmap::RadianceMap;
use crate::ray::Ray;
use crate::sampler::Sampler2D;
use glam::{DVec2, DVec3};
use std::f64::consts::PI;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SamplingStrategy {
    /// Inverse-transform sampling of the luminance-weighted distribution.
    Importance,
    /// Uniform sphere sampling, pdf = 1 / 4pi. Mostly useful as a
    /// variance baseline when validating the importance path.
    Uniform,
}

/// One sampled direction toward the light. The light sits at infinity, so
/// `distance` is always `f64::INFINITY`.
pub struct LightSample {
    pub direction: DVec3,
    pub radiance: DVec3,
    pub distance: f64,
    pub pdf: f64,
}

/// Distant light defined by an equirectangular radiance map. Borrows the
/// map and owns the distribution built from it; both are immutable after
/// construction, so shared read-only access from render threads is safe.
pub struct EnvironmentLight<'a> {
    map: &'a RadianceMap,
    distribution: Distribution2D,
    strategy: SamplingStrategy,
}

impl<'a> EnvironmentLight<'a> {
    pub fn new(map: &'a RadianceMap) -> Result<Self, DistributionError> {
        Self::with_strategy(map, SamplingStrategy::Importance)
    }

    pub fn with_strategy(
        map: &'a RadianceMap,
        strategy: SamplingStrategy,
    ) -> Result<Self, DistributionError> {
        let distribution = Distribution2D::build(map)?;
        Ok(EnvironmentLight {
            map,
            distribution,
            strategy,
        })
    }

    pub fn distribution(&self) -> &Distribution2D {
        &self.distribution
    }

    /// Samples a direction toward the light from `point`. The point is
    /// ignored: illumination from a light at infinity does not depend on
    /// where it is received.
    pub fn sample_incoming<S: Sampler2D>(&self, _point: DVec3, sampler: &mut S) -> LightSample {
        let u = sampler.next_2d();
        match self.strategy {
            SamplingStrategy::Importance => self.sample_importance(u.x, u.y),
            SamplingStrategy::Uniform => self.sample_uniform(u.x, u.y),
        }
    }

    /// Radiance along a ray that escaped the scene.
    pub fn evaluate_along_ray(&self, ray: &Ray) -> DVec3 {
        self.radiance_toward(ray.direction)
    }

    /// Solid-angle density the configured strategy would report for an
    /// arbitrary direction; needed by multiple-importance-sampling
    /// integrators. Zero at the exact poles, where the equirectangular
    /// parameterization is singular.
    pub fn pdf(&self, direction: DVec3) -> f64 {
        match self.strategy {
            SamplingStrategy::Uniform => 1.0 / (4.0 * PI),
            SamplingStrategy::Importance => {
                let w = self.distribution.width();
                let h = self.distribution.height();
                let theta_phi = coords::dir_to_theta_phi(direction);
                let sin_theta = theta_phi.x.sin();
                if sin_theta <= 0.0 {
                    return 0.0;
                }
                let xy = coords::theta_phi_to_xy(theta_phi, w, h);
                let i = (xy.x.floor() as i64).clamp(0, w as i64 - 1) as u32;
                let j = (xy.y.floor() as i64).clamp(0, h as i64 - 1) as u32;
                self.pixel_pdf(i, j, sin_theta)
            }
        }
    }

    fn sample_importance(&self, u: f64, v: f64) -> LightSample {
        let w = self.distribution.width();
        let h = self.distribution.height();

        let (i, j) = self.distribution.sample(u, v);

        // The pixel's density was built from sin(theta) at its center, so
        // the sampled direction and the pdf both use the center too.
        let center = DVec2::new(i as f64 + 0.5, j as f64 + 0.5);
        let theta_phi = coords::xy_to_theta_phi(center, w, h);
        let direction = coords::theta_phi_to_dir(theta_phi);

        LightSample {
            direction,
            radiance: self.map.pixel(i, j),
            distance: f64::INFINITY,
            pdf: self.pixel_pdf(i, j, theta_phi.x.sin()),
        }
    }

    fn sample_uniform(&self, u: f64, v: f64) -> LightSample {
        let phi = 2.0 * PI * u;
        let theta = (1.0 - 2.0 * v).clamp(-1.0, 1.0).acos();
        let direction = coords::theta_phi_to_dir(DVec2::new(theta, phi));

        LightSample {
            direction,
            radiance: self.radiance_toward(direction),
            distance: f64::INFINITY,
            pdf: 1.0 / (4.0 * PI),
        }
    }

    fn radiance_toward(&self, direction: DVec3) -> DVec3 {
        let theta_phi = coords::dir_to_theta_phi(direction);
        let xy = coords::theta_phi_to_xy(theta_phi, self.map.width(), self.map.height());
        self.map.bilerp(xy)
    }

    /// Converts pixel mass to a density over solid angle: dividing by the
    /// pixel's (phi, theta) area 2pi^2 / (w h), then by the sin(theta)
    /// Jacobian of the spherical-to-Cartesian map.
    fn pixel_pdf(&self, i: u32, j: u32, sin_theta: f64) -> f64 {
        let w = self.distribution.width() as f64;
        let h = self.distribution.height() as f64;
        self.distribution.density_at(i, j) * w * h / (2.0 * PI * PI * sin_theta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{FixedSampler, RngSampler};

    fn bright_pixel_map() -> RadianceMap {
        let mut data = vec![DVec3::ZERO; 4 * 2];
        data[2] = DVec3::new(3.0, 2.0, 1.0);
        RadianceMap::new(4, 2, data).unwrap()
    }

    fn varied_map(w: u32, h: u32) -> RadianceMap {
        let data = (0..w * h)
            .map(|idx| {
                let x = idx % w;
                let y = idx / w;
                DVec3::splat(0.1 + ((x * 7 + y * 3) % 5) as f64)
            })
            .collect();
        RadianceMap::new(w, h, data).unwrap()
    }

    #[test]
    fn rejects_black_map() {
        let map = RadianceMap::new(4, 2, vec![DVec3::ZERO; 8]).unwrap();
        assert!(EnvironmentLight::new(&map).is_err());
    }

    #[test]
    fn single_bright_pixel_end_to_end() {
        let map = bright_pixel_map();
        let light = EnvironmentLight::new(&map).unwrap();

        let expected_dir =
            coords::theta_phi_to_dir(coords::xy_to_theta_phi(DVec2::new(2.5, 0.5), 4, 2));
        let expected_pdf = 8.0 / (2.0 * PI * PI * (PI / 4.0).sin());

        for &(u, v) in &[(0.0, 0.0), (0.3, 0.7), (0.99, 0.99), (0.5, 0.01)] {
            let mut sampler = FixedSampler(DVec2::new(u, v));
            let s = light.sample_incoming(DVec3::ZERO, &mut sampler);

            assert!((s.direction - expected_dir).length() < 1e-12);
            assert!((s.pdf - expected_pdf).abs() < 1e-9);
            assert_eq!(s.distance, f64::INFINITY);
            assert!((s.radiance - map.pixel(2, 0)).length() < 1e-12);
        }
    }

    #[test]
    fn sample_point_is_ignored() {
        let map = varied_map(8, 4);
        let light = EnvironmentLight::new(&map).unwrap();
        let mut a = FixedSampler(DVec2::new(0.4, 0.6));
        let mut b = FixedSampler(DVec2::new(0.4, 0.6));
        let s1 = light.sample_incoming(DVec3::ZERO, &mut a);
        let s2 = light.sample_incoming(DVec3::new(100.0, -5.0, 3.0), &mut b);
        assert_eq!(s1.direction, s2.direction);
        assert_eq!(s1.pdf, s2.pdf);
    }

    #[test]
    fn pdf_query_agrees_with_sampled_pdf() {
        let map = varied_map(16, 8);
        let light = EnvironmentLight::new(&map).unwrap();
        let mut sampler = RngSampler::seeded(11);
        for _ in 0..200 {
            let s = light.sample_incoming(DVec3::ZERO, &mut sampler);
            assert!((light.pdf(s.direction) - s.pdf).abs() < 1e-9 * s.pdf.max(1.0));
        }
    }

    #[test]
    fn pdf_is_zero_at_exact_poles() {
        let map = varied_map(8, 4);
        let light = EnvironmentLight::new(&map).unwrap();
        assert_eq!(light.pdf(DVec3::Y), 0.0);
        assert_eq!(light.pdf(DVec3::NEG_Y), 0.0);
    }

    #[test]
    fn histogram_matches_density_table() {
        let map = varied_map(8, 4);
        let light = EnvironmentLight::new(&map).unwrap();
        let dist = light.distribution();

        let n = 200_000;
        let mut counts = vec![0u32; 8 * 4];
        let mut sampler = RngSampler::seeded(1234);
        for _ in 0..n {
            let u = sampler.next_2d();
            let (i, j) = dist.sample(u.x, u.y);
            counts[j as usize * 8 + i as usize] += 1;
        }

        for j in 0..4u32 {
            for i in 0..8u32 {
                let observed = counts[j as usize * 8 + i as usize] as f64 / n as f64;
                let expected = dist.density_at(i, j);
                assert!(
                    (observed - expected).abs() < 5e-3,
                    "pixel ({}, {}): observed {} expected {}",
                    i,
                    j,
                    observed,
                    expected
                );
            }
        }
    }

    #[test]
    fn polar_rows_receive_fewer_samples_on_uniform_map() {
        let (w, h) = (8u32, 16u32);
        let map = RadianceMap::new(w, h, vec![DVec3::ONE; (w * h) as usize]).unwrap();
        let light = EnvironmentLight::new(&map).unwrap();
        let dist = light.distribution();

        let n = 100_000;
        let mut row_counts = vec![0u32; h as usize];
        let mut sampler = RngSampler::seeded(99);
        for _ in 0..n {
            let u = sampler.next_2d();
            let (_, j) = dist.sample(u.x, u.y);
            row_counts[j as usize] += 1;
        }

        // Same pixel count per row, but far less solid angle at the poles.
        assert!(row_counts[0] * 2 < row_counts[8]);
        assert!(row_counts[h as usize - 1] * 2 < row_counts[8]);
    }

    #[test]
    fn escaped_ray_returns_background_radiance() {
        let color = DVec3::new(0.2, 0.4, 0.8);
        let map = RadianceMap::new(8, 4, vec![color; 32]).unwrap();
        let light = EnvironmentLight::new(&map).unwrap();

        for dir in [
            DVec3::new(1.0, 0.2, -0.3).normalize(),
            DVec3::new(-0.5, -0.8, 0.1).normalize(),
            DVec3::X,
            DVec3::NEG_Z,
        ] {
            let ray = Ray::new(DVec3::ZERO, dir);
            assert!((light.evaluate_along_ray(&ray) - color).length() < 1e-12);
        }
    }

    #[test]
    fn uniform_strategy_reports_uniform_pdf() {
        let map = varied_map(8, 4);
        let light = EnvironmentLight::with_strategy(&map, SamplingStrategy::Uniform).unwrap();
        let mut sampler = RngSampler::seeded(5);
        for _ in 0..100 {
            let s = light.sample_incoming(DVec3::ZERO, &mut sampler);
            assert!((s.pdf - 1.0 / (4.0 * PI)).abs() < 1e-15);
            assert!((s.direction.length() - 1.0).abs() < 1e-9);
            assert_eq!(s.distance, f64::INFINITY);
            assert!((light.pdf(s.direction) - 1.0 / (4.0 * PI)).abs() < 1e-15);
        }
    }
}
