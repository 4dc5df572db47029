use glam::{DVec2, DVec3};
use std::f64::consts::PI;

/// Polar angle theta from the +Y axis and azimuth phi in [0, 2*pi].
pub fn dir_to_theta_phi(dir: DVec3) -> DVec2 {
    let dir = dir.normalize();
    let theta = dir.y.clamp(-1.0, 1.0).acos();
    let phi = (-dir.z).atan2(dir.x) + PI;
    DVec2::new(theta, phi)
}

pub fn theta_phi_to_dir(theta_phi: DVec2) -> DVec3 {
    let (theta, phi) = (theta_phi.x, theta_phi.y);
    let y = theta.cos();
    let x = (phi - PI).cos() * theta.sin();
    let z = -(phi - PI).sin() * theta.sin();
    DVec3::new(x, y, z)
}

/// Continuous pixel coordinates on a width x height equirectangular map.
pub fn theta_phi_to_xy(theta_phi: DVec2, width: u32, height: u32) -> DVec2 {
    let x = theta_phi.y / (2.0 * PI) * width as f64;
    let y = theta_phi.x / PI * height as f64;
    DVec2::new(x, y)
}

pub fn xy_to_theta_phi(xy: DVec2, width: u32, height: u32) -> DVec2 {
    let phi = xy.x / width as f64 * 2.0 * PI;
    let theta = xy.y / height as f64 * PI;
    DVec2::new(theta, phi)
}
