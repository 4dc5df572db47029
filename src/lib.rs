//! Importance sampling of a latitude-longitude HDR environment map for use
//! as a distant light source in a Monte Carlo path tracer.

pub mod coords;
pub mod distribution;
pub mod envmap;
pub mod light;
pub mod ray;
pub mod sampler;

pub use distribution::{Distribution2D, DistributionError};
pub use envmap::{EnvMapError, RadianceMap};
pub use light::{EnvironmentLight, LightSample, SamplingStrategy};
pub use ray::Ray;
pub use sampler::{RngSampler, Sampler2D};
