//! Concrete projections

mod equirectangular;
mod lambert_azimuthal;
mod lambert_conformal;
mod mercator;
mod orthographic;
mod planar;
mod polar_stereographic;
mod ring_cylindrical;
mod simple_cylindrical;
mod sinusoidal;

pub use equirectangular::Equirectangular;
pub use lambert_azimuthal::LambertAzimuthalEqualArea;
pub use lambert_conformal::LambertConformal;
pub use mercator::Mercator;
pub use orthographic::Orthographic;
pub use planar::Planar;
pub use polar_stereographic::PolarStereographic;
pub use ring_cylindrical::RingCylindrical;
pub use simple_cylindrical::SimpleCylindrical;
pub use sinusoidal::Sinusoidal;
