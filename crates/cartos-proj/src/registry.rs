//! Projection name registry
//!
//! Maps a `ProjectionName` to the constructor that builds it from a label.
//! Names compare case-insensitively. [`ProjectionRegistry::builtin`] holds
//! every projection shipped with this crate; callers may register more.

use crate::error::{ProjectionError, ProjectionResult};
use crate::planetary::{TProjection, XYRange};
use crate::projections::{
    Equirectangular, LambertAzimuthalEqualArea, LambertConformal, Mercator, Orthographic, Planar,
    PolarStereographic, RingCylindrical, SimpleCylindrical, Sinusoidal,
};
use crate::ring::RingProjection;
use crate::world::WorldMapper;
use cartos_core::{Group, Label};

/// Builds a planetary projection from `(label, allow_defaults)`.
pub type PlanetaryConstructor = fn(&Label, bool) -> ProjectionResult<Box<dyn TProjection>>;

/// Builds a ring-plane projection from `(label, allow_defaults)`.
pub type RingConstructor = fn(&Label, bool) -> ProjectionResult<Box<dyn RingProjection>>;

/// A registered constructor.
#[derive(Clone, Copy)]
pub enum Constructor {
    Planetary(PlanetaryConstructor),
    Ring(RingConstructor),
}

impl Constructor {
    /// Run the constructor.
    pub fn build(self, label: &Label, allow_defaults: bool) -> ProjectionResult<MapProjection> {
        match self {
            Constructor::Planetary(f) => f(label, allow_defaults).map(MapProjection::Planetary),
            Constructor::Ring(f) => f(label, allow_defaults).map(MapProjection::Ring),
        }
    }
}

/// Registry of projection constructors keyed by name.
#[derive(Clone, Default)]
pub struct ProjectionRegistry {
    entries: Vec<(String, Constructor)>,
}

impl ProjectionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in projection.
    pub fn builtin() -> Self {
        let mut reg = Self::new();
        reg.register_planetary("Sinusoidal", |l, d| Ok(Box::new(Sinusoidal::new(l, d)?)));
        reg.register_planetary("SimpleCylindrical", |l, d| {
            Ok(Box::new(SimpleCylindrical::new(l, d)?))
        });
        reg.register_planetary("Equirectangular", |l, d| {
            Ok(Box::new(Equirectangular::new(l, d)?))
        });
        reg.register_planetary("Mercator", |l, d| Ok(Box::new(Mercator::new(l, d)?)));
        reg.register_planetary("PolarStereographic", |l, d| {
            Ok(Box::new(PolarStereographic::new(l, d)?))
        });
        reg.register_planetary("Orthographic", |l, d| Ok(Box::new(Orthographic::new(l, d)?)));
        reg.register_planetary("LambertConformal", |l, d| {
            Ok(Box::new(LambertConformal::new(l, d)?))
        });
        reg.register_planetary("LambertAzimuthalEqualArea", |l, d| {
            Ok(Box::new(LambertAzimuthalEqualArea::new(l, d)?))
        });
        reg.register_ring("Planar", |l, d| Ok(Box::new(Planar::new(l, d)?)));
        reg.register_ring("RingCylindrical", |l, d| {
            Ok(Box::new(RingCylindrical::new(l, d)?))
        });
        reg
    }

    /// Register (or replace) a planetary projection.
    pub fn register_planetary(&mut self, name: &str, constructor: PlanetaryConstructor) {
        self.insert(name, Constructor::Planetary(constructor));
    }

    /// Register (or replace) a ring-plane projection.
    pub fn register_ring(&mut self, name: &str, constructor: RingConstructor) {
        self.insert(name, Constructor::Ring(constructor));
    }

    fn insert(&mut self, name: &str, constructor: Constructor) {
        match self
            .entries
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = constructor,
            None => self.entries.push((name.to_string(), constructor)),
        }
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_ok()
    }

    /// Find the constructor for a projection name.
    ///
    /// # Errors
    ///
    /// [`ProjectionError::Unsupported`] when nothing is registered under it.
    pub fn lookup(&self, name: &str) -> ProjectionResult<Constructor> {
        let name = name.trim();
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, c)| *c)
            .ok_or_else(|| ProjectionError::Unsupported {
                name: name.to_string(),
            })
    }
}

/// A constructed projection of either family.
pub enum MapProjection {
    Planetary(Box<dyn TProjection>),
    Ring(Box<dyn RingProjection>),
}

impl MapProjection {
    pub fn name(&self) -> &'static str {
        match self {
            MapProjection::Planetary(p) => p.name(),
            MapProjection::Ring(p) => p.name(),
        }
    }

    pub fn is_ring(&self) -> bool {
        matches!(self, MapProjection::Ring(_))
    }

    /// Canonical mapping group.
    pub fn mapping(&self) -> Group {
        match self {
            MapProjection::Planetary(p) => p.mapping(),
            MapProjection::Ring(p) => p.mapping(),
        }
    }

    /// The parsed mapping group, including filled-in defaults.
    pub fn mapping_group(&self) -> &Group {
        match self {
            MapProjection::Planetary(p) => p.state().mapping_group(),
            MapProjection::Ring(p) => p.state().mapping_group(),
        }
    }

    pub fn mapping_group_mut(&mut self) -> &mut Group {
        match self {
            MapProjection::Planetary(p) => p.state_mut().mapping_group_mut(),
            MapProjection::Ring(p) => p.state_mut().mapping_group_mut(),
        }
    }

    pub fn set_world_mapper(&mut self, mapper: WorldMapper) {
        match self {
            MapProjection::Planetary(p) => p.set_world_mapper(mapper),
            MapProjection::Ring(p) => p.set_world_mapper(mapper),
        }
    }

    pub fn world_mapper(&self) -> Option<&WorldMapper> {
        match self {
            MapProjection::Planetary(p) => p.world_mapper(),
            MapProjection::Ring(p) => p.world_mapper(),
        }
    }

    pub fn is_equatorial_cylindrical(&self) -> bool {
        match self {
            MapProjection::Planetary(p) => p.is_equatorial_cylindrical(),
            MapProjection::Ring(p) => p.is_equatorial_cylindrical(),
        }
    }

    pub fn has_ground_range(&self) -> bool {
        match self {
            MapProjection::Planetary(p) => p.has_ground_range(),
            MapProjection::Ring(p) => p.has_ground_range(),
        }
    }

    pub fn xy_range(&self) -> Option<XYRange> {
        match self {
            MapProjection::Planetary(p) => p.xy_range(),
            MapProjection::Ring(p) => p.xy_range(),
        }
    }

    /// Radius along which `Scale` is measured: the local radius at the
    /// true-scale latitude, or the true-scale ring radius.
    pub fn true_scale_radius(&self) -> f64 {
        match self {
            MapProjection::Planetary(p) => p.state().local_radius(p.true_scale_latitude()),
            MapProjection::Ring(p) => p.true_scale_ring_radius(),
        }
    }

    pub fn as_planetary(&self) -> Option<&dyn TProjection> {
        match self {
            MapProjection::Planetary(p) => Some(&**p),
            MapProjection::Ring(_) => None,
        }
    }

    pub fn as_planetary_mut(&mut self) -> Option<&mut (dyn TProjection + 'static)> {
        match self {
            MapProjection::Planetary(p) => Some(&mut **p),
            MapProjection::Ring(_) => None,
        }
    }

    pub fn as_ring(&self) -> Option<&dyn RingProjection> {
        match self {
            MapProjection::Ring(p) => Some(&**p),
            MapProjection::Planetary(_) => None,
        }
    }

    pub fn as_ring_mut(&mut self) -> Option<&mut (dyn RingProjection + 'static)> {
        match self {
            MapProjection::Ring(p) => Some(&mut **p),
            MapProjection::Planetary(_) => None,
        }
    }

    /// Take the planetary projection out.
    ///
    /// # Errors
    ///
    /// [`ProjectionError::InvalidMapping`] for a ring-plane projection.
    pub fn into_planetary(self) -> ProjectionResult<Box<dyn TProjection>> {
        match self {
            MapProjection::Planetary(p) => Ok(p),
            MapProjection::Ring(p) => Err(ProjectionError::mapping(format!(
                "[{}] is a ring-plane projection",
                p.name()
            ))),
        }
    }

    /// Take the ring-plane projection out.
    pub fn into_ring(self) -> ProjectionResult<Box<dyn RingProjection>> {
        match self {
            MapProjection::Ring(p) => Ok(p),
            MapProjection::Planetary(p) => Err(ProjectionError::mapping(format!(
                "[{}] is not a ring-plane projection",
                p.name()
            ))),
        }
    }
}

impl std::fmt::Debug for MapProjection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let family = if self.is_ring() { "Ring" } else { "Planetary" };
        f.debug_tuple(family).field(&self.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_case_insensitive() {
        let reg = ProjectionRegistry::builtin();
        assert!(reg.contains("sinusoidal"));
        assert!(reg.contains(" POLARSTEREOGRAPHIC "));
        assert!(matches!(reg.lookup("Planar"), Ok(Constructor::Ring(_))));
    }

    #[test]
    fn test_unknown_projection() {
        let reg = ProjectionRegistry::builtin();
        let err = reg.lookup("Robinson").err().unwrap();
        assert_eq!(err.exit_code(), cartos_core::EXIT_UNSUPPORTED);
        assert!(err.to_string().contains("[Robinson]"));
    }

    #[test]
    fn test_register_replaces() {
        let mut reg = ProjectionRegistry::builtin();
        let n = reg.names().count();
        reg.register_planetary("sinusoidal", |l, d| Ok(Box::new(Sinusoidal::new(l, d)?)));
        assert_eq!(reg.names().count(), n);
        assert_eq!(n, 10);
    }
}
