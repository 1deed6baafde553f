//! Voxel-based pore and throat geometry extraction for fibrous porous media.
//!
//! A fibrous material is modeled as a dual Delaunay/Voronoi tessellation:
//! pores are the convex hulls of Voronoi cells, throats are the shared
//! facets between adjacent pores, and solid fibers of a given radius occupy
//! the facet edges. This crate rasterizes such a tessellation into voxel
//! grids and measures the resulting geometry: pore volumes, equivalent and
//! inscribed diameters, throat cross-sectional areas, perimeters, incircles,
//! offset polygons and conduit lengths.
//!
//! Tessellation generation itself is out of scope: the caller supplies a
//! [`Tessellation`] snapshot (hull vertices per pore, facet vertices and
//! pore adjacency per throat, plus the fiber radius and voxel resolution)
//! and receives a [`GeometrySet`]. All results are voxel approximations
//! bounded by the grid resolution.
//!
//! # Example
//!
//! ```
//! use nalgebra::Point3;
//! use porevox::{extract, ExtractConfig, PoreHull, Tessellation, ThroatFacet};
//!
//! // Two unit-cube pores sharing the square facet at x = 1.
//! let cube = |offset: f64| -> Vec<Point3<f64>> {
//!     let mut corners = Vec::new();
//!     for x in [0.0, 1.0] {
//!         for y in [0.0, 1.0] {
//!             for z in [0.0, 1.0] {
//!                 corners.push(Point3::new(offset + x, y, z));
//!             }
//!         }
//!     }
//!     corners
//! };
//! let pores = vec![
//!     PoreHull { id: 0, vertices: cube(0.0) },
//!     PoreHull { id: 1, vertices: cube(1.0) },
//! ];
//! let throats = vec![ThroatFacet {
//!     id: 0,
//!     vertices: vec![
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(1.0, 1.0, 0.0),
//!         Point3::new(1.0, 1.0, 1.0),
//!         Point3::new(1.0, 0.0, 1.0),
//!     ],
//!     pores: (0, 1),
//! }];
//!
//! let tess = Tessellation::new(pores, throats, 0.05, 0.125)?;
//! let geometry = extract(&tess, &ExtractConfig::default())?;
//!
//! assert!(geometry.pores[0].volume > 0.0);
//! assert!(geometry.throats[0].cross_sectional_area > 0.0);
//! assert!(geometry.porosity() > 0.5);
//! # Ok::<(), porevox::PorevoxError>(())
//! ```

pub mod conditions;
pub mod error;
pub mod extract;
pub mod grid;
pub mod math;
pub mod tessellation;

pub use conditions::Condition;
pub use error::{PorevoxError, Result};
pub use extract::{
    extract, ConduitLengths, ExtractConfig, GeometrySet, MemoryMode, PhaseCounts, PoreGeometry,
    ThroatGeometry,
};
pub use tessellation::{PoreHull, Tessellation, ThroatFacet};
