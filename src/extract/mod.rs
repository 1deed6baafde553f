mod aggregate;
mod facets;
mod fibers;
mod hulls;

pub use aggregate::{ConduitLengths, PhaseCounts, PoreGeometry, ThroatGeometry};

use rayon::prelude::*;
use tracing::info;

use crate::conditions::{Condition, ConditionLog};
use crate::error::Result;
use crate::grid::GridBounds;
use crate::math::Vector3;
use crate::tessellation::Tessellation;

use facets::FacetMetrics;

/// How the fiber-space pass chooses between full-resolution and chunked
/// distance transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryMode {
    /// Estimate the footprint against [`ExtractConfig::memory_budget`] and
    /// pick the cheapest strategy that fits; error out when none does.
    Auto,
    /// Always transform the full domain at once.
    Full,
    /// Always process in chunks.
    Chunked,
}

/// Parameters controlling an extraction pass.
#[derive(Debug, Clone, Copy)]
pub struct ExtractConfig {
    /// Edge length (in raster units) facet cross-sections are scaled to
    /// before 2D analysis; bounds image memory independently of facet size.
    pub raster_size: usize,
    /// Cubic chunk edge length (voxels) for chunked distance transforms.
    pub chunk_len: usize,
    /// Strategy selection for the fiber-space pass.
    pub memory_mode: MemoryMode,
    /// Memory budget (bytes) consulted by [`MemoryMode::Auto`].
    pub memory_budget: u64,
    /// Maximum label-dilation passes closing unassigned voxels. More passes
    /// extend the fill at the cost of bleeding labels slightly past the
    /// hull union.
    pub max_fill_passes: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            raster_size: 200,
            chunk_len: 100,
            memory_mode: MemoryMode::Auto,
            memory_budget: 4 * 1024 * 1024 * 1024,
            max_fill_passes: 1,
        }
    }
}

/// Everything one extraction pass produces: per-pore and per-throat derived
/// attributes, the domain phase totals, and the recoverable conditions
/// encountered along the way.
#[derive(Debug)]
pub struct GeometrySet {
    pub pores: Vec<PoreGeometry>,
    pub throats: Vec<ThroatGeometry>,
    pub phase_counts: PhaseCounts,
    pub conditions: Vec<Condition>,
}

impl GeometrySet {
    /// Fraction of the voxelized domain that is open pore space.
    #[must_use]
    pub fn porosity(&self) -> f64 {
        self.phase_counts.porosity()
    }
}

/// Runs the full extraction pass over a tessellation snapshot.
///
/// The pass voxelizes pore hulls into a label volume, classifies the domain
/// into fiber and pore phase from the throat-facet skeleton, analyzes every
/// throat cross-section in 2D, and aggregates the results. Per-entity work
/// runs on the rayon pool; results are merged in id order, so the output is
/// independent of scheduling and of the chunk decomposition.
///
/// # Errors
///
/// Returns an error only for conditions that invalidate the whole pass:
/// an empty vertex set or a memory budget even chunked processing cannot
/// meet. Per-entity degeneracies are recovered with zero-valued results and
/// reported in [`GeometrySet::conditions`].
pub fn extract(tess: &Tessellation, config: &ExtractConfig) -> Result<GeometrySet> {
    let bounds = GridBounds::from_vertices(tess.hull_vertices(), tess.resolution())?;
    let shape = bounds.shape();
    info!(
        nx = shape.nx,
        ny = shape.ny,
        nz = shape.nz,
        pores = tess.pores().len(),
        throats = tess.throats().len(),
        "starting extraction pass"
    );
    let log = ConditionLog::new();

    let labels = hulls::voxelize(tess, &bounds, config, &log);
    let fiber = fibers::build(tess, &bounds, config, &log)?;

    let normals: Vec<Option<Vector3>> = tess.throats().iter().map(|t| t.normal().ok()).collect();
    let metrics: Vec<FacetMetrics> = tess
        .throats()
        .par_iter()
        .zip(normals.par_iter())
        .map(|(throat, normal)| match normal {
            Some(normal) => facets::analyze(
                throat.id,
                &throat.vertices,
                normal,
                tess.fiber_radius(),
                config.raster_size,
                &log,
            ),
            None => {
                log.record(Condition::DegenerateFacet {
                    throat: Some(throat.id),
                    pore: None,
                });
                FacetMetrics::default()
            }
        })
        .collect();

    let (pores, throats, phase_counts) =
        aggregate::aggregate(tess, &bounds, &labels, &fiber, normals, metrics);
    info!(porosity = phase_counts.porosity(), "extraction pass complete");

    Ok(GeometrySet {
        pores,
        throats,
        phase_counts,
        conditions: log.into_entries(),
    })
}
