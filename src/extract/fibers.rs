use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::conditions::{Condition, ConditionLog};
use crate::error::{Result, VoxelError};
use crate::grid::distance::{seed_value, squared_edt_3d};
use crate::grid::{GridBounds, VoxelGrid};
use crate::tessellation::Tessellation;

use super::{ExtractConfig, MemoryMode};

/// Phase value for voxels inside a fiber.
pub(crate) const FIBER: u8 = 0;
/// Phase value for voxels in the open pore space.
pub(crate) const PORE: u8 = 1;

/// Output of the fiber-space pass: the per-voxel phase classification and
/// the clamped distance field `max(d - r, 0)` (voxel units) reused by the
/// pore indiameter queries.
#[derive(Debug)]
pub(crate) struct FiberSpace {
    pub phase: VoxelGrid<u8>,
    pub distance: VoxelGrid<f64>,
}

/// A cubic processing chunk: the core region that is written, expanded by a
/// halo on every side when read, so the chunk-local distance transform is
/// not truncated near seeds just outside the core.
#[derive(Debug, Clone, Copy)]
struct Chunk {
    x0: usize,
    x1: usize,
    y0: usize,
    y1: usize,
    z0: usize,
    z1: usize,
}

/// Rasterizes all throat facet edges into fiber seed voxels, then classifies
/// every voxel as fiber or pore phase by thresholding the Euclidean distance
/// transform at the fiber radius.
pub(crate) fn build(
    tess: &Tessellation,
    bounds: &GridBounds,
    config: &ExtractConfig,
    log: &ConditionLog,
) -> Result<FiberSpace> {
    let shape = bounds.shape();
    let resolution = tess.resolution();
    // Fiber radius in voxel units.
    let r_vox = ((tess.fiber_radius() - resolution / 2.0) / resolution).round();

    let seeds = seed_volume(tess, bounds, log);
    let seed_total = seeds.data().iter().filter(|&&s| s == FIBER).count();
    if seed_total == 0 {
        warn!("no fiber seeds; classifying the whole domain as pore phase");
        return Ok(FiberSpace {
            phase: VoxelGrid::filled(shape, PORE),
            distance: VoxelGrid::filled(shape, 0.0),
        });
    }
    debug!(seed_total, r_vox, "fiber seeding complete");

    let halo = if r_vox > 0.0 {
        (5.0 * r_vox).ceil() as usize
    } else {
        0
    };
    let chunked = select_strategy(shape.len() as u64, halo, config)?;

    let (phase, distance) = if chunked {
        info!(
            chunk_len = config.chunk_len,
            halo, "processing fiber space in chunks"
        );
        chunked_transform(&seeds, r_vox, config.chunk_len, halo)
    } else {
        full_transform(&seeds, r_vox)
    };
    Ok(FiberSpace { phase, distance })
}

/// Walks every throat facet's closed hull-ordered polygon at half-voxel
/// steps and marks the sampled voxels as fiber seeds. Out-of-bounds samples
/// (coordinate rounding at the domain edge) are dropped with a condition.
fn seed_volume(tess: &Tessellation, bounds: &GridBounds, log: &ConditionLog) -> VoxelGrid<u8> {
    let shape = bounds.shape();
    let step = tess.resolution() / 2.0;

    let per_throat: Vec<Vec<(i64, i64, i64)>> = tess
        .throats()
        .par_iter()
        .map(|throat| {
            let Some(ordered) = throat.hull_ordered_vertices() else {
                debug!(throat = throat.id, "facet has no polygon; not seeded");
                return Vec::new();
            };
            let mut samples = Vec::new();
            for i in 0..ordered.len() {
                let from = ordered[if i == 0 { ordered.len() - 1 } else { i - 1 }];
                let edge = ordered[i] - from;
                let increments = ((edge.norm() / step).ceil() as usize).max(2);
                let mut last = None;
                for j in 0..increments {
                    let t = j as f64 / (increments - 1) as f64;
                    let vox = bounds.to_voxel(&(from + edge * t));
                    if last != Some(vox) {
                        samples.push(vox);
                        last = Some(vox);
                    }
                }
            }
            samples
        })
        .collect();

    let mut seeds = VoxelGrid::filled(shape, PORE);
    let mut out_of_bounds = 0usize;
    for samples in &per_throat {
        for &(x, y, z) in samples {
            if shape.contains(x, y, z) {
                seeds.set(x as usize, y as usize, z as usize, FIBER);
            } else {
                out_of_bounds += 1;
            }
        }
    }
    if out_of_bounds > 0 {
        log.record(Condition::SeedOutOfBounds {
            count: out_of_bounds,
        });
    }
    seeds
}

/// Decides chunked vs full-resolution processing up front from an estimated
/// footprint against the configured budget, instead of reacting to a failed
/// allocation.
///
/// The resident arrays (seed, phase, distance volumes) are mandatory in both
/// strategies; chunking only bounds the transform scratch. So a budget the
/// resident arrays already exceed is fatal, as is a chunk window that does
/// not fit next to them.
fn select_strategy(voxels: u64, halo: usize, config: &ExtractConfig) -> Result<bool> {
    match config.memory_mode {
        MemoryMode::Full => Ok(false),
        MemoryMode::Chunked => Ok(true),
        MemoryMode::Auto => {
            let resident = voxels * (1 + 1 + 8);
            if resident > config.memory_budget {
                return Err(VoxelError::InsufficientMemory {
                    required: resident,
                    budget: config.memory_budget,
                }
                .into());
            }
            let scratch_full = voxels * 8;
            if resident + scratch_full <= config.memory_budget {
                return Ok(false);
            }
            let window = (config.chunk_len + 2 * halo) as u64;
            let scratch_chunk = window.pow(3) * 8;
            if resident + scratch_chunk > config.memory_budget {
                return Err(VoxelError::InsufficientMemory {
                    required: resident + scratch_chunk,
                    budget: config.memory_budget,
                }
                .into());
            }
            Ok(true)
        }
    }
}

/// Single full-domain distance transform and classification.
fn full_transform(seeds: &VoxelGrid<u8>, r_vox: f64) -> (VoxelGrid<u8>, VoxelGrid<f64>) {
    let shape = seeds.shape();
    let mut field: Vec<f64> = seeds.data().iter().map(|&s| seed_value(s == FIBER)).collect();
    squared_edt_3d(&mut field, shape.nx, shape.ny, shape.nz);

    let mut phase = VoxelGrid::filled(shape, PORE);
    let mut distance = VoxelGrid::filled(shape, 0.0);
    for (i, &d2) in field.iter().enumerate() {
        let (p, d) = classify(d2, r_vox);
        phase.data_mut()[i] = p;
        distance.data_mut()[i] = d;
    }
    (phase, distance)
}

/// Chunked distance transform: every chunk reads its halo-grown window of
/// the shared seed volume and produces values for its core region only, so
/// write regions are disjoint by construction and need no merging logic.
fn chunked_transform(
    seeds: &VoxelGrid<u8>,
    r_vox: f64,
    chunk_len: usize,
    halo: usize,
) -> (VoxelGrid<u8>, VoxelGrid<f64>) {
    let shape = seeds.shape();
    let mut chunks = Vec::new();
    for x0 in (0..shape.nx).step_by(chunk_len) {
        for y0 in (0..shape.ny).step_by(chunk_len) {
            for z0 in (0..shape.nz).step_by(chunk_len) {
                chunks.push(Chunk {
                    x0,
                    x1: (x0 + chunk_len).min(shape.nx),
                    y0,
                    y1: (y0 + chunk_len).min(shape.ny),
                    z0,
                    z1: (z0 + chunk_len).min(shape.nz),
                });
            }
        }
    }

    let results: Vec<(Chunk, Vec<u8>, Vec<f64>)> = chunks
        .par_iter()
        .map(|&c| {
            let wx0 = c.x0.saturating_sub(halo);
            let wy0 = c.y0.saturating_sub(halo);
            let wz0 = c.z0.saturating_sub(halo);
            let wx1 = (c.x1 + halo).min(shape.nx);
            let wy1 = (c.y1 + halo).min(shape.ny);
            let wz1 = (c.z1 + halo).min(shape.nz);
            let (wnx, wny, wnz) = (wx1 - wx0, wy1 - wy0, wz1 - wz0);

            let mut field = vec![0.0; wnx * wny * wnz];
            for x in 0..wnx {
                for y in 0..wny {
                    for z in 0..wnz {
                        field[(x * wny + y) * wnz + z] =
                            seed_value(*seeds.get(wx0 + x, wy0 + y, wz0 + z) == FIBER);
                    }
                }
            }
            squared_edt_3d(&mut field, wnx, wny, wnz);

            let core = (c.x1 - c.x0) * (c.y1 - c.y0) * (c.z1 - c.z0);
            let mut phase = Vec::with_capacity(core);
            let mut distance = Vec::with_capacity(core);
            for x in c.x0..c.x1 {
                for y in c.y0..c.y1 {
                    for z in c.z0..c.z1 {
                        let d2 = field[((x - wx0) * wny + (y - wy0)) * wnz + (z - wz0)];
                        let (p, d) = classify(d2, r_vox);
                        phase.push(p);
                        distance.push(d);
                    }
                }
            }
            (c, phase, distance)
        })
        .collect();

    let mut phase = VoxelGrid::filled(shape, PORE);
    let mut distance = VoxelGrid::filled(shape, 0.0);
    for (c, p, d) in results {
        let mut i = 0;
        for x in c.x0..c.x1 {
            for y in c.y0..c.y1 {
                for z in c.z0..c.z1 {
                    phase.set(x, y, z, p[i]);
                    distance.set(x, y, z, d[i]);
                    i += 1;
                }
            }
        }
    }
    (phase, distance)
}

/// Phase and clamped distance for one voxel's squared seed distance.
fn classify(d2: f64, r_vox: f64) -> (u8, f64) {
    let fiber = r_vox >= 0.0 && d2 <= r_vox * r_vox;
    let phase = if fiber { FIBER } else { PORE };
    (phase, (d2.sqrt() - r_vox).max(0.0))
}
