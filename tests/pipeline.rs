#![allow(clippy::expect_used)]

use approx::{assert_abs_diff_eq, assert_relative_eq};
use nalgebra::Point3;

use porevox::error::VoxelError;
use porevox::{
    extract, Condition, ExtractConfig, MemoryMode, PoreHull, PorevoxError, Tessellation,
    ThroatFacet,
};

/// Binds a subscriber so `RUST_LOG=porevox=debug` shows pass progress.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Corners of a unit cube whose minimum corner sits at `(x0, y0, z0)`.
fn cube(x0: f64, y0: f64, z0: f64) -> Vec<Point3<f64>> {
    let mut corners = Vec::new();
    for x in [0.0, 1.0] {
        for y in [0.0, 1.0] {
            for z in [0.0, 1.0] {
                corners.push(Point3::new(x0 + x, y0 + y, z0 + z));
            }
        }
    }
    corners
}

/// The unit square facet at `x = 1` shared by the two-cube tessellation.
fn shared_facet() -> Vec<Point3<f64>> {
    vec![
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(1.0, 0.0, 1.0),
    ]
}

/// Two unit-cube pores side by side along x, one shared throat facet.
fn two_cubes(fiber_radius: f64, resolution: f64) -> Tessellation {
    let pores = vec![
        PoreHull { id: 0, vertices: cube(0.0, 0.0, 0.0) },
        PoreHull { id: 1, vertices: cube(1.0, 0.0, 0.0) },
    ];
    let throats = vec![ThroatFacet {
        id: 0,
        vertices: shared_facet(),
        pores: (0, 1),
    }];
    Tessellation::new(pores, throats, fiber_radius, resolution).expect("valid tessellation")
}

#[test]
fn unit_cube_volume_converges_with_resolution() {
    init_tracing();
    let mut errors = Vec::new();
    for resolution in [0.25, 0.125, 0.0625] {
        let pores = vec![PoreHull { id: 0, vertices: cube(0.0, 0.0, 0.0) }];
        let tess = Tessellation::new(pores, vec![], 0.01, resolution).expect("valid tessellation");
        let geometry = extract(&tess, &ExtractConfig::default()).expect("extraction succeeds");
        let volume = geometry.pores[0].volume;
        let error = (volume - 1.0).abs();
        assert!(
            error <= 4.0 * resolution,
            "volume {volume} at resolution {resolution} off by {error}"
        );
        errors.push(error);
    }
    assert!(errors[0] > errors[1] && errors[1] > errors[2]);
}

#[test]
fn square_facet_measures_the_eroded_square() {
    init_tracing();
    // Side 1, fiber radius 0.1: the eroded channel is a 0.8 x 0.8 square.
    let tess = two_cubes(0.1, 0.1);
    let geometry = extract(&tess, &ExtractConfig::default()).expect("extraction succeeds");
    let throat = &geometry.throats[0];

    assert_abs_diff_eq!(throat.cross_sectional_area, 0.64, epsilon = 0.03);
    assert_abs_diff_eq!(throat.indiameter, 0.8, epsilon = 0.04);
    assert_eq!(throat.offset_vertices.len(), 4);

    let centroid = throat.centroid.expect("open throat has a centroid");
    assert_abs_diff_eq!(centroid.x, 1.0, epsilon = 1e-6);
    assert_abs_diff_eq!(centroid.y, 0.5, epsilon = 0.02);
    assert_abs_diff_eq!(centroid.z, 0.5, epsilon = 0.02);

    // Pore centroids sit at x = 0.5 and x = 1.5, so both conduit halves are
    // 0.5 less the fiber radius, and the crossing is one fiber diameter.
    let conduit = throat.conduit_lengths.expect("open throat has lengths");
    assert_abs_diff_eq!(conduit.pore1, 0.4, epsilon = 0.02);
    assert_abs_diff_eq!(conduit.throat, 0.2, epsilon = 1e-12);
    assert_abs_diff_eq!(conduit.pore2, 0.4, epsilon = 0.02);
    assert_abs_diff_eq!(conduit.total(), 1.0, epsilon = 0.04);

    // Equivalent circle diameter of the eroded area.
    let expected = 2.0 * (throat.cross_sectional_area / std::f64::consts::PI).sqrt();
    assert_relative_eq!(throat.diameter, expected, epsilon = 1e-12);

    for pore in &geometry.pores {
        assert!(pore.volume > 0.5 && pore.volume < 1.5);
        assert!(pore.indiameter > 0.0);
        assert!(pore.incenter.is_some());
    }
}

#[test]
fn thick_fiber_fully_occludes_the_throat() {
    init_tracing();
    // Fiber radius at or past half the facet side closes the channel.
    let tess = two_cubes(0.6, 0.1);
    let geometry = extract(&tess, &ExtractConfig::default()).expect("extraction succeeds");
    let throat = &geometry.throats[0];

    assert_eq!(throat.cross_sectional_area, 0.0);
    assert_eq!(throat.perimeter, 0.0);
    assert_eq!(throat.indiameter, 0.0);
    assert!(throat.offset_vertices.is_empty());
    assert!(throat.centroid.is_none());
    assert!(throat.conduit_lengths.is_none());
    assert!(geometry
        .conditions
        .contains(&Condition::Occluded { throat: 0 }));
}

#[test]
fn chunked_and_full_transforms_classify_identically() {
    init_tracing();
    let tess = two_cubes(0.15, 0.1);
    let full = extract(
        &tess,
        &ExtractConfig {
            memory_mode: MemoryMode::Full,
            ..ExtractConfig::default()
        },
    )
    .expect("full-resolution pass succeeds");
    let chunked = extract(
        &tess,
        &ExtractConfig {
            memory_mode: MemoryMode::Chunked,
            chunk_len: 6,
            ..ExtractConfig::default()
        },
    )
    .expect("chunked pass succeeds");

    assert_eq!(full.phase_counts, chunked.phase_counts);
    for (a, b) in full.pores.iter().zip(&chunked.pores) {
        assert_eq!(a.volume, b.volume, "pore {} volume differs", a.id);
    }
    for (a, b) in full.throats.iter().zip(&chunked.throats) {
        assert_eq!(a.cross_sectional_area, b.cross_sectional_area);
    }
}

#[test]
fn tiling_hulls_leave_no_voxel_unassigned() {
    init_tracing();
    // Four unit cubes tiling [0,2] x [0,2] x [0,1].
    let pores = vec![
        PoreHull { id: 0, vertices: cube(0.0, 0.0, 0.0) },
        PoreHull { id: 1, vertices: cube(1.0, 0.0, 0.0) },
        PoreHull { id: 2, vertices: cube(0.0, 1.0, 0.0) },
        PoreHull { id: 3, vertices: cube(1.0, 1.0, 0.0) },
    ];
    let tess = Tessellation::new(pores, vec![], 0.01, 0.1).expect("valid tessellation");
    let geometry = extract(&tess, &ExtractConfig::default()).expect("extraction succeeds");

    assert!(!geometry
        .conditions
        .iter()
        .any(|c| matches!(c, Condition::UnassignedVoxels { .. })));

    // With every voxel labeled and no fibers, the pore volumes partition
    // the whole domain.
    let total: f64 = geometry.pores.iter().map(|p| p.volume).sum();
    let resolution: f64 = 0.1;
    let domain = geometry.phase_counts.pore as f64 * resolution.powi(3);
    assert_relative_eq!(total, domain, epsilon = 1e-9);
}

#[test]
fn phases_partition_the_domain() {
    init_tracing();
    let tess = two_cubes(0.1, 0.1);
    let geometry = extract(&tess, &ExtractConfig::default()).expect("extraction succeeds");
    let counts = geometry.phase_counts;
    assert_eq!(counts.fiber + counts.pore, 21 * 11 * 11);
    assert!(counts.fiber > 0);
    assert!(geometry.porosity() < 1.0);
}

#[test]
fn fiber_phase_grows_monotonically_with_radius() {
    init_tracing();
    let thin = extract(&two_cubes(0.1, 0.1), &ExtractConfig::default())
        .expect("extraction succeeds");
    let thick = extract(&two_cubes(0.25, 0.1), &ExtractConfig::default())
        .expect("extraction succeeds");
    assert!(thick.phase_counts.fiber >= thin.phase_counts.fiber);
    assert!(thick.porosity() <= thin.porosity());
    for (a, b) in thin.pores.iter().zip(&thick.pores) {
        assert!(b.volume <= a.volume);
    }
}

#[test]
fn degenerate_pore_hull_recovers_as_zero_volume() {
    init_tracing();
    let pores = vec![
        PoreHull { id: 0, vertices: cube(0.0, 0.0, 0.0) },
        PoreHull {
            id: 1,
            vertices: vec![
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 1.0, 0.0),
                Point3::new(2.0, 0.0, 1.0),
            ],
        },
    ];
    let tess = Tessellation::new(pores, vec![], 0.01, 0.1).expect("valid tessellation");
    let geometry = extract(&tess, &ExtractConfig::default()).expect("extraction succeeds");

    assert!(geometry.pores[0].volume > 0.0);
    assert_eq!(geometry.pores[1].volume, 0.0);
    assert_eq!(geometry.pores[1].indiameter, 0.0);
    assert!(geometry.pores[1].incenter.is_none());
    assert!(geometry.conditions.contains(&Condition::DegenerateFacet {
        throat: None,
        pore: Some(1),
    }));
}

#[test]
fn impossible_memory_budget_is_fatal() {
    init_tracing();
    let tess = two_cubes(0.1, 0.1);
    let config = ExtractConfig {
        memory_mode: MemoryMode::Auto,
        memory_budget: 64,
        ..ExtractConfig::default()
    };
    let err = extract(&tess, &config).expect_err("budget cannot be met");
    assert!(matches!(
        err,
        PorevoxError::Voxel(VoxelError::InsufficientMemory { .. })
    ));
}
