pub mod distance;
pub mod raster;
pub mod regions;

use crate::error::VoxelError;
use crate::math::Point3;

/// Per-axis voxel counts of a dense 3D grid, stored in C order
/// (`x` slowest, `z` fastest).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl GridShape {
    /// Total number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Returns `true` when the grid holds no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Linear index of cell `(x, y, z)`.
    #[must_use]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.ny + y) * self.nz + z
    }

    /// Cell coordinates of linear index `i`.
    #[must_use]
    pub fn coords(&self, i: usize) -> (usize, usize, usize) {
        let z = i % self.nz;
        let y = (i / self.nz) % self.ny;
        let x = i / (self.ny * self.nz);
        (x, y, z)
    }

    /// Whether signed cell coordinates fall inside the grid.
    #[must_use]
    pub fn contains(&self, x: i64, y: i64, z: i64) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && (x as usize) < self.nx
            && (y as usize) < self.ny
            && (z as usize) < self.nz
    }
}

/// Dense 3D voxel array. Used for the pore label volume, the fiber/pore
/// phase volume, and the distance field; all three are scratch values scoped
/// to one extraction pass.
#[derive(Debug, Clone)]
pub struct VoxelGrid<T> {
    shape: GridShape,
    data: Vec<T>,
}

impl<T: Clone> VoxelGrid<T> {
    /// Allocates a grid with every cell set to `value`.
    #[must_use]
    pub fn filled(shape: GridShape, value: T) -> Self {
        Self {
            shape,
            data: vec![value; shape.len()],
        }
    }

    /// Grid shape.
    #[must_use]
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Cell value at `(x, y, z)`.
    #[must_use]
    pub fn get(&self, x: usize, y: usize, z: usize) -> &T {
        &self.data[self.shape.index(x, y, z)]
    }

    /// Sets the cell value at `(x, y, z)`.
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: T) {
        let i = self.shape.index(x, y, z);
        self.data[i] = value;
    }

    /// Flat cell storage.
    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable flat cell storage.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}

/// Physical placement of a voxel grid: the axis-aligned bounding box covering
/// all pore hull vertices, discretized at a uniform resolution.
#[derive(Debug, Clone)]
pub struct GridBounds {
    origin: Point3,
    resolution: f64,
    shape: GridShape,
}

impl GridBounds {
    /// Computes bounds from the hull vertices of every pore.
    ///
    /// The per-axis voxel count is `round(extent / resolution) + 1`, so both
    /// extremes of the domain land on a voxel center.
    ///
    /// # Errors
    ///
    /// Returns `VoxelError::EmptyGrid` when no vertices are supplied.
    pub fn from_vertices<'a, I>(vertices: I, resolution: f64) -> Result<Self, VoxelError>
    where
        I: IntoIterator<Item = &'a Point3>,
    {
        let mut iter = vertices.into_iter();
        let first = iter
            .next()
            .ok_or_else(|| VoxelError::EmptyGrid("no hull vertices".into()))?;
        let mut min = *first;
        let mut max = *first;
        for p in iter {
            min = Point3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
            max = Point3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
        }
        let extent = max - min;
        let shape = GridShape {
            nx: (extent.x / resolution).round() as usize + 1,
            ny: (extent.y / resolution).round() as usize + 1,
            nz: (extent.z / resolution).round() as usize + 1,
        };
        Ok(Self {
            origin: min,
            resolution,
            shape,
        })
    }

    /// Grid shape.
    #[must_use]
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    /// Domain origin (minimum corner).
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Voxel edge length.
    #[must_use]
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Maps a physical point to the signed coordinates of the nearest voxel
    /// center; the result may lie outside the grid.
    #[must_use]
    pub fn to_voxel(&self, p: &Point3) -> (i64, i64, i64) {
        let v = (p - self.origin) / self.resolution;
        (
            v.x.round() as i64,
            v.y.round() as i64,
            v.z.round() as i64,
        )
    }

    /// Maps a physical point into continuous voxel-frame coordinates.
    #[must_use]
    pub fn to_voxel_frame(&self, p: &Point3) -> Point3 {
        ((p - self.origin) / self.resolution).into()
    }

    /// Physical position of the voxel center `(x, y, z)`.
    #[must_use]
    pub fn to_physical(&self, x: usize, y: usize, z: usize) -> Point3 {
        Point3::new(
            self.origin.x + x as f64 * self.resolution,
            self.origin.y + y as f64 * self.resolution,
            self.origin.z + z as f64 * self.resolution,
        )
    }
}
