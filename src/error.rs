use thiserror::Error;

/// Top-level error type for the porevox extraction pipeline.
#[derive(Debug, Error)]
pub enum PorevoxError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Voxel(#[from] VoxelError),
}

/// Errors in the tessellation snapshot consumed from the adapter boundary.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("scalar {name} = {value} must be positive")]
    NonPositiveScalar { name: &'static str, value: f64 },

    #[error("pore id {id} does not match its index {index}; ids must be dense")]
    NonDenseId { id: usize, index: usize },

    #[error("throat {throat} references unknown pore {pore}")]
    UnknownPore { throat: usize, pore: usize },

    #[error("tessellation has no pores")]
    Empty,
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors related to voxel grid construction.
#[derive(Debug, Error)]
pub enum VoxelError {
    #[error(
        "insufficient memory: pass needs {required} bytes against a budget of \
         {budget} bytes and no viable chunking exists"
    )]
    InsufficientMemory { required: u64, budget: u64 },

    #[error("voxel grid would be empty: {0}")]
    EmptyGrid(String),
}

/// Convenience type alias for results using [`PorevoxError`].
pub type Result<T> = std::result::Result<T, PorevoxError>;
