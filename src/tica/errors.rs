/// Crate-wide result alias for TICA operations.
pub type TicaResult<T> = Result<T, TicaError>;

#[derive(Debug, Clone, PartialEq)]
pub enum TicaError {
    // ---- Configuration ----
    /// Lag must be at least 1.
    InvalidLag {
        lag: usize,
    },

    /// dim and var_cutoff are mutually exclusive.
    MutuallyExclusiveDim {
        dim: usize,
        var_cutoff: f64,
    },

    /// var_cutoff must lie in (0, 1].
    InvalidVarCutoff {
        var_cutoff: f64,
    },

    /// dim must be at least 1 when set.
    InvalidDim {
        dim: usize,
    },

    /// Eigenvalue cutoff must be finite and positive.
    InvalidEpsilon {
        epsilon: f64,
    },

    /// Stride must be at least 1.
    InvalidStride {
        stride: usize,
    },

    /// Chunk size must be at least 1.
    InvalidChunkSize {
        chunk_size: usize,
    },

    /// Precomputed mean length must match the input dimension.
    InvalidMeanLength {
        expected: usize,
        found: usize,
    },

    // ---- Accumulation ----
    /// Chunk shapes disagree with each other or with earlier chunks.
    ShapeMismatch {
        expected: usize,
        found: usize,
        context: &'static str,
    },

    /// Operation not allowed in the accumulator's current state.
    StateError {
        operation: &'static str,
        state: &'static str,
    },

    /// Finalization without any accumulated chunk.
    EmptyAccumulator,

    // ---- Estimation ----
    /// No trajectory is long enough for the configured lag and stride.
    DegenerateData {
        lag: usize,
        longest: usize,
    },

    /// Every covariance eigendirection fell below the epsilon cutoff.
    RankDeficient {
        epsilon: f64,
    },

    /// Requested more output dimensions than the input provides.
    DimensionTooLarge {
        dim: usize,
        input_dim: usize,
    },
}

impl std::error::Error for TicaError {}

impl std::fmt::Display for TicaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Configuration ----
            TicaError::InvalidLag { lag } => {
                write!(f, "Lag must be at least 1, got {lag}")
            }
            TicaError::MutuallyExclusiveDim { dim, var_cutoff } => {
                write!(
                    f,
                    "dim ({dim}) and var_cutoff ({var_cutoff}) are mutually exclusive; set one or the other"
                )
            }
            TicaError::InvalidVarCutoff { var_cutoff } => {
                write!(f, "var_cutoff must lie in (0, 1], got {var_cutoff}")
            }
            TicaError::InvalidDim { dim } => {
                write!(f, "dim must be at least 1, got {dim}")
            }
            TicaError::InvalidEpsilon { epsilon } => {
                write!(f, "Eigenvalue cutoff must be finite and positive, got {epsilon}")
            }
            TicaError::InvalidStride { stride } => {
                write!(f, "Stride must be at least 1, got {stride}")
            }
            TicaError::InvalidChunkSize { chunk_size } => {
                write!(f, "Chunk size must be at least 1, got {chunk_size}")
            }
            TicaError::InvalidMeanLength { expected, found } => {
                write!(f, "Precomputed mean has length {found}, input dimension is {expected}")
            }

            // ---- Accumulation ----
            TicaError::ShapeMismatch { expected, found, context } => {
                write!(f, "Dimension mismatch in {context}: expected {expected}, found {found}")
            }
            TicaError::StateError { operation, state } => {
                write!(f, "Operation '{operation}' not allowed in state '{state}'")
            }
            TicaError::EmptyAccumulator => {
                write!(f, "Cannot finalize an accumulator that has seen no data")
            }

            // ---- Estimation ----
            TicaError::DegenerateData { lag, longest } => {
                write!(
                    f,
                    "No trajectory is longer than the lag: longest has {longest} strided frames, lag is {lag}"
                )
            }
            TicaError::RankDeficient { epsilon } => {
                write!(f, "Covariance matrix has no eigenvalue above the cutoff {epsilon:e}")
            }
            TicaError::DimensionTooLarge { dim, input_dim } => {
                write!(f, "Requested {dim} output dimensions from {input_dim}-dimensional input")
            }
        }
    }
}
