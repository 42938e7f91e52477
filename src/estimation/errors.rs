/// Crate-wide result alias for estimation operations.
pub type EstResult<T> = Result<T, EstimationError>;

#[derive(Debug, Clone, PartialEq)]
pub enum EstimationError {
    // ---- Matrix shape ----
    /// Matrix must be square.
    NonSquareMatrix {
        rows: usize,
        cols: usize,
    },

    /// Two matrices (or a matrix and a vector) disagree in dimension.
    ShapeMismatch {
        expected: usize,
        found: usize,
        context: &'static str,
    },

    /// Row index outside the matrix dimension.
    RowIndexOutOfBounds {
        index: usize,
        dim: usize,
    },

    // ---- Counting ----
    /// Lag must be at least 1.
    InvalidLag {
        lag: usize,
    },

    /// No input trajectory is long enough to produce a single count.
    DegenerateData {
        reason: &'static str,
    },

    // ---- Estimator options ----
    /// Iteration cap must be positive.
    InvalidMaxIter {
        maxiter: usize,
    },

    /// Convergence tolerance must be finite and positive.
    InvalidMaxErr {
        maxerr: f64,
    },

    /// Initial matrix of absolute probabilities has the wrong shape or
    /// contains non-finite or negative entries.
    InvalidXinit {
        reason: &'static str,
    },

    /// Supplied stationary distribution is not a probability vector.
    InvalidStationaryVector {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    // ---- Estimation ----
    /// Reversible estimation requires strictly positive row sums.
    ZeroRowSum {
        row: usize,
    },

    // ---- Unsupported ----
    /// Explicitly unsupported operation; never silently approximated.
    NotImplemented {
        what: &'static str,
    },
}

impl std::error::Error for EstimationError {}

impl std::fmt::Display for EstimationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Matrix shape ----
            EstimationError::NonSquareMatrix { rows, cols } => {
                write!(f, "Matrix must be square, got {rows}x{cols}")
            }
            EstimationError::ShapeMismatch { expected, found, context } => {
                write!(f, "Dimension mismatch in {context}: expected {expected}, found {found}")
            }
            EstimationError::RowIndexOutOfBounds { index, dim } => {
                write!(f, "Row index {index} out of bounds for dimension {dim}")
            }

            // ---- Counting ----
            EstimationError::InvalidLag { lag } => {
                write!(f, "Lag must be at least 1, got {lag}")
            }
            EstimationError::DegenerateData { reason } => {
                write!(f, "Degenerate input data: {reason}")
            }

            // ---- Estimator options ----
            EstimationError::InvalidMaxIter { maxiter } => {
                write!(f, "Maximum iterations must be positive, got {maxiter}")
            }
            EstimationError::InvalidMaxErr { maxerr } => {
                write!(f, "Convergence tolerance must be finite and positive, got {maxerr}")
            }
            EstimationError::InvalidXinit { reason } => {
                write!(f, "Invalid initial matrix of absolute probabilities: {reason}")
            }
            EstimationError::InvalidStationaryVector { index, value, reason } => {
                write!(f, "Invalid stationary distribution at index {index}: {value}: {reason}")
            }

            // ---- Estimation ----
            EstimationError::ZeroRowSum { row } => {
                write!(f, "Count matrix has a zero row sum at row {row}; reversible estimation requires positive row sums")
            }

            // ---- Unsupported ----
            EstimationError::NotImplemented { what } => {
                write!(f, "Not implemented: {what}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // Display messages embed their payloads; conversions and actual error
    // conditions are covered where the errors are produced.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that messages carry enough payload to identify the failing
    // input without a debugger.
    //
    // Given
    // -----
    // - A selection of variants with distinctive payload values.
    //
    // Expect
    // ------
    // - Each formatted message contains its payload values.
    fn display_messages_embed_payload() {
        // Arrange / Act / Assert
        let e = EstimationError::NonSquareMatrix { rows: 3, cols: 5 };
        assert!(e.to_string().contains("3x5"));

        let e = EstimationError::InvalidLag { lag: 0 };
        assert!(e.to_string().contains('0'));

        let e = EstimationError::ZeroRowSum { row: 7 };
        assert!(e.to_string().contains('7'));

        let e = EstimationError::NotImplemented { what: "milestoning counts" };
        assert!(e.to_string().contains("milestoning counts"));
    }
}
