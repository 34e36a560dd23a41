use std::fmt;
use std::io;
use std::path::PathBuf;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, CoocError>;

/// Pipeline stage in which an I/O failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Read,
    Staging,
    Accumulation,
    Export,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Read => "read",
            Phase::Staging => "staging",
            Phase::Accumulation => "accumulation",
            Phase::Export => "export",
        };
        f.write_str(name)
    }
}

/// Every way a cooccurrence run can fail. None of these are retried; the run
/// aborts and produces no result.
#[derive(Debug, thiserror::Error)]
pub enum CoocError {
    #[error("line {line}: expected two tab-separated fields, got {content:?}")]
    MalformedRecord { line: u64, content: String },

    #[error("{space} id {id} out of range for dictionary of size {size}")]
    InvalidId {
        space: &'static str,
        id: u32,
        size: usize,
    },

    #[error("negative contingency cell: k11={k11} k12={k12} k21={k21} k22={k22}")]
    NumericDomain {
        k11: i128,
        k12: i128,
        k21: i128,
        k22: i128,
    },

    #[error("line {line}: input changed between passes (token not seen in first pass)")]
    InputChanged { line: u64 },

    #[error("{name} must be a positive number or inf, got {value}")]
    InvalidCap { name: &'static str, value: f64 },

    #[error("{space} vocabulary exceeds {limit} symbols")]
    Capacity { space: &'static str, limit: u64 },

    #[error("corrupt staging file: {reason}")]
    CorruptStaging { reason: String },

    #[error("I/O error during {phase} on {}: {source}", .path.display())]
    Io {
        phase: Phase,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CoocError {
    pub(crate) fn io(phase: Phase, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> CoocError {
        let path = path.into();
        move |source| CoocError::Io {
            phase,
            path,
            source,
        }
    }
}
