//! Resumable rational reconstruction of a CRT matrix.

use std::fmt::Display;

use tracing::{debug, trace};

use crate::domains::{integer::Integer, rational::RationalReconstruction};

use super::{
    matrix::{CrtMatrix, RationalMatrix},
    LiftError,
};

/// The number of leading row-major entries that were confirmed by the last scan.
/// Entries before the cursor are not reconstructed again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResumeCursor(usize);

impl ResumeCursor {
    /// A cursor for a new lift, which trusts no entries.
    pub fn new() -> ResumeCursor {
        ResumeCursor(0)
    }

    pub fn position(&self) -> usize {
        self.0
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

/// The progress of a reconstruction scan, as the fraction of confirmed entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    Partial { confirmed: usize, total: usize },
    Complete,
}

impl Progress {
    /// Write the progress marker to stderr. A line break follows
    /// the marker of a complete reconstruction.
    pub fn emit(&self) {
        match self {
            Progress::Partial { .. } => eprint!("{}", self),
            Progress::Complete => eprintln!("{}", self),
        }
    }
}

impl Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Progress::Partial { confirmed, total } => {
                write!(f, "<{:.2}%>", 100. * (*confirmed as f64) / (*total as f64))
            }
            Progress::Complete => f.write_str("<100.0%>"),
        }
    }
}

/// The result of a reconstruction scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanOutcome {
    /// The number of leading entries that reconstructed.
    pub confirmed: usize,
    /// The number of dense entries.
    pub total: usize,
    /// The cursor to pass to the next scan.
    pub cursor: ResumeCursor,
    /// The progress to report, if any.
    pub progress: Option<Progress>,
}

impl ScanOutcome {
    /// Returns `true` iff every entry has been reconstructed.
    pub fn is_complete(&self) -> bool {
        self.confirmed == self.total
    }
}

/// Reconstruct the entries of `crt`, residues modulo `modulus`, into `rational`
/// in row-major order, starting at `cursor`.
///
/// The scan stops at the first entry that does not reconstruct. The returned cursor
/// then points to the last confirmed entry, so that it is verified again in the next round.
pub fn reconstruct_dense_entries<R: RationalReconstruction>(
    rational: &mut RationalMatrix,
    crt: &CrtMatrix,
    modulus: &Integer,
    reconstructor: &R,
    cursor: ResumeCursor,
) -> Result<ScanOutcome, LiftError> {
    if rational.structure != crt.structure {
        return Err(LiftError::StructureMismatch);
    }

    let total = crt.len();
    let mut confirmed = 0;

    for (i, (q, a)) in rational.data.iter_mut().zip(&crt.data).enumerate() {
        if i >= cursor.0 {
            match reconstructor.reconstruct(a, modulus) {
                Some(r) => *q = r,
                None => {
                    trace!("Reconstruction failed at entry {}", i);
                    let progress = if confirmed > cursor.0 + 1 {
                        Some(Progress::Partial { confirmed, total })
                    } else {
                        None
                    };

                    let new_cursor = ResumeCursor(confirmed.saturating_sub(1));
                    debug!(
                        "Confirmed {}/{} entries, cursor {} -> {}",
                        confirmed, total, cursor.0, new_cursor.0
                    );

                    return Ok(ScanOutcome {
                        confirmed,
                        total,
                        cursor: new_cursor,
                        progress,
                    });
                }
            }
        }

        confirmed += 1;
    }

    debug!("Reconstructed all {} entries", total);
    Ok(ScanOutcome {
        confirmed,
        total,
        cursor: ResumeCursor(total),
        progress: Some(Progress::Complete),
    })
}
