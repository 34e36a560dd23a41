use std::path::{Path, PathBuf};

use log::info;
use rand::Rng;

use crate::cooccurrence::{AccumulateOptions, Provenance, accumulate};
use crate::dictionary::{ColumnId, Dictionary, RowId};
use crate::error::Result;
use crate::filter::{RelatedMatrix, ScorePolicy, filter_top_k};
use crate::input::InputSource;
use crate::llr::score;
use crate::sampling::{AcceptPolicy, FrequencyCounts, SampleStats, SamplingCaps, downsample};
use crate::staging::{StagedFile, write_occurrences};

/// Tunables of one analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    /// Downsample each row symbol to about this many records.
    pub max_row_count: f64,
    /// Downsample each column symbol to about this many records.
    pub max_column_count: f64,
    /// Keep at most this many related symbols per symbol.
    pub max_related: usize,
    pub accept_policy: AcceptPolicy,
    pub score_policy: ScorePolicy,
    /// Cap on origin rows remembered per pair; counts stay exact.
    pub max_origins: Option<usize>,
    /// Where to put the scratch file; the system temp dir if `None`.
    pub scratch_dir: Option<PathBuf>,
}

impl AnalysisOptions {
    /// Caps of 500 per symbol and 100 related symbols per symbol. The score
    /// policy has no default and must be named.
    pub fn new(score_policy: ScorePolicy) -> Self {
        AnalysisOptions {
            max_row_count: 500.0,
            max_column_count: 500.0,
            max_related: 100,
            accept_policy: AcceptPolicy::Minimum,
            score_policy,
            max_origins: None,
            scratch_dir: None,
        }
    }
}

/// Everything a finished run produces.
#[derive(Debug, Clone)]
pub struct CooccurrenceAnalysis {
    pub rows: Dictionary<RowId>,
    pub columns: Dictionary<ColumnId>,
    pub related: RelatedMatrix,
    pub provenance: Provenance,
    pub stats: SampleStats,
}

/// Runs the whole pipeline: count, downsample, stage, square, score, filter.
///
/// `input` is read twice. The scratch file is removed before this returns,
/// whether or not the run succeeds.
pub fn analyze<R: Rng + ?Sized>(
    input: &InputSource,
    options: &AnalysisOptions,
    rng: &mut R,
) -> Result<CooccurrenceAnalysis> {
    let caps = SamplingCaps::new(options.max_row_count, options.max_column_count)?;
    let counts = FrequencyCounts::count(input)?;
    let (occurrences, stats) = downsample(input, &counts, caps, options.accept_policy, rng)?;
    let FrequencyCounts { rows, columns, .. } = counts;

    let mut staged = match &options.scratch_dir {
        Some(dir) => StagedFile::create_in(dir)?,
        None => StagedFile::create()?,
    };
    write_occurrences(&occurrences, &mut staged)?;
    let dimension = occurrences.column_count();
    drop(occurrences);

    let accumulate_options = AccumulateOptions {
        max_origins: options.max_origins,
    };
    let (cooccurrence, provenance) = accumulate(staged.reader()?, dimension, &accumulate_options)?;
    drop(staged);

    let scored = score(cooccurrence)?;
    let related = filter_top_k(&scored, options.max_related, options.score_policy);
    info!("Done");

    Ok(CooccurrenceAnalysis {
        rows,
        columns,
        related,
        provenance,
        stats,
    })
}

/// [`analyze`] over a file on disk.
pub fn analyze_path<R: Rng + ?Sized>(
    path: impl AsRef<Path>,
    options: &AnalysisOptions,
    rng: &mut R,
) -> Result<CooccurrenceAnalysis> {
    let input = InputSource::from_path(path.as_ref());
    analyze(&input, options, rng)
}
