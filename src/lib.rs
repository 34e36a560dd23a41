//! # cooc
//!
//! Finds statistically significant cooccurrence in a stream of
//! `(row, column)` records such as `(document, term)` or `(user, item)`.
//!
//! For every column symbol the result is a short, ranked list of other column
//! symbols that appear in the same rows more often than chance predicts,
//! together with the rows that support each pair.
//!
//! The pipeline is built to run a billion records on one machine:
//!
//! 1. [`FrequencyCounts::count`] interns all symbols and counts them.
//! 2. [`downsample`] re-reads the input and keeps each record with a
//!    probability that caps every symbol's frequency.
//! 3. [`write_occurrences`] stages the sample on disk in row-major order.
//! 4. [`accumulate`] streams the staged rows and counts column pairs.
//! 5. [`score`] replaces counts with signed root log-likelihood ratios.
//! 6. [`filter_top_k`] keeps the best related symbols per symbol.
//!
//! [`analyze`] runs all of it.
//!
//! ## Example
//! ```
//! use cooc::{AnalysisOptions, InputSource, ScorePolicy, analyze, collect_records};
//! use rand::SeedableRng;
//!
//! let input = InputSource::from_reader(std::io::Cursor::new(
//!     "d1\tapple\nd1\tpie\nd2\tapple\nd2\tpie\nd3\tcar\nd3\troad\n",
//! ))
//! .unwrap();
//! let options = AnalysisOptions::new(ScorePolicy::All);
//! let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(1);
//! let analysis = analyze(&input, &options, &mut rng).unwrap();
//! let records = collect_records(&analysis).unwrap();
//! assert!(records.iter().any(|r| r.item == "apple" && r.related == "pie" && r.evidence == 2));
//! ```

#![forbid(unsafe_code)]

pub mod cooccurrence;
pub mod dictionary;
pub mod error;
pub mod export;
pub mod filter;
pub mod input;
pub mod llr;
pub mod pipeline;
pub mod progress;
pub mod sampling;
pub mod sparse;
pub mod staging;

pub use cooccurrence::{
    AccumulateOptions, CooccurrenceCounts, Evidence, Provenance, accumulate, square,
};
pub use dictionary::{ColumnId, Dictionary, RowId, SymbolId};
pub use error::{CoocError, Phase, Result};
pub use export::{
    CooccurrenceRecord, ExportFormat, collect_records, csv_safe_cell, save_records, write_records,
};
pub use filter::{RelatedEntry, RelatedMatrix, ScorePolicy, filter_top_k};
pub use input::{InputSource, Record};
pub use llr::{
    ContingencyTable, Marginals, ScoredMatrix, log_likelihood_ratio, root_log_likelihood_ratio,
    score,
};
pub use pipeline::{AnalysisOptions, CooccurrenceAnalysis, analyze, analyze_path};
pub use sampling::{
    AcceptPolicy, FrequencyCounts, OccurrenceMatrix, SampleStats, SamplingCaps, check_cap,
    downsample,
};
pub use staging::{StagedFile, StagedReader, StagedRow, write_occurrences};
