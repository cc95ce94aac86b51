pub mod continent;
pub mod merge;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod source;

pub use continent::{Continent, continent_for};
pub use merge::{FragmentMerger, merge_fragments, merge_key};
pub use metrics::{apply_metrics, sick_count};
pub use model::{Coordinates, MetricKind, ObservationFragment, Record, UNCATEGORIZED};
pub use normalize::{NormalizeError, normalize_row, normalize_rows};
pub use source::{RawRow, SourceError, read_rows, read_rows_from_path};
