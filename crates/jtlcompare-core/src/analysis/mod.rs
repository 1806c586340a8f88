//! Pure computations over parsed records.

pub mod apdex;
pub mod percentile;
pub mod statistics;
pub mod timeseries;

pub use apdex::{score_apdex, ApdexRating, ApdexResult, ApdexThresholds, ApdexZone};
pub use percentile::nearest_rank;
pub use statistics::{aggregate, observed_duration_secs, EndpointStatistics, Statistics, TOTAL_LABEL};
pub use timeseries::{
    bucket_time_series, Dataset, SeriesSummary, TimeSeries, TimeSeriesBucket, BUCKET_WIDTH_MS,
};
