//! Filtered ranking evaluation, rank metrics and unfiltered link prediction.

pub mod link;
pub mod metrics;
pub mod ranking;
