//! Reference scoring model: TransE over learned embedding tables, plus the
//! tensor bridge between triples and burn tensors.

pub mod bridge;
pub mod transe;
