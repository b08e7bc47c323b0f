// Pipeline: classify tweets and drive the attack simulations over a dataset.

pub mod batch;
pub mod classify;
pub mod results;
