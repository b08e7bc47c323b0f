// Notewatch: collusion-cost analysis for crowd-sourced note rankings
//
// This is the library root. Each module corresponds to a stage of the
// analysis: load the dumps, score and rank notes, simulate attacks,
// persist and display the results.

pub mod config;
pub mod data;
pub mod output;
pub mod pipeline;
pub mod scoring;
