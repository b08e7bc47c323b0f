// Scoring: note tallies, the helpfulness ranking, and the attack simulator.

pub mod attack;
pub mod ranking;
pub mod tally;
