// src/risk/mod.rs

pub mod abstention;
pub mod memory;
pub mod scorer;

pub use abstention::AbstentionEngine;
pub use memory::RiskMemory;
pub use scorer::RiskScorer;
