//! Core business logic abstractions

pub mod beta;
pub mod cache;
pub mod log;
pub mod portfolio;
pub mod price;
pub mod returns;

// Re-export main types for cleaner imports
pub use beta::{BetaEstimate, RELIABLE_SAMPLE_SIZE};
pub use cache::{BetaCache, KeyValueCollection};
pub use portfolio::{BetaEngine, Holding, HoldingBeta, PortfolioResult};
pub use price::{PriceError, PriceHistory, PriceRow, PriceSource, ProviderKind};
