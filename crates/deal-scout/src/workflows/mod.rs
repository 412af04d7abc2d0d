pub mod enrichment;
pub mod listings;
pub mod pipeline;
pub mod zoning;
