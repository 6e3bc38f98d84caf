pub mod indexing;
pub mod vector;

pub use indexing::VectorIndexingService;
pub use vector::{NodeHit, VectorIndex};
