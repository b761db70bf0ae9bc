pub mod product;
pub mod recommendation;
pub mod snapshot;
