pub mod codec;
pub mod direction;
pub mod executor;
pub mod expr;
pub mod row;
pub mod store;

// re-exports
pub use direction::Direction;
pub use executor::Processor;
