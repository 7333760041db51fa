pub mod chunk;
pub mod span;
