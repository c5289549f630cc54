pub mod editing;
pub mod engine;

// Re-export key types for easier usage
pub use editing::*;
pub use engine::Engine;
