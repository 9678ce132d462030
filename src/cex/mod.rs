pub mod cryptocom;

// Re-export
pub use cryptocom::Cryptocom;
