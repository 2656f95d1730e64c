pub mod seed;
pub mod serve;

// Re-export command functions for convenience
pub use seed::{accreditation, distribute, import, reset};
pub use serve::serve;
