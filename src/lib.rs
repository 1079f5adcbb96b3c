// UserDB - concurrent in-memory user record store
// Records live in append-only slab blocks and are addressed by numeric UID.

#![warn(rust_2018_idioms)]

pub mod server;
pub mod storage;

// Re-exports for convenience
pub use storage::{NewUser, StoreConfig, StoreStats, Uid, UpdateRequest, UserStore, UserView};

/// UserDB error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum Error {
        /// Caller-supplied data failed a precondition
        #[error("{0}")]
        Validation(String),

        /// A uniqueness invariant would be violated
        #[error("{0}")]
        Conflict(String),

        /// Referenced identity or name does not exist
        #[error("{0}")]
        NotFound(String),

        /// Malformed configuration or request, rejected before reaching the store
        #[error("{0}")]
        InvalidArgument(String),
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
