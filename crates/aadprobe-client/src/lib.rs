pub mod client;
pub mod error;
pub mod graph;
pub mod memory;

pub use client::DirectoryClient;
pub use error::ClientError;
pub use graph::GraphClient;
pub use memory::InMemoryDirectory;
