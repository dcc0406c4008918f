//! Schema migrations live in the `migrations` workspace crate so the CLI and
//! tests can run them without pulling in service code.

pub use migrations::Migrator;
