// Leaf computations
pub mod pricing;
pub mod queue;

// Transaction lifecycle orchestration
pub mod transactions;

pub use transactions::TransactionService;
