//! Persistence access for the order workflow.
//!
//! Repositories are stateless; every method takes the connection to run on.
//! Services pass the `DatabaseTransaction` of their unit of work, or the pool
//! for plain reads, so the caller decides the transactional scope once.

pub mod menu_repository;
pub mod order_repository;
pub mod table_repository;
pub mod transaction_repository;
pub mod user_repository;

pub use menu_repository::MenuRepository;
pub use order_repository::{OrderRepository, OrderWithMenu};
pub use table_repository::TableRepository;
pub use transaction_repository::{NewTransaction, TransactionRepository};
pub use user_repository::UserRepository;

/// All repositories the transaction services depend on.
#[derive(Debug, Clone, Copy, Default)]
pub struct Repositories {
    pub users: UserRepository,
    pub tables: TableRepository,
    pub menus: MenuRepository,
    pub transactions: TransactionRepository,
    pub orders: OrderRepository,
}
