pub mod menu;
pub mod order;
pub mod restaurant_table;
pub mod transaction;
pub mod user;
