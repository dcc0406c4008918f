//! Domain value objects shared by entities, repositories and services.

pub mod delay;
pub mod order_status;
pub mod payment_status;
pub mod price;
pub mod queue_code;

pub use delay::is_delayed;
pub use order_status::{OrderStatus, OrderTransition};
pub use payment_status::PaymentStatus;
pub use price::Price;
pub use queue_code::QueueCode;
