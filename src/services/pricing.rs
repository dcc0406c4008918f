use async_trait::async_trait;
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::entities::menu::Model as MenuModel;
use crate::errors::ServiceError;
use crate::models::Price;
use crate::repositories::MenuRepository;

/// One requested menu item and how many of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub menu_id: Uuid,
    pub quantity: i64,
}

/// Resolves menus for price computation.
#[async_trait]
pub trait MenuLookup: Send + Sync {
    async fn find_menu(&self, menu_id: Uuid) -> Result<Option<MenuModel>, ServiceError>;
}

/// [`MenuLookup`] backed by the menu repository on a given connection.
pub struct RepositoryMenuLookup<'a, C> {
    repository: MenuRepository,
    conn: &'a C,
}

impl<'a, C> RepositoryMenuLookup<'a, C>
where
    C: ConnectionTrait,
{
    pub fn new(repository: MenuRepository, conn: &'a C) -> Self {
        Self { repository, conn }
    }
}

#[async_trait]
impl<'a, C> MenuLookup for RepositoryMenuLookup<'a, C>
where
    C: ConnectionTrait,
{
    async fn find_menu(&self, menu_id: Uuid) -> Result<Option<MenuModel>, ServiceError> {
        self.repository.find_by_id(self.conn, menu_id).await
    }
}

/// Price of `quantity` units at `unit_price`, in exact decimal arithmetic.
pub fn calculate_price(unit_price: Price, quantity: i64) -> Result<Price, ServiceError> {
    if quantity <= 0 {
        return Err(ServiceError::InvalidQuantity(quantity));
    }
    unit_price.checked_mul(quantity)
}

/// Sums the line prices of `items`, resolving each menu in input order.
///
/// The first failing line aborts the computation; no partial total is ever
/// returned.
pub async fn calculate_total_price<L>(lookup: &L, items: &[LineItem]) -> Result<Price, ServiceError>
where
    L: MenuLookup + ?Sized,
{
    let mut total = Price::zero();

    for item in items {
        let menu = lookup
            .find_menu(item.menu_id)
            .await?
            .ok_or(ServiceError::MenuNotFound(item.menu_id))?;
        let unit_price = Price::new(menu.price)?;
        let line = calculate_price(unit_price, item.quantity)?;
        debug!(menu_id = %item.menu_id, quantity = item.quantity, line_price = %line, "Priced line item");
        total = total.checked_add(line)?;
    }

    Ok(total)
}
