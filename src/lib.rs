//! Dine-in order API library
//!
//! Order taking, payment handoff and the kitchen/waiter workflow for
//! dine-in restaurants.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod dto;
pub mod entities;
pub mod errors;
pub mod events;
pub mod migrator;
pub mod models;
pub mod pagination;
pub mod payments;
pub mod repositories;
pub mod services;

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tokio::sync::mpsc;

use crate::events::{Event, EventSender};
use crate::payments::{PaymentGateway, SnapGateway};
use crate::services::transactions::TransactionService;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: EventSender,
    pub transactions: TransactionService,
}

impl AppState {
    /// Connects to the store, runs migrations when configured to and wires
    /// the services against the Snap payment gateway.
    ///
    /// The returned receiver must be drained, typically with
    /// [`events::process_events`].
    pub async fn build(
        config: config::AppConfig,
    ) -> Result<(Self, mpsc::Receiver<Event>), errors::ServiceError> {
        let gateway = Arc::new(SnapGateway::from_config(&config)?);
        Self::build_with_gateway(config, gateway).await
    }

    pub async fn build_with_gateway(
        config: config::AppConfig,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Result<(Self, mpsc::Receiver<Event>), errors::ServiceError> {
        let db = Arc::new(db::establish_connection_from_app_config(&config).await?);
        db::check_connection(&db).await?;
        if config.auto_migrate {
            db::run_migrations(&db).await?;
        }

        let (event_sender, event_rx) = EventSender::channel(config.event_channel_capacity);
        let transactions = TransactionService::new(db.clone(), gateway, &config)
            .with_event_sender(event_sender.clone());

        Ok((
            Self {
                db,
                config,
                event_sender,
                transactions,
            },
            event_rx,
        ))
    }
}

pub mod prelude {
    pub use crate::config::{AppConfig, AppConfigError};
    pub use crate::db::{DbPool, UnitOfWork};
    pub use crate::dto::*;
    pub use crate::errors::*;
    pub use crate::events::*;
    pub use crate::models::*;
    pub use crate::pagination::{PageRequest, Paginated};
    pub use crate::payments::{PaymentGateway, PaymentNotification, SnapGateway};
    pub use crate::services::transactions::TransactionService;
    pub use crate::AppState;
}
