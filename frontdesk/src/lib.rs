//! Hotel back-office domain: guest and stay records, the cached read paths
//! that serve staff pages, and the collaborators behind them.

pub mod assistant;
pub mod auth;
pub mod backoffice;
pub mod keys;
pub mod locale;
pub mod models;
pub mod ports;
pub mod store;
pub mod views;

pub use backoffice::{Backoffice, BackofficeError};
pub use ports::RecordStore;
