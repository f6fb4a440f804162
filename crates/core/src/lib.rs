//! Domain logic for the shop installer.
//!
//! - [`install`]: the install plan, lock marker and finalisation.
//! - [`pipeline`]: named operations, the handler registry and the sequencer.
//! - [`currency`]: default-currency reassignment over a [`currency::CurrencyStore`].
//! - [`reference`]: static currency reference data.
//!
//! Nothing in this crate talks to a database driver; see `shopinit-db`.

pub mod currency;
pub mod dsn;
pub mod error;
pub mod install;
pub mod memory;
pub mod pipeline;
pub mod reference;
pub mod schema;
pub mod types;
