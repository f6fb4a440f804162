//! The guarded default-currency command.
//!
//! Rewriting the default currency is destructive, so the command refuses to
//! run unless the installer activated it for the current install. The
//! [`Activation`] token can only be created inside this crate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use shopinit_core::currency::{CurrencyBackend, DefaultCurrencyChange};
use shopinit_core::error::CoreError;
use shopinit_core::pipeline::{OperationHandler, Parameters};
use shopinit_core::reference::CurrencyReference;

/// Positional parameter carrying the ISO code.
pub const CURRENCY_PARAM: &str = "currency";

pub const NOT_ACTIVATED_MESSAGE: &str = "The command has not been activated by the runtime and \
     therefore cannot be executed. It is intended to be used with install --currency";

/// The error every non-activated run ends with.
pub fn not_activated() -> CoreError {
    CoreError::Permission(NOT_ACTIVATED_MESSAGE.to_string())
}

/// Proof that the caller is the installer runtime.
#[derive(Debug)]
pub struct Activation {
    _private: (),
}

impl Activation {
    pub(crate) fn issue() -> Self {
        Self { _private: () }
    }
}

/// Handler for `system:currency-destructive`.
pub struct CurrencyFixCommand {
    backend: Arc<dyn CurrencyBackend>,
    reference: Arc<CurrencyReference>,
    activated: AtomicBool,
}

impl CurrencyFixCommand {
    pub fn new(backend: Arc<dyn CurrencyBackend>, reference: Arc<CurrencyReference>) -> Self {
        Self {
            backend,
            reference,
            activated: AtomicBool::new(false),
        }
    }

    pub fn activate(&self, _token: Activation) {
        self.activated.store(true, Ordering::SeqCst);
    }

    pub fn is_activated(&self) -> bool {
        self.activated.load(Ordering::SeqCst)
    }

    /// Run with an ISO code directly.
    ///
    /// Fails with [`CoreError::Permission`] unless activated.
    pub async fn execute(&self, iso_code: &str) -> Result<i32, CoreError> {
        if !self.is_activated() {
            return Err(not_activated());
        }

        let iso_code = iso_code.trim().to_uppercase();
        if iso_code.is_empty() {
            tracing::error!("No currency given");
            return Ok(1);
        }

        match self
            .backend
            .set_default_currency(&self.reference, &iso_code)
            .await?
        {
            DefaultCurrencyChange::Unchanged { iso_code } => {
                tracing::info!(currency = %iso_code, "Default currency already set");
            }
            DefaultCurrencyChange::Reassigned {
                previous_iso_code,
                created,
                ..
            } => {
                tracing::debug!(previous = %previous_iso_code, created, "Reassigned default currency");
            }
        }

        tracing::info!("Successfully changed shop default currency to {iso_code}");
        Ok(0)
    }
}

#[async_trait]
impl OperationHandler for CurrencyFixCommand {
    async fn run(&self, _name: &str, params: &Parameters) -> Result<i32, CoreError> {
        self.execute(params.get(CURRENCY_PARAM).unwrap_or_default())
            .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
