//! Business services.
//!
//! Services own the multi-statement invariants: checkout's all-or-nothing
//! cart conversion, the ledger's paid-once settlement, signature checks on
//! provider events, and credential handling. Routes stay thin on top.

pub mod auth;
pub mod checkout;
pub mod payments;
pub mod provider;

pub use auth::{AuthError, AuthService};
pub use checkout::{CheckoutError, CheckoutService};
pub use payments::{PaymentError, PaymentLedger, ProviderEvent};
pub use provider::{ProviderClient, ProviderError};
