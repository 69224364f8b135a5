pub mod callback;
pub mod reconciliation;

pub use callback::{CallbackParams, CallbackService, CallbackState};
pub use reconciliation::{ReconciliationService, StalePendingEntry, StalePendingReport};
