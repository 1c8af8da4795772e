pub mod reconcile;

pub use reconcile::{ConfigOutcome, ReconciliationResult, Reconciler};
