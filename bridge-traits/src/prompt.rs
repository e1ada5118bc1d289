//! Operator Confirmation
//!
//! Gate for the interactive execution mode: the driver asks before every
//! mutating remote call.

use async_trait::async_trait;

use crate::error::Result;

/// Asks the operator whether an action should proceed
///
/// # Example
///
/// ```ignore
/// use bridge_traits::prompt::Confirmation;
///
/// async fn guarded(confirm: &dyn Confirmation) -> Result<bool> {
///     confirm.confirm("Deleting album trip-2019").await
/// }
/// ```
#[async_trait]
pub trait Confirmation: Send + Sync {
    /// Returns `Ok(true)` when the operator accepts the action
    async fn confirm(&self, message: &str) -> Result<bool>;
}

/// Confirmation that always answers the same way
#[derive(Debug, Clone, Copy)]
pub struct FixedConfirmation(pub bool);

#[async_trait]
impl Confirmation for FixedConfirmation {
    async fn confirm(&self, _message: &str) -> Result<bool> {
        Ok(self.0)
    }
}
