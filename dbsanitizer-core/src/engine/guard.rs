//! Scoped suspension of referential-integrity enforcement.

use crate::Result;
use crate::adapters::SanitizerStore;

/// Foreign-key enforcement switched off for the run's session.
///
/// `acquire` records whether enforcement was on and switches it off;
/// `release` puts back the recorded state. Release is async and cannot run
/// from `Drop`, so the owner must call it on every path. Dropping an
/// unreleased guard only logs an error.
pub struct ConstraintGuard<'a> {
    store: &'a dyn SanitizerStore,
    previously_enabled: bool,
    released: bool,
}

impl<'a> ConstraintGuard<'a> {
    /// Disables enforcement.
    ///
    /// # Errors
    /// Returns the store error if the state cannot be read or changed;
    /// enforcement is then left as it was.
    pub async fn acquire(store: &'a dyn SanitizerStore) -> Result<Self> {
        let previously_enabled = store.referential_integrity_enabled().await?;
        store.set_referential_integrity(false).await?;

        tracing::info!("Foreign key checks disabled for {}", store.endpoint());

        Ok(Self {
            store,
            previously_enabled,
            released: false,
        })
    }

    /// Whether enforcement was active before the guard was acquired.
    pub fn previously_enabled(&self) -> bool {
        self.previously_enabled
    }

    /// Restores the enforcement state seen by `acquire`.
    ///
    /// # Errors
    /// Returns the store error if the state cannot be restored.
    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        self.store
            .set_referential_integrity(self.previously_enabled)
            .await?;

        if self.previously_enabled {
            tracing::info!("Foreign key checks re-enabled");
        }
        Ok(())
    }
}

impl Drop for ConstraintGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            tracing::error!(
                "Constraint guard dropped without release; foreign key checks may still be disabled on {}",
                self.store.endpoint()
            );
        }
    }
}
