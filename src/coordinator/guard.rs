//! RAII guard over the request's in-progress marker
//!
//! Acquisition is the store's atomic check-and-set; release happens in
//! `Drop`, so the marker is cleared on every exit path of a merge attempt -
//! success, handled failure, or panic unwind.

use anyhow::Result;
use uuid::Uuid;

use crate::store::RequestStore;

/// Holds the in-progress marker for one merge attempt.
///
/// While the guard lives, no other coordinator instance can pass
/// `acquire` for the same request. Dropping the guard clears the marker;
/// a clear failure is logged, never panicked on.
pub struct InProgressGuard<'a> {
    store: &'a dyn RequestStore,
    request_id: String,
    token: String,
}

impl<'a> InProgressGuard<'a> {
    /// Try to claim the in-progress marker for a request.
    ///
    /// Returns `Ok(None)` when another attempt already holds the marker -
    /// the benign concurrent-attempt case, which callers surface as
    /// `AlreadyInProgress` without mutating the request.
    pub fn acquire(store: &'a dyn RequestStore, request_id: &str) -> Result<Option<Self>> {
        let token = Uuid::new_v4().to_string();

        if !store.try_claim_in_progress(request_id, &token)? {
            return Ok(None);
        }

        Ok(Some(Self {
            store,
            request_id: request_id.to_string(),
            token,
        }))
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl Drop for InProgressGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.store.clear_in_progress(&self.request_id, &self.token) {
            tracing::warn!(
                request_id = %self.request_id,
                "failed to clear in-progress marker: {e:#}"
            );
        }
    }
}
