//! Per-identifier claims held for the duration of an upload.
//!
//! Two requests deriving the same identifier would otherwise race on the
//! same directory and files. The second request is rejected instead of
//! waiting, so a client never blocks behind someone else's conversion.

use crate::metrics::UPLOADS_IN_FLIGHT;
use dashmap::DashSet;
use sqldepot_core::Identifier;
use std::sync::Arc;

/// Set of identifiers with an upload in progress.
#[derive(Clone, Default)]
pub struct InFlightUploads {
    ids: Arc<DashSet<Identifier>>,
}

impl InFlightUploads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id`, or return `None` if another upload already holds it.
    pub fn try_claim(&self, id: &Identifier) -> Option<UploadClaim> {
        if !self.ids.insert(id.clone()) {
            return None;
        }
        UPLOADS_IN_FLIGHT.inc();
        Some(UploadClaim {
            ids: self.ids.clone(),
            id: id.clone(),
        })
    }

    #[cfg(test)]
    pub fn is_claimed(&self, id: &Identifier) -> bool {
        self.ids.contains(id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A held claim. Released on drop, including when the request future is
/// cancelled.
#[must_use = "the claim is released as soon as it is dropped"]
pub struct UploadClaim {
    ids: Arc<DashSet<Identifier>>,
    id: Identifier,
}

impl UploadClaim {
    pub fn id(&self) -> &Identifier {
        &self.id
    }
}

impl Drop for UploadClaim {
    fn drop(&mut self) {
        self.ids.remove(&self.id);
        UPLOADS_IN_FLIGHT.dec();
    }
}
