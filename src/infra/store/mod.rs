//! Comment store adapters.

mod firestore;
mod memory;

use std::sync::Arc;

use tracing::{info, warn};

pub use firestore::FirestoreComments;
pub use memory::MemoryComments;

use crate::application::repos::CommentsRepo;
use crate::config::{StoreBackend, StoreSettings};
use crate::infra::error::InfraError;

/// Build the configured comment store.
pub fn build_comments_repo(settings: &StoreSettings) -> Result<Arc<dyn CommentsRepo>, InfraError> {
    match &settings.backend {
        StoreBackend::Memory => {
            warn!(
                target = "visuopost::store",
                "using the in-memory comment store; comments are lost on restart"
            );
            Ok(Arc::new(MemoryComments::new()))
        }
        StoreBackend::Firestore(firestore) => {
            if firestore.api_key.is_none() {
                warn!(
                    target = "visuopost::store",
                    "no Firestore api key configured; requests rely on open security rules"
                );
            }
            let repo = FirestoreComments::new(firestore, &settings.collection)?;
            info!(
                target = "visuopost::store",
                project = %firestore.project_id,
                collection = %settings.collection,
                "using Firestore comment store"
            );
            Ok(Arc::new(repo))
        }
    }
}
