//! Refetch the item list into the shared catalog

use tokio::sync::RwLock;
use tracing::{error, info};

use crate::storage::StorageError;
use crate::AppState;
use ermihadu_common::events::VaultEvent;
use ermihadu_common::view::{Action, ViewState};

/// Banner shown to the browser whose request hit a failed refresh
pub const LOAD_FAILED_MESSAGE: &str = "Could not load items. Please try again later.";

/// Fetch items from the configured source and load them into the catalog
///
/// A failure never propagates to the page: the list is emptied and the
/// error is recorded for `/health`. A successful load clears that record.
/// The error is still returned so callers can report it to their browser.
pub async fn refresh_items(state: &AppState) -> Result<usize, StorageError> {
    match state.backends.source.fetch_items().await {
        Ok(items) => {
            let item_count = items.len();
            state.catalog.write().await.load_items(items);
            state.clear_error().await;
            info!(item_count, "Items refreshed");
            state.event_bus.emit_lossy(VaultEvent::ItemsRefreshed {
                item_count,
                timestamp: ermihadu_common::time::now(),
            });
            Ok(item_count)
        }
        Err(e) => {
            error!("Failed to load items: {}", e);
            state.record_error(format!("Failed to load items: {}", e)).await;
            state.catalog.write().await.clear_items();
            Err(e)
        }
    }
}

/// [`refresh_items`] on behalf of one browser, showing it the failure banner
pub async fn refresh_for_view(state: &AppState, view: &RwLock<ViewState>) -> Result<usize, StorageError> {
    let result = refresh_items(state).await;
    if result.is_err() {
        // ItemsLoadFailed never rejects
        let _ = view
            .write()
            .await
            .apply(Action::ItemsLoadFailed(LOAD_FAILED_MESSAGE.to_string()));
    }
    result
}
