use std::sync::Arc;

use crate::figma;
use crate::gemini::TextModel;
use crate::runs::RunStore;

/// Shared application state for the API server
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RunStore>,
    pub model: Arc<dyn TextModel>,
    pub designs: Arc<figma::Client>,
}

impl AppState {
    pub fn new(store: Arc<RunStore>, model: Arc<dyn TextModel>, designs: Arc<figma::Client>) -> Self {
        Self {
            store,
            model,
            designs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::testing::MockModel;
    use tempfile::TempDir;

    #[test]
    fn test_state_is_cheaply_cloneable() {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(RunStore::open(temp_dir.path().join("runs")).unwrap());
        let state = AppState::new(
            store,
            Arc::new(MockModel::empty()),
            Arc::new(figma::Client::new().unwrap()),
        );

        let cloned = state.clone();
        assert!(Arc::ptr_eq(&state.store, &cloned.store));
    }
}
