use std::sync::Arc;

use crate::services::MailService;

/// Shared handles given to every handler. Built once by the composition root.
pub struct AppState<S> {
    pub store: Arc<S>,
    pub mail: Arc<dyn MailService>,
}

impl<S> AppState<S> {
    pub fn new(store: Arc<S>, mail: Arc<dyn MailService>) -> Self {
        Self { store, mail }
    }
}

// Manual impl: a derive would require `S: Clone`
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            mail: Arc::clone(&self.mail),
        }
    }
}
