use std::convert::Infallible;
use std::sync::{Arc, RwLock};

/// Where an authenticated session token lives between page loads. Submit
/// callbacks receive a store explicitly instead of reaching for ambient
/// browser storage.
pub trait SessionStore: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn save_token(&self, token: &str) -> Result<(), Self::Error>;
    fn load_token(&self) -> Result<Option<String>, Self::Error>;
    fn clear(&self) -> Result<(), Self::Error>;
}

#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    token: Arc<RwLock<Option<String>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    type Error = Infallible;

    fn save_token(&self, token: &str) -> Result<(), Self::Error> {
        let mut state = match self.token.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *state = Some(token.to_string());
        Ok(())
    }

    fn load_token(&self) -> Result<Option<String>, Self::Error> {
        let state = match self.token.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Ok(state.clone())
    }

    fn clear(&self) -> Result<(), Self::Error> {
        let mut state = match self.token.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *state = None;
        Ok(())
    }
}
