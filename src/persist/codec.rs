use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StateError;

/// Encode half of a codec: state record in, stored string out.
pub type EncodeFn<T> = Arc<dyn Fn(&T) -> Result<String, StateError> + Send + Sync>;

/// Decode half of a codec: stored string in, state record out.
pub type DecodeFn<T> = Arc<dyn Fn(&str) -> Result<T, StateError> + Send + Sync>;

/// A pair of pure functions converting between the stored string form
/// and the state record form.
///
/// The core places no constraint on the text format beyond "string in,
/// string out"; [`Codec::json`] is the default used by persistent
/// containers.
#[derive(Clone)]
pub struct Codec<T> {
    pub encode: EncodeFn<T>,
    pub decode: DecodeFn<T>,
}

impl<T> Codec<T> {
    /// Build a codec from custom encode and decode functions.
    pub fn new<E, D>(encode: E, decode: D) -> Self
    where
        E: Fn(&T) -> Result<String, StateError> + Send + Sync + 'static,
        D: Fn(&str) -> Result<T, StateError> + Send + Sync + 'static,
    {
        Self {
            encode: Arc::new(encode),
            decode: Arc::new(decode),
        }
    }
}

impl<T: Serialize + DeserializeOwned> Codec<T> {
    /// Lossless structural serialization via JSON.
    pub fn json() -> Self {
        Self {
            encode: Arc::new(|state| {
                serde_json::to_string(state).map_err(|e| StateError::Encode(e.to_string()))
            }),
            decode: Arc::new(|raw| {
                serde_json::from_str(raw).map_err(|e| StateError::Decode(e.to_string()))
            }),
        }
    }
}
