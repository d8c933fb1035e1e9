use thiserror::Error;

/// Why an asset never produced a visual representation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AssetError {
    #[error("failed to fetch {uri}: {reason}")]
    Fetch { uri: String, reason: String },

    #[error("{uri} responded with HTTP {status}")]
    Status { uri: String, status: u16 },

    #[error("no asset at {uri}")]
    Missing { uri: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoomError {
    #[error("an entity named `{0}` already exists")]
    DuplicateEntity(String),

    #[error("no entity named `{0}`")]
    UnknownEntity(String),

    #[error("browser call failed: {0}")]
    Js(String),
}

#[cfg(target_arch = "wasm32")]
impl From<RoomError> for wasm_bindgen::JsValue {
    fn from(err: RoomError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}
