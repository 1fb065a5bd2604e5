//! WASM module: browser bindings for the codecs.
//!
//! | Class | Methods |
//! |-------|---------|
//! | `WasmTransport` | `encodeAccount`, `decodeAccount`, `encodeSignRequest`, `decodeSignRequest`, `encodeSignature`, `decodeSignature` |
//! | `WasmPath` | `pathToArray`, `arrayToPath` |
//!
//! Values cross the boundary as plain JS objects with the wire field names.

mod path;
mod transport;

pub use path::WasmPath;
pub use transport::WasmTransport;

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Initialize WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Failures surface as JS `Error` objects so callers get a message and a stack.
fn js_error(message: impl ToString) -> JsValue {
    js_sys::Error::new(&message.to_string()).into()
}

fn from_js<T: for<'de> Deserialize<'de>>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(js_error)
}

/// Plain objects rather than `Map`s, so payloads read like JSON on the JS side.
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(js_error)
}
