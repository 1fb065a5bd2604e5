use wasm_bindgen::prelude::*;

use super::js_error;
use crate::core::path as codec;

/// Derivation path codec.
#[wasm_bindgen]
pub struct WasmPath;

#[wasm_bindgen]
impl WasmPath {
    /// `"m/44'/12586'/0'/0/0"` -> `Uint32Array [2147483692, 2147496234, 2147483648, 0, 0]`
    #[wasm_bindgen(js_name = "pathToArray")]
    pub fn path_to_array(path: &str) -> Result<Vec<u32>, JsValue> {
        codec::path_to_array(path).map_err(js_error)
    }

    #[wasm_bindgen(js_name = "arrayToPath")]
    pub fn array_to_path(indices: Vec<u32>) -> String {
        codec::array_to_path(&indices)
    }
}
