use wasm_bindgen::prelude::*;

use super::{from_js, js_error, to_js};
use crate::core::{SignRequest, Signature, TransportAccount};
use crate::transport;

/// Transport codec for QR codes, clipboard and deep links.
#[wasm_bindgen]
pub struct WasmTransport;

#[wasm_bindgen]
impl WasmTransport {
    #[wasm_bindgen(js_name = "encodeAccount")]
    pub fn encode_account(account: JsValue) -> Result<String, JsValue> {
        let account: TransportAccount = from_js(account)?;
        transport::encode_account(&account).map_err(js_error)
    }

    #[wasm_bindgen(js_name = "decodeAccount")]
    pub fn decode_account(encoded: &str) -> Result<JsValue, JsValue> {
        to_js(&transport::decode_account(encoded).map_err(js_error)?)
    }

    #[wasm_bindgen(js_name = "encodeSignRequest")]
    pub fn encode_sign_request(request: JsValue) -> Result<String, JsValue> {
        let request: SignRequest = from_js(request)?;
        transport::encode_sign_request(&request).map_err(js_error)
    }

    #[wasm_bindgen(js_name = "decodeSignRequest")]
    pub fn decode_sign_request(encoded: &str) -> Result<JsValue, JsValue> {
        to_js(&transport::decode_sign_request(encoded).map_err(js_error)?)
    }

    #[wasm_bindgen(js_name = "encodeSignature")]
    pub fn encode_signature(signature: JsValue) -> Result<String, JsValue> {
        let signature: Signature = from_js(signature)?;
        transport::encode_signature(&signature).map_err(js_error)
    }

    #[wasm_bindgen(js_name = "decodeSignature")]
    pub fn decode_signature(encoded: &str) -> Result<JsValue, JsValue> {
        to_js(&transport::decode_signature(encoded).map_err(js_error)?)
    }
}
