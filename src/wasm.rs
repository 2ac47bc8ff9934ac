use wasm_bindgen::prelude::*;

/// Compose a JSON draft and return print-ready sheet markup.
#[wasm_bindgen]
pub fn compose_html(json: &str) -> Result<String, JsValue> {
    crate::compose_html(json).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Compose a JSON draft and return the paginated document as a JS value.
#[wasm_bindgen]
pub fn compose_document(json: &str) -> Result<JsValue, JsValue> {
    let measurer = crate::measure::TextMeasurer::new();
    let doc = crate::compose_json(json, &measurer)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_wasm_bindgen::to_value(&doc).map_err(|e| JsValue::from_str(&e.to_string()))
}
