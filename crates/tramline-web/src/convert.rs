//! JS <-> JSON value conversion

use serde_json::Value;
use wasm_bindgen::JsValue;

use tramline_history::HistoryError;

/// Turn a rejected JS call into a history error
pub(crate) fn js_error(context: &str, err: JsValue) -> HistoryError {
    let detail = err.as_string().unwrap_or_else(|| format!("{:?}", err));
    HistoryError::Native(format!("{}: {}", context, detail))
}

pub(crate) fn to_js(value: Option<&Value>) -> Result<JsValue, HistoryError> {
    match value {
        None | Some(Value::Null) => Ok(JsValue::NULL),
        Some(value) => js_sys::JSON::parse(&value.to_string())
            .map_err(|e| js_error("state serialization", e)),
    }
}

/// `None` for `null`/`undefined` and for values JSON cannot represent
pub(crate) fn from_js(value: &JsValue) -> Option<Value> {
    if value.is_null() || value.is_undefined() {
        return None;
    }
    let json = js_sys::JSON::stringify(value).ok()?.as_string()?;
    serde_json::from_str(&json).ok()
}
