//! Conversion of call state into a plain JSON document for persistence.

use serde::Serialize;
use serde_json::Value;

use callcenter_contracts::error::{CallcenterError, CallcenterResult};

/// Convert any serializable value into a plain JSON tree.
///
/// Non-finite floats become `null`. Map keys are emitted as strings.
pub fn json_safe<T: Serialize + ?Sized>(value: &T) -> CallcenterResult<Value> {
    serde_json::to_value(value).map_err(|e| CallcenterError::Serialization {
        reason: format!("value is not representable as JSON: {e}"),
    })
}
