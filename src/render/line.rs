//! Single-line JSON records.

use serde_json::{Map, Value};

use super::{Event, RenderError};

pub(super) fn render(event: &Event) -> Result<Vec<u8>, RenderError> {
    let meta = serde_json::to_value(&event.meta)?;

    let mut record = Map::new();
    record.insert(
        "type".to_string(),
        Value::String(event.event_type.as_str().to_string()),
    );
    record.insert("meta".to_string(), meta);
    record.insert("payload".to_string(), event.payload.to_value());
    if let Some(error) = &event.error {
        record.insert("error".to_string(), Value::String(error.clone()));
    }

    let mut out = serde_json::to_vec(&Value::Object(record))?;
    out.push(b'\n');
    Ok(out)
}
