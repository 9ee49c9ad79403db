//! Human readable, multi-line blocks.

use std::fmt::Write;

use super::{Event, RenderError};
use crate::meta::StepContext;

const PAYLOAD_INDENT: &str = "    ";

pub(super) fn render(event: &Event) -> Result<String, RenderError> {
    let meta = &event.meta;
    let mut out = String::new();

    writeln!(out, "=== {} ===", event.event_type)?;

    match &meta.context {
        Some(StepContext::CompositionMeta(cm)) => {
            field(
                &mut out,
                "XR:",
                format_args!(
                    "{}/{} ({})",
                    cm.composite_resource_api_version,
                    cm.composite_resource_kind,
                    cm.composite_resource_name
                ),
            )?;
            field(&mut out, "XR UID:", &cm.composite_resource_uid)?;
            // Cluster scoped resources have no namespace line at all.
            if !cm.composite_resource_namespace.is_empty() {
                field(&mut out, "XR NS:", &cm.composite_resource_namespace)?;
            }
            field(&mut out, "Composition:", &cm.composition_name)?;
        }
        Some(StepContext::OperationMeta(om)) => {
            field(&mut out, "Operation:", &om.operation_name)?;
            field(&mut out, "Op UID:", &om.operation_uid)?;
        }
        None => {}
    }

    field(
        &mut out,
        "Step:",
        format_args!(
            "{} (index {}, iteration {})",
            meta.step_name, meta.step_index, meta.iteration
        ),
    )?;
    field(&mut out, "Function:", &meta.function_name)?;
    field(&mut out, "Trace ID:", &meta.trace_id)?;
    field(&mut out, "Span ID:", &meta.span_id)?;
    field(&mut out, "Timestamp:", meta.timestamp_millis())?;
    if let Some(error) = &event.error {
        field(&mut out, "Error:", error)?;
    }

    if !event.payload.is_absent() {
        let yaml = serde_yaml::to_string(&event.payload.to_value())?;
        out.push_str("  Payload:\n");
        out.push_str(&indent_lines(&yaml, PAYLOAD_INDENT));
    }

    out.push('\n');
    Ok(out)
}

/// Writes one `  Label:      value` line with values aligned on one column.
fn field(out: &mut String, label: &str, value: impl std::fmt::Display) -> std::fmt::Result {
    writeln!(out, "  {:<13}{}", label, value)
}

/// Prefixes every line of `s`. The result always ends with a newline.
fn indent_lines(s: &str, prefix: &str) -> String {
    let mut result = String::with_capacity(s.len() + prefix.len());
    for line in s.strip_suffix('\n').unwrap_or(s).split('\n') {
        result.push_str(prefix);
        result.push_str(line);
        result.push('\n');
    }
    result
}
