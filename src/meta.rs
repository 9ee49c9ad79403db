//! Step metadata carried by every inspector event.
//!
//! The wire type ([`proto::StepMeta`]) is converted once, at the service
//! boundary, into [`StepMetadata`]. The oneof context becomes the
//! [`StepContext`] sum type so renderers dispatch on the variant rather than
//! on which fields happen to be populated.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::proto;

/// Identity of one pipeline step invocation.
///
/// Serializes with the canonical lowerCamelCase wire field names. The active
/// context branch is emitted as a nested object under `compositionMeta` or
/// `operationMeta`; the inactive branch is omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepMetadata {
    pub trace_id: String,
    pub span_id: String,
    pub step_name: String,
    pub step_index: i32,
    pub iteration: i32,
    pub function_name: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub context: Option<StepContext>,
}

/// What the pipeline step is serving.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StepContext {
    /// Reconciliation of a composite resource.
    CompositionMeta(CompositionMeta),
    /// Execution of an operation.
    OperationMeta(OperationMeta),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionMeta {
    pub composite_resource_api_version: String,
    pub composite_resource_kind: String,
    pub composite_resource_name: String,
    /// Empty for cluster scoped composite resources.
    pub composite_resource_namespace: String,
    pub composite_resource_uid: String,
    pub composition_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationMeta {
    pub operation_name: String,
    pub operation_uid: String,
}

impl StepMetadata {
    /// Timestamp as ISO-8601 with millisecond precision, e.g.
    /// `2026-01-15T10:30:00.000Z`.
    pub fn timestamp_millis(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

fn serialize_timestamp<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

/// Converts a wire timestamp. Missing or out of range timestamps map to the
/// Unix epoch.
pub fn timestamp_from_proto(ts: Option<&prost_types::Timestamp>) -> DateTime<Utc> {
    ts.and_then(|ts| {
        let nanos = u32::try_from(ts.nanos).ok()?;
        DateTime::<Utc>::from_timestamp(ts.seconds, nanos)
    })
    .unwrap_or_default()
}

impl From<proto::StepMeta> for StepMetadata {
    fn from(meta: proto::StepMeta) -> Self {
        let timestamp = timestamp_from_proto(meta.timestamp.as_ref());
        Self {
            trace_id: meta.trace_id,
            span_id: meta.span_id,
            step_name: meta.step_name,
            step_index: meta.step_index,
            iteration: meta.iteration,
            function_name: meta.function_name,
            timestamp,
            context: meta.context.map(StepContext::from),
        }
    }
}

impl From<Option<proto::StepMeta>> for StepMetadata {
    fn from(meta: Option<proto::StepMeta>) -> Self {
        meta.map(Self::from).unwrap_or_default()
    }
}

impl From<proto::step_meta::Context> for StepContext {
    fn from(context: proto::step_meta::Context) -> Self {
        match context {
            proto::step_meta::Context::CompositionMeta(cm) => {
                StepContext::CompositionMeta(CompositionMeta {
                    composite_resource_api_version: cm.composite_resource_api_version,
                    composite_resource_kind: cm.composite_resource_kind,
                    composite_resource_name: cm.composite_resource_name,
                    composite_resource_namespace: cm.composite_resource_namespace,
                    composite_resource_uid: cm.composite_resource_uid,
                    composition_name: cm.composition_name,
                })
            }
            proto::step_meta::Context::OperationMeta(om) => {
                StepContext::OperationMeta(OperationMeta {
                    operation_name: om.operation_name,
                    operation_uid: om.operation_uid,
                })
            }
        }
    }
}
