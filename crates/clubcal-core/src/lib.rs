//! Core types: normalized events, org config, timestamps, tracing

pub mod event;
pub mod org_config;
pub mod time;
pub mod tracing;

pub use event::{EventDocument, EventId, GENERATED_WARNING, NormalizedEvent, SyncSummary};
pub use org_config::{OrgConfig, RuleKind, TagRule, TimeOfDayBoundaries};
pub use time::{format_generated, parse_wall_clock};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
