//! Shared records for the webprobe exploration kernel.
//!
//! Runs, steps and issues are the durable outcome of an exploration session;
//! interactive elements and extraction reports are the transient per-cycle
//! view of the document being explored.

pub mod element;
pub mod ids;
pub mod run;

pub use element::{AncestorDescriptor, ElementRect, ElementType, ExtractionReport, InteractiveElement};
pub use ids::{DocumentId, IssueId, RunId, StepId};
pub use run::{
    DetectedIssue, IssueKind, IssueSeverity, RunStatus, StepAction, TestRun, TestStep,
    UnknownVariant,
};
