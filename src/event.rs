use crate::api::{AskError, AskResponse};
use crate::attachments::ingest::IngestError;
use crate::attachments::Attachment;
use crate::session::AskPhase;

#[derive(Debug)]
pub enum AppEvent {
    AskCompleted {
        ticket: u64,
        phase: AskPhase,
        result: Result<AskResponse, AskError>,
    },
    AttachmentsIngested {
        ticket: u64,
        result: Result<Vec<Attachment>, IngestError>,
    },
}
