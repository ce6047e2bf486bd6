pub mod viewer;

use crate::api::{AskError, AskRequest, AskResponse};
use crate::attachments::ingest::IngestError;
use crate::attachments::{validate_selection, Attachment, AttachmentSet, SelectedFile};
use tracing::{debug, info, warn};
use viewer::ImageViewer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Asking,
    AwaitingClarification,
    Clarifying,
    Answered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskPhase {
    Initial,
    Clarified,
}

impl AskPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Clarified => "clarified",
        }
    }
}

/// A request the session wants sent. Its ticket must come back with the
/// result for the result to be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskDispatch {
    pub ticket: u64,
    pub phase: AskPhase,
    pub request: AskRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestDispatch {
    pub ticket: u64,
    pub files: Vec<SelectedFile>,
}

/// Everything one page visit knows. Mutated only through the transition
/// methods below; rendering reads it through the accessors.
#[derive(Debug, Default)]
pub struct SessionState {
    query: String,
    phase: Phase,
    role: Option<String>,
    answer: Option<String>,
    judge: Option<bool>,
    reason: Option<String>,
    error: Option<String>,
    questions: Vec<String>,
    clarification_answers: Vec<String>,
    attachments: AttachmentSet,
    viewer: ImageViewer,
    alert: Option<String>,
    last_ticket: u64,
    pending_ask: Option<u64>,
    pending_ingest: Option<u64>,
}

impl SessionState {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut String {
        &mut self.query
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn loading(&self) -> bool {
        matches!(self.phase, Phase::Asking | Phase::Clarifying)
    }

    pub fn ingesting(&self) -> bool {
        self.pending_ingest.is_some()
    }

    pub fn can_ask(&self) -> bool {
        !self.loading() && !self.ingesting() && !self.query.trim().is_empty()
    }

    /// The follow-up can go out once questions are showing and no images are
    /// still being converted.
    pub fn can_clarify(&self) -> bool {
        self.phase == Phase::AwaitingClarification && !self.ingesting()
    }

    pub fn needs_clarification(&self) -> bool {
        matches!(self.phase, Phase::AwaitingClarification | Phase::Clarifying)
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref().filter(|role| !role.is_empty())
    }

    pub fn answer(&self) -> Option<&str> {
        self.answer.as_deref().filter(|answer| !answer.is_empty())
    }

    pub fn judge(&self) -> Option<bool> {
        self.judge
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref().filter(|reason| !reason.is_empty())
    }

    /// Failure text shown in the answer slot.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn clarification_answers(&self) -> &[String] {
        &self.clarification_answers
    }

    pub fn clarification_answer_mut(&mut self, index: usize) -> Option<&mut String> {
        self.clarification_answers.get_mut(index)
    }

    pub fn attachments(&self) -> &AttachmentSet {
        &self.attachments
    }

    pub fn viewer(&self) -> ImageViewer {
        self.viewer
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn raise_alert(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "alerting user");
        self.alert = Some(message);
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    fn next_ticket(&mut self) -> u64 {
        self.last_ticket += 1;
        self.last_ticket
    }

    /// Starts the first round-trip. Returns `None` when the query is blank or
    /// another request or ingestion is still in flight.
    pub fn begin_ask(&mut self) -> Option<AskDispatch> {
        if !self.can_ask() {
            return None;
        }

        self.role = None;
        self.answer = None;
        self.judge = None;
        self.reason = None;
        self.error = None;
        self.questions.clear();
        self.clarification_answers.clear();

        let ticket = self.next_ticket();
        self.pending_ask = Some(ticket);
        self.phase = Phase::Asking;

        let request = AskRequest::initial(self.query.clone(), self.attachments.encoded());
        debug!(ticket, images = request.image_count(), "initial ask prepared");
        Some(AskDispatch {
            ticket,
            phase: AskPhase::Initial,
            request,
        })
    }

    /// Sends the clarification answers, blanks included, in question order.
    pub fn begin_clarify(&mut self) -> Option<AskDispatch> {
        if !self.can_clarify() {
            return None;
        }

        let ticket = self.next_ticket();
        self.pending_ask = Some(ticket);
        self.phase = Phase::Clarifying;
        self.error = None;

        let request = AskRequest::clarified(
            self.query.clone(),
            self.clarification_answers.clone(),
            self.attachments.encoded(),
        );
        debug!(ticket, images = request.image_count(), "clarified ask prepared");
        Some(AskDispatch {
            ticket,
            phase: AskPhase::Clarified,
            request,
        })
    }

    /// Applies a round-trip result. Returns `false` when the ticket is not
    /// the one in flight (cleared or superseded) and the result was dropped.
    pub fn complete_ask(&mut self, ticket: u64, result: Result<AskResponse, AskError>) -> bool {
        if self.pending_ask != Some(ticket) {
            debug!(ticket, "dropping stale ask result");
            return false;
        }
        self.pending_ask = None;
        let in_flight = self.phase;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                warn!(ticket, error = %err, "ask round-trip failed");
                self.error = Some(err.user_message());
                self.phase = Phase::Idle;
                return true;
            }
        };

        match in_flight {
            Phase::Asking if response.need_clarification => {
                let questions = response.clarification_questions.unwrap_or_default();
                info!(ticket, questions = questions.len(), "clarification requested");
                self.role = response.role;
                self.clarification_answers = vec![String::new(); questions.len()];
                self.questions = questions;
                self.phase = Phase::AwaitingClarification;
            }
            Phase::Asking | Phase::Clarifying => {
                if in_flight == Phase::Clarifying && response.need_clarification {
                    info!(ticket, "ignoring further clarification request after follow-up");
                }
                info!(ticket, judge = ?response.judge, "answer received");
                self.role = response.role;
                self.answer = response.answer;
                self.judge = response.judge;
                self.reason = response.reason;
                self.questions.clear();
                self.clarification_answers.clear();
                self.phase = Phase::Answered;
            }
            other => {
                warn!(ticket, phase = ?other, "ask result arrived outside a request");
                return false;
            }
        }
        true
    }

    /// Validates a new selection. On success the caller converts the files
    /// and reports back through [`SessionState::complete_ingest`]; on failure
    /// the attachments stay as they were and an alert is raised.
    pub fn select_files(&mut self, files: Vec<SelectedFile>) -> Option<IngestDispatch> {
        if files.is_empty() {
            return None;
        }
        if let Err(err) = validate_selection(&files) {
            self.raise_alert(err.to_string());
            return None;
        }

        let ticket = self.next_ticket();
        self.pending_ingest = Some(ticket);
        debug!(ticket, files = files.len(), "ingestion prepared");
        Some(IngestDispatch { ticket, files })
    }

    pub fn complete_ingest(
        &mut self,
        ticket: u64,
        result: Result<Vec<Attachment>, IngestError>,
    ) -> bool {
        if self.pending_ingest != Some(ticket) {
            debug!(ticket, "dropping stale ingestion result");
            return false;
        }
        self.pending_ingest = None;

        match result {
            Ok(attachments) => {
                info!(ticket, count = attachments.len(), "attachments ready");
                self.attachments.replace(attachments);
                self.viewer.close();
            }
            Err(err) => self.raise_alert(err.to_string()),
        }
        true
    }

    pub fn remove_attachment(&mut self, index: usize) {
        if self.attachments.remove(index).is_some() {
            self.viewer.on_removed(index, self.attachments.len());
        }
    }

    pub fn clear_attachments(&mut self) {
        self.attachments.clear();
        self.viewer.close();
        self.pending_ingest = None;
    }

    pub fn open_viewer(&mut self, index: usize) {
        self.viewer.open(index, self.attachments.len());
    }

    pub fn viewer_next(&mut self) {
        self.viewer.next(self.attachments.len());
    }

    pub fn viewer_prev(&mut self) {
        self.viewer.prev(self.attachments.len());
    }

    pub fn close_viewer(&mut self) {
        self.viewer.close();
    }

    /// Back to a blank page. Anything still in flight is forgotten.
    pub fn clear(&mut self) {
        let last_ticket = self.last_ticket;
        *self = Self {
            last_ticket,
            ..Self::default()
        };
        info!("session cleared");
    }
}
