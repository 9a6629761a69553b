use super::aggregate;
use super::classify::{classify_prompt, classify_response};
use super::format::format_diagnosis;
use super::input::{select_input, AnswerDraft, InputDescriptor};
use super::session::Session;
use super::transcript::TranscriptStore;
use super::types::{PromptCategory, TurnOutcome};
use super::SessionError;
use crate::history::{SessionHistory, SessionSummary};
use crate::models::Message;
use crate::transport::{
    AssistantReply, DiagnosisBackend, IdentityHint, SessionId, TransportError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Active,
    Complete,
}

/// An answer that has been sent but not yet resolved.
///
/// Carries the session id and generation it was issued against so a late
/// response can be recognised after a restart.
#[derive(Debug)]
pub struct PendingTurn {
    session_id: SessionId,
    generation: u64,
    prompt: String,
    category: PromptCategory,
    answer: String,
}

impl PendingTurn {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn category(&self) -> PromptCategory {
        self.category
    }
}

/// Drives one diagnostic conversation at a time.
///
/// `submit` is the simple path. Hosts that must not hold a lock across the
/// network call use `begin_submit`, call the backend themselves, then hand
/// the result to `finish_submit`.
#[derive(Debug, Default)]
pub struct SessionController {
    session: Option<Session>,
    /// Bumped on every start so responses from replaced sessions are dropped.
    generation: u64,
    in_flight: bool,
    history: SessionHistory,
}

impl SessionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller that archives finished sessions into `history`.
    pub fn with_history(history: SessionHistory) -> Self {
        Self {
            history,
            ..Self::default()
        }
    }

    // ═══════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════

    /// Open a new session and return the category of its greeting.
    ///
    /// Any current session is discarded first; on failure the controller is
    /// left `Uninitialized`.
    pub fn start<B: DiagnosisBackend>(
        &mut self,
        backend: &B,
        hint: Option<&IdentityHint>,
    ) -> Result<PromptCategory, SessionError> {
        self.session = None;
        self.in_flight = false;
        self.generation += 1;

        let greeting = backend.start_session(hint).map_err(|e| {
            tracing::warn!(error = %e, "Diagnosis session start failed");
            match e {
                TransportError::RateLimited { message } => SessionError::RateLimited { message },
                other => SessionError::StartFailed(other),
            }
        })?;

        let category = classify_prompt(&greeting.message);
        tracing::info!(
            session_id = %greeting.session_id,
            category = ?category,
            "Diagnosis session started"
        );

        self.session = Some(Session::open(
            greeting.session_id,
            Message::assistant(greeting.message),
            category,
        ));
        Ok(category)
    }

    /// Discard all accumulated state and start over.
    ///
    /// An abandoned session with at least one answer is archived first.
    pub fn restart<B: DiagnosisBackend>(
        &mut self,
        backend: &B,
        hint: Option<&IdentityHint>,
    ) -> Result<PromptCategory, SessionError> {
        if let Some(session) = self.session.take() {
            if !session.is_complete && session.user_turns() > 0 {
                self.history.record(SessionSummary::from_session(&session));
            }
            tracing::debug!(session_id = %session.id, "Discarding session for restart");
        }
        self.start(backend, hint)
    }

    // ═══════════════════════════════════════════
    // Turns
    // ═══════════════════════════════════════════

    /// Send one answer and apply the response.
    pub fn submit<B: DiagnosisBackend>(
        &mut self,
        backend: &B,
        answer: &str,
    ) -> Result<TurnOutcome, SessionError> {
        let pending = self.begin_submit(answer)?;
        let result = backend.post_answer(&pending.session_id, &pending.answer);
        self.finish_submit(pending, result)
    }

    /// Submit a draft after checking it fits the current input affordance.
    pub fn submit_draft<B: DiagnosisBackend>(
        &mut self,
        backend: &B,
        draft: AnswerDraft,
    ) -> Result<TurnOutcome, SessionError> {
        let session = self.ready_session()?;
        if let Some(descriptor) = select_input(&session.prompt_category) {
            if !descriptor.accepts(&draft) {
                return Err(SessionError::InvalidDraft(format!("{draft:?}")));
            }
        }
        self.submit(backend, &draft.into_answer())
    }

    /// Record the user's answer and mark a request as outstanding.
    pub fn begin_submit(&mut self, answer: &str) -> Result<PendingTurn, SessionError> {
        self.ready_session()?;
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(SessionError::EmptyAnswer);
        }

        let generation = self.generation;
        let session = self.session.as_mut().ok_or(SessionError::NotActive)?;
        let pending = PendingTurn {
            session_id: session.id.clone(),
            generation,
            prompt: session.current_prompt().to_string(),
            category: session.prompt_category,
            answer: answer.to_string(),
        };
        session.transcript.append(Message::user(answer));
        self.in_flight = true;

        tracing::debug!(
            session_id = %pending.session_id,
            category = ?pending.category,
            transcript_len = session.transcript.len(),
            "Answer sent"
        );
        Ok(pending)
    }

    /// Apply the backend's response to the turn started by `begin_submit`.
    pub fn finish_submit(
        &mut self,
        pending: PendingTurn,
        result: Result<AssistantReply, TransportError>,
    ) -> Result<TurnOutcome, SessionError> {
        if !self.is_current(&pending) {
            tracing::debug!(
                session_id = %pending.session_id,
                "Discarding response for a replaced session"
            );
            return Ok(TurnOutcome::Discarded);
        }
        self.in_flight = false;

        let reply = result.map_err(|e| {
            tracing::warn!(session_id = %pending.session_id, error = %e, "Answer submission failed");
            match e {
                TransportError::RateLimited { message } => SessionError::RateLimited { message },
                other => SessionError::SubmissionFailed(other),
            }
        })?;

        let session = self.session.as_mut().ok_or(SessionError::NotActive)?;

        // Filed even on the completing turn: the answer was accepted.
        let capture = aggregate::apply(
            &mut session.captured,
            &pending.category,
            &pending.prompt,
            &pending.answer,
        );

        let category = classify_response(&reply.message, reply.diagnosis.is_some());
        session.transcript.append(Message::assistant(reply.message));
        session.prompt_category = category;

        tracing::debug!(
            session_id = %session.id,
            capture = ?capture,
            next = ?category,
            "Turn applied"
        );

        let Some(results) = reply.diagnosis else {
            return Ok(TurnOutcome::Continued { category });
        };

        session
            .transcript
            .append(Message::assistant(format_diagnosis(&results)));
        session.diagnosis_results = Some(results.clone());
        session.is_complete = true;

        tracing::info!(
            session_id = %session.id,
            candidates = results.len(),
            symptoms = session.captured.symptoms.len(),
            "Diagnosis session complete"
        );
        self.history.record(SessionSummary::from_session(session));

        Ok(TurnOutcome::Completed { results })
    }

    // ═══════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════

    pub fn phase(&self) -> SessionPhase {
        match &self.session {
            None => SessionPhase::Uninitialized,
            Some(s) if s.is_complete => SessionPhase::Complete,
            Some(_) => SessionPhase::Active,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn transcript(&self) -> Option<&TranscriptStore> {
        self.session.as_ref().map(|s| &s.transcript)
    }

    /// Whether an answer is awaiting its response.
    pub fn is_busy(&self) -> bool {
        self.in_flight
    }

    /// Input to render for the current turn; `None` when no input may be
    /// submitted.
    pub fn current_input(&self) -> Option<InputDescriptor> {
        let session = self.ready_session().ok()?;
        select_input(&session.prompt_category)
    }

    pub fn history(&self) -> &SessionHistory {
        &self.history
    }

    fn ready_session(&self) -> Result<&Session, SessionError> {
        let session = self.session.as_ref().ok_or(SessionError::NotActive)?;
        if session.is_complete {
            return Err(SessionError::AlreadyComplete);
        }
        if self.in_flight {
            return Err(SessionError::RequestInFlight);
        }
        Ok(session)
    }

    fn is_current(&self, pending: &PendingTurn) -> bool {
        pending.generation == self.generation
            && self
                .session
                .as_ref()
                .is_some_and(|s| s.id == pending.session_id)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::dialogue::types::{CaptureKey, TimingAspect};
    use crate::models::{DiagnosisRecord, Sender, Severity};
    use crate::transport::SessionGreeting;

    const GREETING: &str = "Hello! Would you like to start a Symptom Analysis session?";

    /// Mock backend that replays scripted responses in order.
    #[derive(Default)]
    struct ScriptedBackend {
        starts: RefCell<VecDeque<Result<SessionGreeting, TransportError>>>,
        replies: RefCell<VecDeque<Result<AssistantReply, TransportError>>>,
        sent: RefCell<Vec<(String, String)>>,
    }

    impl ScriptedBackend {
        fn new() -> Self {
            Self::default()
        }

        fn greeting(self, session_id: &str) -> Self {
            self.starts.borrow_mut().push_back(Ok(SessionGreeting {
                session_id: SessionId::new(session_id),
                message: GREETING.to_string(),
            }));
            self
        }

        fn start_error(self, error: TransportError) -> Self {
            self.starts.borrow_mut().push_back(Err(error));
            self
        }

        fn reply(self, text: &str) -> Self {
            self.replies
                .borrow_mut()
                .push_back(Ok(AssistantReply::text(text)));
            self
        }

        fn diagnosis(self, text: &str, records: Vec<DiagnosisRecord>) -> Self {
            self.replies
                .borrow_mut()
                .push_back(Ok(AssistantReply::with_diagnosis(text, records)));
            self
        }

        fn reply_error(self, error: TransportError) -> Self {
            self.replies.borrow_mut().push_back(Err(error));
            self
        }
    }

    impl DiagnosisBackend for ScriptedBackend {
        fn start_session(
            &self,
            _hint: Option<&IdentityHint>,
        ) -> Result<SessionGreeting, TransportError> {
            self.starts
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Network("no scripted start".into())))
        }

        fn post_answer(
            &self,
            session_id: &SessionId,
            text: &str,
        ) -> Result<AssistantReply, TransportError> {
            self.sent
                .borrow_mut()
                .push((session_id.to_string(), text.to_string()));
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Network("no scripted reply".into())))
        }
    }

    fn flu() -> DiagnosisRecord {
        DiagnosisRecord {
            disease: "Influenza".into(),
            confidence: 82,
            severity: Severity::Medium,
            symptom_coverage: 75,
            key_symptoms: vec!["fever".into(), "headache".into()],
        }
    }

    fn started(backend: &ScriptedBackend) -> SessionController {
        let mut controller = SessionController::new();
        controller.start(backend, None).unwrap();
        controller
    }

    #[test]
    fn start_appends_greeting_only() {
        let backend = ScriptedBackend::new().greeting("s1");
        let mut controller = SessionController::new();
        assert_eq!(controller.phase(), SessionPhase::Uninitialized);

        let category = controller.start(&backend, None).unwrap();
        assert_eq!(category, PromptCategory::SessionOptIn);
        assert_eq!(controller.phase(), SessionPhase::Active);

        let transcript = controller.transcript().unwrap();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.last().unwrap().sender(), Sender::Assistant);
        assert_eq!(controller.session().unwrap().id().as_str(), "s1");
        assert_eq!(controller.current_input(), Some(InputDescriptor::BinaryChoice));
    }

    #[test]
    fn start_failure_stays_uninitialized() {
        let backend = ScriptedBackend::new().start_error(TransportError::Status {
            status: 500,
            body: "boom".into(),
        });
        let mut controller = SessionController::new();
        let err = controller.start(&backend, None).unwrap_err();
        assert!(matches!(err, SessionError::StartFailed(TransportError::Status { status: 500, .. })));
        assert_eq!(controller.phase(), SessionPhase::Uninitialized);
        assert!(controller.current_input().is_none());
    }

    #[test]
    fn start_rate_limited_asks_for_authentication() {
        let backend = ScriptedBackend::new().start_error(TransportError::RateLimited {
            message: "Please log in".into(),
        });
        let mut controller = SessionController::new();
        let err = controller.start(&backend, None).unwrap_err();
        assert_eq!(
            err,
            SessionError::RateLimited {
                message: "Please log in".into()
            }
        );
        assert!(err.needs_authentication());
    }

    #[test]
    fn submit_without_session_is_rejected() {
        let backend = ScriptedBackend::new().reply("unused");
        let mut controller = SessionController::new();
        assert_eq!(
            controller.submit(&backend, "hello").unwrap_err(),
            SessionError::NotActive
        );
        assert!(backend.sent.borrow().is_empty());
    }

    #[test]
    fn blank_answer_is_rejected_without_side_effects() {
        let backend = ScriptedBackend::new().greeting("s1");
        let mut controller = started(&backend);
        assert_eq!(
            controller.submit(&backend, "   ").unwrap_err(),
            SessionError::EmptyAnswer
        );
        assert_eq!(controller.transcript().unwrap().len(), 1);
        assert!(!controller.is_busy());
    }

    #[test]
    fn mood_intro_touches_no_bucket() {
        let backend = ScriptedBackend::new()
            .greeting("s1")
            .reply("How are you feeling today?")
            .reply("Please describe your symptoms.");
        let mut controller = started(&backend);

        let outcome = controller.submit(&backend, "Yes").unwrap();
        assert_eq!(
            outcome,
            TurnOutcome::Continued {
                category: PromptCategory::MoodIntro
            }
        );
        controller.submit(&backend, "Not great").unwrap();

        let session = controller.session().unwrap();
        assert!(session.captured().is_empty());
        assert_eq!(session.transcript().len(), 5);
    }

    #[test]
    fn symptom_answer_is_split_into_list() {
        let backend = ScriptedBackend::new()
            .greeting("s1")
            .reply("Are you experiencing these symptoms: headache, fever, nausea?")
            .reply("Thanks. Anything else?");
        let mut controller = started(&backend);

        controller.submit(&backend, "Yes").unwrap();
        assert!(matches!(
            controller.current_input(),
            Some(InputDescriptor::TagAutocomplete { .. })
        ));
        controller.submit(&backend, "headache, fever, nausea").unwrap();

        assert_eq!(
            controller.session().unwrap().symptoms(),
            &["headache", "fever", "nausea"]
        );
        assert_eq!(
            backend.sent.borrow()[1],
            ("s1".to_string(), "headache, fever, nausea".to_string())
        );
    }

    #[test]
    fn severity_slider_answer_lands_in_timing_bucket() {
        let backend = ScriptedBackend::new()
            .greeting("s1")
            .reply("On a scale, how severe?")
            .reply("Thank you.");
        let mut controller = started(&backend);
        controller.submit(&backend, "Yes").unwrap();

        let outcome = controller
            .submit_draft(&backend, AnswerDraft::Numeric(7))
            .unwrap();
        assert!(matches!(outcome, TurnOutcome::Continued { .. }));

        let captured = controller.session().unwrap().captured();
        assert_eq!(
            captured.timing_intensity.get_by_prompt("On a scale, how severe?"),
            Some("7")
        );
        assert_eq!(captured.timing_intensity.get(CaptureKey::Severity), Some("7"));
        assert!(captured.symptoms.is_empty());
        assert!(captured.background_traits.is_empty());
        assert!(captured.care_medication.is_empty());
    }

    #[test]
    fn draft_of_wrong_kind_is_rejected() {
        let backend = ScriptedBackend::new()
            .greeting("s1")
            .reply("On a scale, how severe?");
        let mut controller = started(&backend);
        controller.submit(&backend, "Yes").unwrap();
        assert_eq!(
            controller.session().unwrap().prompt_category(),
            PromptCategory::TimingOrIntensity(TimingAspect::Severity)
        );

        let err = controller
            .submit_draft(&backend, AnswerDraft::Numeric(12))
            .unwrap_err();
        assert!(matches!(err, SessionError::InvalidDraft(_)));
        assert_eq!(controller.transcript().unwrap().len(), 3);
    }

    #[test]
    fn diagnosis_completes_session_and_blocks_further_input() {
        let backend = ScriptedBackend::new()
            .greeting("s1")
            .reply("Please list your symptoms.")
            .diagnosis("Analysis complete.", vec![flu()]);
        let mut controller = started(&backend);
        controller.submit(&backend, "Yes").unwrap();

        let outcome = controller.submit(&backend, "fever, headache").unwrap();
        assert_eq!(outcome, TurnOutcome::Completed { results: vec![flu()] });
        assert_eq!(controller.phase(), SessionPhase::Complete);

        let session = controller.session().unwrap();
        assert!(session.is_complete());
        assert_eq!(session.diagnosis_results().unwrap(), &[flu()]);
        // Answer to the last prompt is still filed on the completing turn.
        assert_eq!(session.symptoms(), &["fever", "headache"]);
        // greeting, yes, prompt, answer, reply, rendered diagnosis
        assert_eq!(session.transcript().len(), 6);
        assert!(session
            .transcript()
            .last()
            .unwrap()
            .text()
            .contains("1. Influenza"));

        assert!(controller.current_input().is_none());
        assert_eq!(
            controller.submit(&backend, "more").unwrap_err(),
            SessionError::AlreadyComplete
        );
        assert_eq!(backend.sent.borrow().len(), 2);
        assert_eq!(controller.history().len(), 1);
    }

    #[test]
    fn transport_failure_keeps_user_message_and_buckets() {
        let backend = ScriptedBackend::new()
            .greeting("s1")
            .reply("Please list your symptoms.")
            .reply_error(TransportError::Network("connection reset".into()))
            .reply("Got it.");
        let mut controller = started(&backend);
        controller.submit(&backend, "Yes").unwrap();

        let err = controller.submit(&backend, "cough").unwrap_err();
        assert!(matches!(err, SessionError::SubmissionFailed(TransportError::Network(_))));
        assert_eq!(controller.phase(), SessionPhase::Active);

        let session = controller.session().unwrap();
        assert!(session.symptoms().is_empty());
        let last = session.transcript().last().unwrap();
        assert_eq!(last.sender(), Sender::User);
        assert_eq!(last.text(), "cough");

        // Resubmission answers the same prompt.
        controller.submit(&backend, "cough").unwrap();
        assert_eq!(controller.session().unwrap().symptoms(), &["cough"]);
    }

    #[test]
    fn submission_rate_limit_is_distinguished() {
        let backend = ScriptedBackend::new()
            .greeting("s1")
            .reply_error(TransportError::RateLimited {
                message: "Guest limit reached".into(),
            });
        let mut controller = started(&backend);
        let err = controller.submit(&backend, "Yes").unwrap_err();
        assert_eq!(
            err,
            SessionError::RateLimited {
                message: "Guest limit reached".into()
            }
        );
        assert_eq!(controller.phase(), SessionPhase::Active);
        assert!(!controller.is_busy());
    }

    #[test]
    fn second_submission_while_in_flight_is_rejected() {
        let backend = ScriptedBackend::new().greeting("s1").reply("Next?");
        let mut controller = started(&backend);

        let pending = controller.begin_submit("Yes").unwrap();
        assert!(controller.is_busy());
        assert!(controller.current_input().is_none());
        assert_eq!(
            controller.begin_submit("Again").unwrap_err(),
            SessionError::RequestInFlight
        );

        let result = backend.post_answer(pending.session_id(), pending.answer());
        controller.finish_submit(pending, result).unwrap();
        assert!(!controller.is_busy());
        assert_eq!(controller.transcript().unwrap().len(), 3);
    }

    #[test]
    fn stale_response_after_restart_is_discarded() {
        let backend = ScriptedBackend::new()
            .greeting("s1")
            .greeting("s1")
            .reply("Please list your symptoms.");
        let mut controller = started(&backend);

        let pending = controller.begin_submit("Yes").unwrap();
        controller.restart(&backend, None).unwrap();

        // Backend re-issued the same id; generation still tells them apart.
        let result = backend.post_answer(pending.session_id(), pending.answer());
        let outcome = controller.finish_submit(pending, result).unwrap();
        assert_eq!(outcome, TurnOutcome::Discarded);

        let transcript = controller.transcript().unwrap();
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.last().unwrap().text(), GREETING);
        assert!(!controller.is_busy());
    }

    #[test]
    fn restart_resets_everything() {
        let backend = ScriptedBackend::new()
            .greeting("s1")
            .reply("Is this for yourself or someone else?")
            .reply("Please list your symptoms.")
            .reply("When did your symptoms start?")
            .reply("Have you seen a doctor?")
            .reply("Thanks.")
            .greeting("s2");
        let mut controller = started(&backend);
        for answer in ["Yes", "Myself", "cough, fever", "Yesterday", "No"] {
            controller.submit(&backend, answer).unwrap();
        }
        let before = controller.session().unwrap().captured().clone();
        assert_eq!(before.symptoms.len(), 2);
        assert_eq!(before.background_traits.get(CaptureKey::IsSelf), Some("yes"));
        assert!(!before.timing_intensity.is_empty());
        assert!(!before.care_medication.is_empty());

        controller.restart(&backend, None).unwrap();
        let session = controller.session().unwrap();
        assert_eq!(session.id().as_str(), "s2");
        assert_eq!(session.transcript().len(), 1);
        assert_eq!(session.symptoms().len(), 0);
        assert!(session.captured().background_traits.is_empty());
        assert!(session.captured().timing_intensity.is_empty());
        assert!(session.captured().care_medication.is_empty());
        assert!(session.diagnosis_results().is_none());
        // The abandoned session was archived.
        assert_eq!(controller.history().len(), 1);
    }

    #[test]
    fn restart_from_complete_reopens_session() {
        let backend = ScriptedBackend::new()
            .greeting("s1")
            .diagnosis("Done.", vec![flu()])
            .greeting("s2");
        let mut controller = started(&backend);
        controller.submit(&backend, "Yes").unwrap();
        assert_eq!(controller.phase(), SessionPhase::Complete);

        controller.restart(&backend, None).unwrap();
        assert_eq!(controller.phase(), SessionPhase::Active);
        assert_eq!(controller.transcript().unwrap().len(), 1);
        // Completed sessions are archived once, at completion.
        assert_eq!(controller.history().len(), 1);
    }

    #[test]
    fn restart_without_answers_is_not_archived() {
        let backend = ScriptedBackend::new().greeting("s1").greeting("s2");
        let mut controller = started(&backend);
        controller.restart(&backend, None).unwrap();
        assert!(controller.history().is_empty());
    }

    #[test]
    fn failed_restart_leaves_controller_uninitialized() {
        let backend = ScriptedBackend::new()
            .greeting("s1")
            .start_error(TransportError::Network("offline".into()));
        let mut controller = started(&backend);
        assert!(controller.restart(&backend, None).is_err());
        assert_eq!(controller.phase(), SessionPhase::Uninitialized);
        assert_eq!(
            controller.submit(&backend, "hi").unwrap_err(),
            SessionError::NotActive
        );
    }
}
