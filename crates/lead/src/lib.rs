// Lead capture: the contact form's state machine and its submission to the intake endpoint.
//
// The intake call blocks, so each submission gets its own worker thread rather than a slot in
// Bevy's task pools. The frame loop checks the worker once per frame and folds its result back
// into `LeadForm`.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use bevy::prelude::*;
use noora_config::LeadConfig;

pub mod intake;

pub use intake::{
    submit_lead, validate_email, HttpIntake, IntakeReply, LeadError, LeadIntake, LeadRequest,
    ReplyStatus, DEFAULT_CONFIRMATION, GENERIC_FAILURE,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadFormState {
    Editing { email: String, error: Option<String> },
    Submitting { email: String },
    Confirmed { email: String, message: String },
}

impl Default for LeadFormState {
    fn default() -> Self {
        Self::Editing {
            email: String::new(),
            error: None,
        }
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct LeadForm {
    state: LeadFormState,
}

impl LeadForm {
    pub fn state(&self) -> &LeadFormState {
        &self.state
    }

    pub fn email(&self) -> &str {
        match &self.state {
            LeadFormState::Editing { email, .. }
            | LeadFormState::Submitting { email }
            | LeadFormState::Confirmed { email, .. } => email,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            LeadFormState::Editing { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, LeadFormState::Submitting { .. })
    }

    /// Edit the field. Ignored once a submission is in flight or confirmed.
    pub fn set_email(&mut self, value: impl Into<String>) {
        if let LeadFormState::Editing { email, error } = &mut self.state {
            *email = value.into();
            *error = None;
        }
    }

    /// Validate and move to `Submitting`. Returns the email to send, or leaves the form editing
    /// with the validation message.
    pub fn begin_submit(&mut self) -> Option<String> {
        let LeadFormState::Editing { email, error } = &mut self.state else {
            return None;
        };
        match validate_email(email) {
            Ok(valid) => {
                self.state = LeadFormState::Submitting {
                    email: valid.clone(),
                };
                Some(valid)
            }
            Err(e) => {
                *error = Some(e.to_string());
                None
            }
        }
    }

    pub fn resolve(&mut self, result: Result<String, LeadError>) {
        let email = self.email().to_string();
        self.state = match result {
            Ok(message) => LeadFormState::Confirmed { email, message },
            Err(e) => LeadFormState::Editing {
                email,
                error: Some(e.to_string()),
            },
        };
    }
}

/// Request to submit `email` through the form.
#[derive(Event, Debug, Clone)]
pub struct SubmitLead {
    pub email: String,
}

/// Emitted when a submission settles; `Err` carries the user-facing message.
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct LeadOutcome {
    pub email: String,
    pub result: Result<String, String>,
}

#[derive(Resource, Clone)]
pub struct LeadIntakeRes(pub Arc<dyn LeadIntake>);

/// Name of the worker thread that carries a submission.
pub const INTAKE_THREAD: &str = "lead-intake";

#[derive(Resource, Default)]
struct PendingLead(Option<JoinHandle<Result<String, LeadError>>>);

fn start_submissions(
    mut events: EventReader<SubmitLead>,
    mut form: ResMut<LeadForm>,
    mut pending: ResMut<PendingLead>,
    intake: Option<Res<LeadIntakeRes>>,
) {
    for ev in events.read() {
        if pending.0.is_some() || !matches!(form.state(), LeadFormState::Editing { .. }) {
            debug!(email = %ev.email, "lead submit ignored; form not editable");
            continue;
        }
        form.set_email(ev.email.clone());
        let Some(email) = form.begin_submit() else {
            info!(error = ?form.error(), "lead rejected before submit");
            continue;
        };
        let Some(intake) = intake.as_ref().map(|i| Arc::clone(&i.0)) else {
            warn!("no lead intake configured");
            form.resolve(Err(LeadError::Unavailable));
            continue;
        };
        info!(%email, "submitting lead");
        let worker = thread::Builder::new()
            .name(INTAKE_THREAD.to_string())
            .spawn(move || submit_lead(intake.as_ref(), &email));
        match worker {
            Ok(handle) => pending.0 = Some(handle),
            Err(e) => {
                error!(error = %e, "could not start lead worker");
                form.resolve(Err(LeadError::Unavailable));
            }
        }
    }
}

fn poll_submission(
    mut pending: ResMut<PendingLead>,
    mut form: ResMut<LeadForm>,
    mut outcomes: EventWriter<LeadOutcome>,
) {
    if !pending.0.as_ref().is_some_and(JoinHandle::is_finished) {
        return;
    }
    let Some(handle) = pending.0.take() else {
        return;
    };
    let result = handle.join().unwrap_or_else(|_| {
        error!("lead worker panicked");
        Err(LeadError::Unavailable)
    });
    let email = form.email().to_string();
    match &result {
        Ok(message) => info!(%email, %message, "lead confirmed"),
        Err(e) => warn!(%email, error = ?e, "lead submission failed"),
    }
    let reported = result.as_ref().cloned().map_err(ToString::to_string);
    form.resolve(result);
    outcomes.write(LeadOutcome {
        email,
        result: reported,
    });
}

/// Registers the form, its events and the submission systems. When no [`LeadIntakeRes`] was
/// inserted beforehand, an [`HttpIntake`] is built from `config`.
#[derive(Default)]
pub struct LeadPlugin {
    pub config: LeadConfig,
}

impl Plugin for LeadPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LeadForm>()
            .init_resource::<PendingLead>()
            .add_event::<SubmitLead>()
            .add_event::<LeadOutcome>()
            .add_systems(Update, (start_submissions, poll_submission).chain());

        if app.world().get_resource::<LeadIntakeRes>().is_none() {
            match HttpIntake::new(&self.config) {
                Ok(http) => {
                    info!(endpoint = http.endpoint(), "lead intake ready");
                    app.insert_resource(LeadIntakeRes(Arc::new(http)));
                }
                Err(e) => warn!(error = ?e, "lead intake unavailable"),
            }
        }
    }
}
