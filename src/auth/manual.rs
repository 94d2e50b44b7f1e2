use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    auth::NonceCodeRegistry,
    error::AuthError,
    input::{
        InputBoxParameters, InputHost, MultiStepInput, Prompt, StepRef, Transition,
        WizardOutcome, WizardStep,
    },
};

pub const MANUAL_ENTRY_TITLE: &str = "Enter your authorization code";
pub const EMPTY_CODE_MESSAGE: &str = "Authorization code must not be empty";

#[derive(Default)]
struct ManualEntryState {
    code: Option<String>,
}

struct EnterCodeStep;

#[async_trait]
impl WizardStep<ManualEntryState> for EnterCodeStep {
    async fn run(
        &self,
        input: &mut MultiStepInput,
        state: &mut ManualEntryState,
    ) -> Result<Transition<ManualEntryState>, AuthError> {
        let params = InputBoxParameters::new(
            MANUAL_ENTRY_TITLE,
            "Paste the code shown in the browser after signing in",
        )
        .placeholder("Authorization code")
        .password()
        .validate(|value| {
            value
                .trim()
                .is_empty()
                .then(|| EMPTY_CODE_MESSAGE.to_string())
        });

        match input.show_input_box(params).await? {
            Prompt::Accepted(code) => {
                state.code = Some(code.trim().to_string());
                Ok(Transition::Done)
            }
            Prompt::Signal(signal) => Ok(Transition::Signal(signal)),
            // no step buttons are offered
            Prompt::Button(_) => Ok(Transition::Done),
        }
    }
}

/// Fallback that lets the user paste the authorization code by hand when
/// the browser redirect cannot reach this process.
#[derive(Clone)]
pub struct ManualEntryChannel {
    host: Arc<dyn InputHost>,
    registry: NonceCodeRegistry,
}

impl ManualEntryChannel {
    pub fn new(host: Arc<dyn InputHost>, registry: NonceCodeRegistry) -> Self {
        Self { host, registry }
    }

    /// Prompts for the code belonging to `nonce`.
    ///
    /// An accepted code goes to the registry; dismissing the prompt cancels
    /// `cancel`, the signal shared with the registry wait. Cancellation from
    /// elsewhere dismisses the prompt.
    pub async fn run(&self, nonce: &str, cancel: &CancellationToken) -> Result<(), AuthError> {
        let mut state = ManualEntryState::default();
        let start: StepRef<ManualEntryState> = Arc::new(EnterCodeStep);

        let outcome = tokio::select! {
            outcome = MultiStepInput::run(Arc::clone(&self.host), start, &mut state) => outcome?,
            _ = cancel.cancelled() => return Ok(()),
        };

        match outcome {
            WizardOutcome::Completed => {
                if let Some(code) = state.code {
                    self.registry.resolve_code(nonce, &code);
                }
                Ok(())
            }
            WizardOutcome::Cancelled => {
                cancel.cancel();
                Ok(())
            }
            WizardOutcome::Back => Err(AuthError::Back),
        }
    }
}
