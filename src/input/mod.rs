//! # Input Module
//!
//! Stepped interactive input: a controller that runs a chain of prompts with
//! back navigation and cancellation, the widget seam it drives, and a
//! terminal implementation of that seam for the CLI.
//!
//! Steps return a [`Transition`] instead of raising sentinels: `Next` pushes a
//! step, `Signal(Back)` returns to the previous one, `Signal(Cancel)` ends the
//! run quietly with [`WizardOutcome::Cancelled`].

mod controller;
mod terminal;
mod widget;

pub use controller::{
    InputBoxParameters, InputFlowSignal, MultiStepInput, Prompt, QuickPickParameters, StepRef,
    Transition, Validator, WizardOutcome, WizardStep,
};
pub use terminal::TerminalHost;
pub use widget::{
    InputButton, InputHost, InputWidget, WidgetButton, WidgetContent, WidgetEvent, WidgetKind,
    WidgetView,
};
