use std::{fmt::Display, sync::Arc};

use async_trait::async_trait;

use crate::{
    error::AuthError,
    input::widget::{
        InputButton, InputHost, InputWidget, WidgetButton, WidgetContent, WidgetEvent,
        WidgetKind, WidgetView,
    },
};

/// Navigation requested by the user instead of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFlowSignal {
    /// Undo the previous step.
    Back,
    /// Abort the whole flow.
    Cancel,
}

/// What a prompt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompt<T> {
    Accepted(T),
    /// A step-supplied button, by id.
    Button(String),
    Signal(InputFlowSignal),
}

pub type StepRef<S> = Arc<dyn WizardStep<S>>;

/// What the controller does after a step returns.
pub enum Transition<S> {
    Next(StepRef<S>),
    Done,
    Signal(InputFlowSignal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardOutcome {
    Completed,
    Cancelled,
    /// `Back` was signalled with no earlier step to return to.
    Back,
}

#[async_trait]
pub trait WizardStep<S: Send>: Send + Sync {
    async fn run(
        &self,
        input: &mut MultiStepInput,
        state: &mut S,
    ) -> Result<Transition<S>, AuthError>;
}

pub type Validator = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

pub struct QuickPickParameters<T> {
    pub title: String,
    pub step: usize,
    pub total_steps: usize,
    pub items: Vec<T>,
    pub active_item: Option<T>,
    pub placeholder: Option<String>,
    pub buttons: Vec<InputButton>,
}

impl<T> QuickPickParameters<T> {
    pub fn new(title: impl Into<String>, items: Vec<T>) -> Self {
        Self {
            title: title.into(),
            step: 1,
            total_steps: 1,
            items,
            active_item: None,
            placeholder: None,
            buttons: Vec::new(),
        }
    }

    pub fn step(mut self, step: usize, total_steps: usize) -> Self {
        self.step = step;
        self.total_steps = total_steps;
        self
    }

    pub fn active_item(mut self, item: T) -> Self {
        self.active_item = Some(item);
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn button(mut self, button: InputButton) -> Self {
        self.buttons.push(button);
        self
    }
}

pub struct InputBoxParameters {
    pub title: String,
    pub step: usize,
    pub total_steps: usize,
    pub value: String,
    pub prompt: String,
    pub placeholder: Option<String>,
    pub password: bool,
    pub buttons: Vec<InputButton>,
    pub validate: Validator,
}

impl InputBoxParameters {
    pub fn new(title: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            step: 1,
            total_steps: 1,
            value: String::new(),
            prompt: prompt.into(),
            placeholder: None,
            password: false,
            buttons: Vec::new(),
            validate: Arc::new(|_| None),
        }
    }

    pub fn step(mut self, step: usize, total_steps: usize) -> Self {
        self.step = step;
        self.total_steps = total_steps;
        self
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    pub fn password(mut self) -> Self {
        self.password = true;
        self
    }

    pub fn button(mut self, button: InputButton) -> Self {
        self.buttons.push(button);
        self
    }

    pub fn validate<F>(mut self, validate: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.validate = Arc::new(validate);
        self
    }
}

/// Runs a chain of interactive steps with back navigation.
///
/// Owns at most one widget at a time; it is disposed when the next prompt
/// replaces it and when the controller goes away, whatever the exit path.
pub struct MultiStepInput {
    host: Arc<dyn InputHost>,
    current: Option<Box<dyn InputWidget>>,
    depth: usize,
}

impl MultiStepInput {
    /// Runs the steps starting at `start` until one finishes the chain.
    ///
    /// Each step receives the controller to show prompts and the shared
    /// `state` to record answers in. Before the next step runs, the current
    /// widget is disabled and marked busy; the new prompt then replaces it.
    ///
    /// # Arguments
    ///
    /// * `host` - Creates the widgets the steps show
    /// * `start` - First step of the chain
    /// * `state` - Mutable state shared by all steps
    ///
    /// # Returns
    ///
    /// [`WizardOutcome::Completed`] when a step returns `Done`,
    /// [`WizardOutcome::Cancelled`] on a cancel signal and
    /// [`WizardOutcome::Back`] when the first step signals back.
    ///
    /// # Errors
    ///
    /// Propagates the first error a step or the host returns. The current
    /// widget is disposed in that case too.
    ///
    /// # Example
    ///
    /// ```
    /// let mut state = ManualEntryState::default();
    /// let start: StepRef<ManualEntryState> = Arc::new(EnterCodeStep);
    ///
    /// match MultiStepInput::run(host, start, &mut state).await? {
    ///     WizardOutcome::Completed => println!("{:?}", state.code),
    ///     WizardOutcome::Cancelled | WizardOutcome::Back => {}
    /// }
    /// ```
    pub async fn run<S: Send>(
        host: Arc<dyn InputHost>,
        start: StepRef<S>,
        state: &mut S,
    ) -> Result<WizardOutcome, AuthError> {
        let mut input = MultiStepInput {
            host,
            current: None,
            depth: 0,
        };
        let outcome = input.step_through(start, state).await;
        input.release_current();
        outcome
    }

    async fn step_through<S: Send>(
        &mut self,
        start: StepRef<S>,
        state: &mut S,
    ) -> Result<WizardOutcome, AuthError> {
        let mut steps: Vec<StepRef<S>> = Vec::new();
        let mut next = Some(start);

        while let Some(step) = next.take() {
            steps.push(Arc::clone(&step));
            self.depth = steps.len();
            if let Some(widget) = self.current.as_mut() {
                widget.set_enabled(false);
                widget.set_busy(true);
            }

            match step.run(self, state).await? {
                Transition::Next(step) => next = Some(step),
                Transition::Done => {}
                Transition::Signal(InputFlowSignal::Back) => {
                    steps.pop();
                    match steps.pop() {
                        Some(previous) => next = Some(previous),
                        None => return Ok(WizardOutcome::Back),
                    }
                }
                Transition::Signal(InputFlowSignal::Cancel) => {
                    return Ok(WizardOutcome::Cancelled);
                }
            }
        }

        Ok(WizardOutcome::Completed)
    }

    /// Number of steps on the stack, including the running one.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub async fn show_quick_pick<T>(
        &mut self,
        params: QuickPickParameters<T>,
    ) -> Result<Prompt<T>, AuthError>
    where
        T: Display + Clone + PartialEq + Send,
    {
        let items: Vec<String> = params.items.iter().map(ToString::to_string).collect();
        let active = params
            .active_item
            .as_ref()
            .and_then(|active| params.items.iter().position(|item| item == active));
        let view = WidgetView {
            title: params.title,
            step: params.step,
            total_steps: params.total_steps,
            placeholder: params.placeholder,
            buttons: self.buttons(params.buttons),
            content: WidgetContent::QuickPick { items, active },
        };

        let widget = self.replace_current(WidgetKind::QuickPick)?;
        widget.update(&view);
        let mut events = widget.subscribe();
        widget.show();

        let prompt = loop {
            let Some(event) = events.recv().await else {
                break Prompt::Signal(InputFlowSignal::Cancel);
            };
            match event {
                WidgetEvent::Select(index) => {
                    if let Some(item) = params.items.get(index) {
                        break Prompt::Accepted(item.clone());
                    }
                }
                WidgetEvent::Back => break Prompt::Signal(InputFlowSignal::Back),
                WidgetEvent::Button(id) => break Prompt::Button(id),
                WidgetEvent::Hide => break Prompt::Signal(InputFlowSignal::Cancel),
                WidgetEvent::ValueChanged(_) | WidgetEvent::Accept => {}
            }
        };

        drop(events);
        Ok(prompt)
    }

    pub async fn show_input_box(
        &mut self,
        params: InputBoxParameters,
    ) -> Result<Prompt<String>, AuthError> {
        let validate = params.validate;
        let view = WidgetView {
            title: params.title,
            step: params.step,
            total_steps: params.total_steps,
            placeholder: params.placeholder,
            buttons: self.buttons(params.buttons),
            content: WidgetContent::InputBox {
                value: params.value.clone(),
                prompt: params.prompt,
                password: params.password,
            },
        };

        let widget = self.replace_current(WidgetKind::InputBox)?;
        widget.update(&view);
        let mut value = params.value;
        let mut message = validate(&value);
        widget.set_validation_message(message.as_deref());
        let mut events = widget.subscribe();
        widget.show();

        let prompt = loop {
            let Some(event) = events.recv().await else {
                break Prompt::Signal(InputFlowSignal::Cancel);
            };
            match event {
                WidgetEvent::ValueChanged(changed) => {
                    message = validate(&changed);
                    value = changed;
                    widget.set_validation_message(message.as_deref());
                }
                WidgetEvent::Accept => {
                    if message.is_none() {
                        break Prompt::Accepted(value.clone());
                    }
                }
                WidgetEvent::Back => break Prompt::Signal(InputFlowSignal::Back),
                WidgetEvent::Button(id) => break Prompt::Button(id),
                WidgetEvent::Hide => break Prompt::Signal(InputFlowSignal::Cancel),
                WidgetEvent::Select(_) => {}
            }
        };

        drop(events);
        Ok(prompt)
    }

    fn buttons(&self, custom: Vec<InputButton>) -> Vec<WidgetButton> {
        let back = (self.depth > 1).then_some(WidgetButton::Back);
        back.into_iter()
            .chain(custom.into_iter().map(WidgetButton::Custom))
            .collect()
    }

    fn replace_current(&mut self, kind: WidgetKind) -> Result<&mut Box<dyn InputWidget>, AuthError> {
        self.release_current();
        let widget = self.host.create_widget(kind)?;
        Ok(self.current.insert(widget))
    }

    fn release_current(&mut self) {
        if let Some(mut widget) = self.current.take() {
            widget.dispose();
        }
    }
}

impl Drop for MultiStepInput {
    fn drop(&mut self) {
        self.release_current();
    }
}
