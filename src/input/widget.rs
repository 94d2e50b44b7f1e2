use tokio::sync::mpsc;

use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    QuickPick,
    InputBox,
}

/// An action button supplied by a step, reported back by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputButton {
    pub id: String,
    pub tooltip: String,
}

impl InputButton {
    pub fn new(id: impl Into<String>, tooltip: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tooltip: tooltip.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetButton {
    Back,
    Custom(InputButton),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetContent {
    QuickPick {
        items: Vec<String>,
        active: Option<usize>,
    },
    InputBox {
        value: String,
        prompt: String,
        password: bool,
    },
}

/// Everything a host needs to present one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetView {
    pub title: String,
    pub step: usize,
    pub total_steps: usize,
    pub placeholder: Option<String>,
    pub buttons: Vec<WidgetButton>,
    pub content: WidgetContent,
}

/// User interaction reported by a widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    ValueChanged(String),
    Accept,
    /// Index into the quick pick items.
    Select(usize),
    Back,
    Button(String),
    /// Dismissed without choosing or accepting.
    Hide,
}

/// A prompt owned by the host UI.
pub trait InputWidget: Send {
    fn update(&mut self, view: &WidgetView);

    fn set_validation_message(&mut self, message: Option<&str>);

    fn set_enabled(&mut self, enabled: bool);

    fn set_busy(&mut self, busy: bool);

    /// Opens a fresh event subscription; dropping the receiver releases it.
    fn subscribe(&mut self) -> mpsc::UnboundedReceiver<WidgetEvent>;

    fn show(&mut self);

    fn dispose(&mut self);
}

/// The UI toolkit that creates widgets.
pub trait InputHost: Send + Sync {
    fn create_widget(&self, kind: WidgetKind) -> Result<Box<dyn InputWidget>, AuthError>;
}
