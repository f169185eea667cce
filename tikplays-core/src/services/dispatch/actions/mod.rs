pub mod command_action;
pub mod cue_actions;
pub mod key_press_action;
pub mod webhook_action;

pub use command_action::CommandAction;
pub use cue_actions::{SoundCueAction, VideoCueAction};
pub use key_press_action::KeyPressAction;
pub use webhook_action::WebhookAction;
