use serde_json::{json, Value};

use super::{Dialog, DialogData, Message, Skill};
use crate::{
    device::{DeviceClient, DeviceError, DeviceRequest, HttpDeviceClient},
    error,
    intent::{Intent, IntentBuilder},
    warning,
};

pub const COMMAND_KEYWORD: &str = "CommandKeyword";
pub const MODULE_KEYWORD: &str = "ModuleKeyword";
pub const ACTION_KEYWORD: &str = "ActionKeyword";

/// Keywords of one spoken command, e.g. "turn on led 0".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEvent {
    pub module: String,
    pub command: String,
    pub action: Option<String>,
}

impl CommandEvent {
    /// `None` unless both the module and the command were recognised. The
    /// action is kept as extracted, even when empty.
    pub fn from_message(message: &Message) -> Option<Self> {
        Some(Self {
            module: message.keyword(MODULE_KEYWORD)?.to_owned(),
            command: message.keyword(COMMAND_KEYWORD)?.to_owned(),
            action: message.value(ACTION_KEYWORD).map(str::to_owned),
        })
    }

    pub fn request(&self) -> DeviceRequest {
        DeviceRequest::new(&self.module, &self.command, self.action.as_deref())
    }

    fn not_found_data(&self) -> DialogData {
        let mut data = DialogData::new();
        data.insert("command".into(), json!(self.command));
        data.insert(
            "action".into(),
            self.action.as_ref().map_or(Value::Null, |a| json!(a)),
        );
        data.insert("module".into(), json!(self.module));
        data
    }
}

/// Forwards spoken commands to the ESP8266 board.
pub struct Esp8266Skill<C = HttpDeviceClient> {
    client: C,
}

impl Esp8266Skill {
    /// Skill talking to the board at its mDNS name.
    pub fn new() -> Result<Self, DeviceError> {
        Ok(Self::with_client(HttpDeviceClient::board()?))
    }
}

impl<C: DeviceClient> Esp8266Skill<C> {
    pub fn with_client(client: C) -> Self {
        Self { client }
    }

    pub fn command_intent() -> Intent {
        IntentBuilder::new("Esp8266CmdIntent")
            .require(COMMAND_KEYWORD)
            .require(MODULE_KEYWORD)
            .optionally(ACTION_KEYWORD)
            .build()
    }

    /// Sends the command once and speaks exactly one dialog about the outcome.
    pub fn handle_single_command(&self, message: &Message, dialog: &mut dyn Dialog) {
        let Some(event) = CommandEvent::from_message(message) else {
            warning!("Ignoring command without module or command keyword: {message:?}");
            return;
        };

        match self.client.send(&event.request()) {
            Ok(()) => dialog.speak_dialog("cmd.sent", &DialogData::new()),
            Err(e) => {
                dialog.speak_dialog("not.found", &event.not_found_data());
                error!(name: module_path!(); "Error: {e}");
            }
        }
    }
}

impl<C: DeviceClient> Skill for Esp8266Skill<C> {
    fn name(&self) -> &str {
        "Esp8266Skill"
    }

    fn initialize(&mut self) -> Vec<Intent> {
        vec![Self::command_intent()]
    }

    fn handle_intent(&self, _intent: &Intent, message: &Message, dialog: &mut dyn Dialog) {
        self.handle_single_command(message, dialog);
    }
}
