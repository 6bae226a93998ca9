use std::{
    collections::HashMap,
    io::{self, Write},
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{debug, info, intent::Intent, warning};

pub mod esp8266;

/// Parameters handed to a dialog template.
pub type DialogData = HashMap<String, Value>;

/// An utterance after keyword extraction.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Message {
    #[serde(rename = "type")]
    msg_type: String,
    #[serde(default)]
    metadata: HashMap<String, String>,
}

impl Message {
    pub fn new(msg_type: impl Into<String>) -> Self {
        Self {
            msg_type: msg_type.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn utterance() -> Self {
        Self::new("recognizer_loop:utterance")
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(keyword.into(), value.into());
        self
    }

    /// The extracted value exactly as the matcher produced it.
    pub fn value(&self, keyword: &str) -> Option<&str> {
        self.metadata.get(keyword).map(String::as_str)
    }

    /// The extracted value, or `None` when the keyword is missing or empty.
    pub fn keyword(&self, keyword: &str) -> Option<&str> {
        self.value(keyword).filter(|v| !v.is_empty())
    }
}

/// Speaks named, templated responses back to the user.
pub trait Dialog {
    fn speak_dialog(&mut self, name: &str, data: &DialogData);
}

/// Renders `{key}` placeholders from a fixed set of templates and writes one
/// line per spoken dialog.
pub struct TemplateDialog<W: Write> {
    templates: HashMap<String, String>,
    out: W,
}

impl TemplateDialog<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TemplateDialog<W> {
    pub fn new(out: W) -> Self {
        Self {
            templates: HashMap::new(),
            out,
        }
        .with_template("cmd.sent", "Command sent.")
        .with_template(
            "not.found",
            "Sorry, I could not {command} {action} the {module}.",
        )
    }

    pub fn with_template(mut self, name: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.insert(name.into(), template.into());
        self
    }

    pub fn render(&self, name: &str, data: &DialogData) -> String {
        let Some(template) = self.templates.get(name) else {
            return name.to_owned();
        };

        let mut text = String::with_capacity(template.len());
        let mut rest = template.as_str();

        while let Some(open) = rest.find('{') {
            text.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let Some(close) = after.find('}') else {
                rest = &rest[open..];
                break;
            };

            let key = &after[..close];
            match data.get(key) {
                Some(Value::String(s)) => text.push_str(s),
                Some(Value::Null) => {}
                Some(other) => text.push_str(&other.to_string()),
                None => text.push_str(&rest[open..open + close + 2]),
            }
            rest = &after[close + 1..];
        }
        text.push_str(rest);

        // Absent parameters leave double spaces behind.
        text.split_whitespace().collect::<Vec<&str>>().join(" ")
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Dialog for TemplateDialog<W> {
    fn speak_dialog(&mut self, name: &str, data: &DialogData) {
        let line = self.render(name, data);
        debug!("Speaking dialog {name}: {line}");

        if let Err(e) = writeln!(self.out, "{line}") {
            warning!("Could not speak dialog {name}: {e}");
        }
    }
}

/// A plugin handling one category of spoken command.
pub trait Skill {
    fn name(&self) -> &str;

    /// Called once when the host loads the skill. Returns the intents to
    /// register.
    fn initialize(&mut self) -> Vec<Intent>;

    fn handle_intent(&self, intent: &Intent, message: &Message, dialog: &mut dyn Dialog);

    fn stop(&self) {}
}

/// Holds loaded skills and routes messages to the first matching intent.
#[derive(Default)]
pub struct SkillHost {
    skills: Vec<Box<dyn Skill>>,
    intents: Vec<(usize, Intent)>,
}

impl SkillHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, mut skill: Box<dyn Skill>) {
        let index = self.skills.len();

        for intent in skill.initialize() {
            info!("Registering intent {} for {}", intent.name(), skill.name());
            self.intents.push((index, intent));
        }

        self.skills.push(skill);
    }

    pub fn intents(&self) -> impl Iterator<Item = &Intent> {
        self.intents.iter().map(|(_, intent)| intent)
    }

    /// Returns `false` when no registered intent matched.
    pub fn dispatch(&self, message: &Message, dialog: &mut dyn Dialog) -> bool {
        let Some((index, intent)) = self
            .intents
            .iter()
            .find(|(_, intent)| intent.matches(message))
        else {
            debug!("No intent matched {message:?}");
            return false;
        };

        let skill = &self.skills[*index];
        debug!("{} handles {}", skill.name(), intent.name());
        skill.handle_intent(intent, message, dialog);

        true
    }

    pub fn stop(&self) {
        for skill in &self.skills {
            skill.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use serde_json::json;

    use super::*;
    use crate::intent::IntentBuilder;

    struct Echo {
        handled: Cell<usize>,
    }

    impl Skill for Echo {
        fn name(&self) -> &str {
            "EchoSkill"
        }

        fn initialize(&mut self) -> Vec<Intent> {
            vec![IntentBuilder::new("EchoIntent").require("EchoKeyword").build()]
        }

        fn handle_intent(&self, _intent: &Intent, message: &Message, dialog: &mut dyn Dialog) {
            self.handled.set(self.handled.get() + 1);
            let mut data = DialogData::new();
            data.insert("word".into(), json!(message.keyword("EchoKeyword")));
            dialog.speak_dialog("echo", &data);
        }
    }

    #[test]
    fn renders_placeholders() {
        let dialog = TemplateDialog::new(Vec::new());
        let mut data = DialogData::new();
        data.insert("command".into(), json!("turn"));
        data.insert("action".into(), json!("on"));
        data.insert("module".into(), json!("led 0"));

        assert_eq!(
            dialog.render("not.found", &data),
            "Sorry, I could not turn on the led 0."
        );
    }

    #[test]
    fn null_parameters_render_empty() {
        let dialog = TemplateDialog::new(Vec::new());
        let mut data = DialogData::new();
        data.insert("command".into(), json!("toggle"));
        data.insert("action".into(), Value::Null);
        data.insert("module".into(), json!("fan"));

        assert_eq!(
            dialog.render("not.found", &data),
            "Sorry, I could not toggle the fan."
        );
    }

    #[test]
    fn substituted_values_are_not_expanded_again() {
        let dialog = TemplateDialog::new(Vec::new());
        let mut data = DialogData::new();
        data.insert("command".into(), json!("turn"));
        data.insert("action".into(), json!("{module}"));
        data.insert("module".into(), json!("{command}"));

        assert_eq!(
            dialog.render("not.found", &data),
            "Sorry, I could not turn {module} the {command}."
        );
    }

    #[test]
    fn unknown_placeholders_are_left_alone() {
        let dialog = TemplateDialog::new(Vec::new()).with_template("odd", "{missing} and {unclosed");

        assert_eq!(dialog.render("odd", &DialogData::new()), "{missing} and {unclosed");
    }

    #[test]
    fn unknown_dialog_speaks_its_name() {
        let mut dialog = TemplateDialog::new(Vec::new());
        dialog.speak_dialog("mystery.dialog", &DialogData::new());

        assert_eq!(String::from_utf8(dialog.into_inner()).unwrap(), "mystery.dialog\n");
    }

    #[test]
    fn host_dispatches_to_matching_intent() {
        let mut host = SkillHost::new();
        host.load(Box::new(Echo {
            handled: Cell::new(0),
        }));

        let mut dialog = TemplateDialog::new(Vec::new()).with_template("echo", "{word}");
        let handled = host.dispatch(
            &Message::utterance().with_keyword("EchoKeyword", "hello"),
            &mut dialog,
        );

        assert!(handled);
        assert_eq!(host.intents().count(), 1);
        assert_eq!(String::from_utf8(dialog.into_inner()).unwrap(), "hello\n");
    }

    #[test]
    fn host_ignores_unmatched_messages() {
        let mut host = SkillHost::new();
        host.load(Box::new(Echo {
            handled: Cell::new(0),
        }));

        let mut dialog = TemplateDialog::new(Vec::new());
        assert!(!host.dispatch(&Message::utterance(), &mut dialog));
        assert!(dialog.into_inner().is_empty());
    }

    #[test]
    fn message_json_shape() {
        let message: Message = serde_json::from_str(
            r#"{"type": "recognizer_loop:utterance", "metadata": {"ModuleKeyword": "fan"}}"#,
        )
        .unwrap();

        assert_eq!(message, Message::utterance().with_keyword("ModuleKeyword", "fan"));
        assert_eq!(message.keyword("ModuleKeyword"), Some("fan"));
        assert_eq!(message.keyword("CommandKeyword"), None);
    }
}
