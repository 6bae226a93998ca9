use serde::{Deserialize, Serialize};

use crate::skills::Message;

/// A keyword pattern a skill registers with the host.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Intent {
    name: String,
    required: Vec<String>,
    optional: Vec<String>,
}

impl Intent {
    pub fn name(&self) -> &str {
        self.name.as_ref()
    }

    pub fn required(&self) -> &[String] {
        &self.required
    }

    pub fn optional(&self) -> &[String] {
        &self.optional
    }

    /// True when every required keyword was extracted from the utterance.
    pub fn matches(&self, message: &Message) -> bool {
        self.required
            .iter()
            .all(|keyword| message.keyword(keyword).is_some())
    }
}

pub struct IntentBuilder {
    name: String,
    required: Vec<String>,
    optional: Vec<String>,
}

impl IntentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: Vec::new(),
            optional: Vec::new(),
        }
    }

    pub fn require(mut self, keyword: impl Into<String>) -> Self {
        self.required.push(keyword.into());
        self
    }

    pub fn optionally(mut self, keyword: impl Into<String>) -> Self {
        self.optional.push(keyword.into());
        self
    }

    pub fn build(self) -> Intent {
        Intent {
            name: self.name,
            required: self.required,
            optional: self.optional,
        }
    }
}
