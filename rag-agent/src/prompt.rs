//! Chat prompt for the tool-calling agent.
//!
//! The built-in template mirrors the widely used "openai-functions-agent"
//! prompt: a system line, optional chat history, the user input and the
//! agent scratchpad. A template with the same shape can be pulled from a
//! URL instead.

use crate::error::{RagError, Result};
use crate::models::ChatMessage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

pub const SCRATCHPAD: &str = "agent_scratchpad";
pub const CHAT_HISTORY: &str = "chat_history";
pub const INPUT: &str = "input";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PromptMessage {
    System {
        template: String,
    },
    Human {
        template: String,
    },
    Ai {
        template: String,
    },
    Placeholder {
        variable_name: String,
        #[serde(default)]
        optional: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatPromptTemplate {
    pub messages: Vec<PromptMessage>,
}

impl ChatPromptTemplate {
    pub fn new(messages: Vec<PromptMessage>) -> Result<Self> {
        let prompt = Self { messages };
        prompt.validate()?;
        Ok(prompt)
    }

    pub fn openai_functions_agent() -> Self {
        Self {
            messages: vec![
                PromptMessage::System {
                    template: "You are a helpful assistant".to_string(),
                },
                PromptMessage::Placeholder {
                    variable_name: CHAT_HISTORY.to_string(),
                    optional: true,
                },
                PromptMessage::Human {
                    template: "{input}".to_string(),
                },
                PromptMessage::Placeholder {
                    variable_name: SCRATCHPAD.to_string(),
                    optional: false,
                },
            ],
        }
    }

    /// Fetches a template serialized as `{"messages": [...]}`.
    pub async fn pull(client: &Client, url: &str) -> Result<Self> {
        info!("Pulling prompt from {}", url);

        let response = client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(RagError::Prompt(format!(
                "pulling {} returned HTTP {}",
                url,
                response.status()
            )));
        }

        let prompt: ChatPromptTemplate = response.json().await?;
        prompt.validate()?;
        Ok(prompt)
    }

    fn validate(&self) -> Result<()> {
        let has_scratchpad = self.messages.iter().any(|m| {
            matches!(m, PromptMessage::Placeholder { variable_name, .. } if variable_name == SCRATCHPAD)
        });
        if !has_scratchpad {
            return Err(RagError::Prompt(format!(
                "prompt must have a `{}` placeholder",
                SCRATCHPAD
            )));
        }
        Ok(())
    }

    /// Renders the template for one model turn.
    pub fn format(
        &self,
        input: &str,
        chat_history: &[ChatMessage],
        scratchpad: &[ChatMessage],
    ) -> Result<Vec<ChatMessage>> {
        let vars = HashMap::from([(INPUT, input)]);
        let mut placeholders = HashMap::from([(CHAT_HISTORY, chat_history), (SCRATCHPAD, scratchpad)]);

        let mut messages = Vec::with_capacity(self.messages.len() + chat_history.len() + scratchpad.len());
        for message in &self.messages {
            match message {
                PromptMessage::System { template } => {
                    messages.push(ChatMessage::system(render(template, &vars)?))
                }
                PromptMessage::Human { template } => {
                    messages.push(ChatMessage::user(render(template, &vars)?))
                }
                PromptMessage::Ai { template } => {
                    messages.push(ChatMessage::assistant(render(template, &vars)?))
                }
                PromptMessage::Placeholder {
                    variable_name,
                    optional,
                } => match placeholders.remove(variable_name.as_str()) {
                    Some(history) => messages.extend_from_slice(history),
                    None if *optional => {}
                    None => {
                        return Err(RagError::Prompt(format!(
                            "missing value for placeholder `{}`",
                            variable_name
                        )))
                    }
                },
            }
        }

        Ok(messages)
    }
}

/// Substitutes `{name}` variables; `{{` and `}}` are literal braces.
fn render(template: &str, vars: &HashMap<&str, &str>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => name.push(ch),
                        None => {
                            return Err(RagError::Prompt(format!(
                                "unclosed variable in template `{}`",
                                template
                            )))
                        }
                    }
                }
                let value = vars.get(name.trim()).ok_or_else(|| {
                    RagError::Prompt(format!("unknown template variable `{}`", name))
                })?;
                out.push_str(value);
            }
            '}' => {
                return Err(RagError::Prompt(format!(
                    "unmatched `}}` in template `{}`",
                    template
                )))
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}
