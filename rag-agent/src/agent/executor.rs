// Agent executor: lets the model call tools until it produces a final answer

use crate::error::{RagError, Result};
use crate::llm::ChatModel;
use crate::models::{AgentResponse, AgentStep, ChatMessage, ToolCall};
use crate::prompt::ChatPromptTemplate;
use crate::tools::{ToolOutput, ToolRegistry};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const MAX_ITERATIONS_OUTPUT: &str = "Agent stopped due to max iterations.";

pub struct AgentExecutor {
    llm: Arc<dyn ChatModel>,
    tools: ToolRegistry,
    prompt: ChatPromptTemplate,
    max_iterations: usize,
    verbose: bool,
}

impl AgentExecutor {
    pub fn new(llm: Arc<dyn ChatModel>, tools: ToolRegistry, prompt: ChatPromptTemplate) -> Self {
        Self {
            llm,
            tools,
            prompt,
            max_iterations: 15,
            verbose: false,
        }
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub async fn invoke(&self, input: &str) -> Result<AgentResponse> {
        self.invoke_with_history(input, &[]).await
    }

    #[instrument(skip(self, chat_history), fields(tools = ?self.tools.names()))]
    pub async fn invoke_with_history(
        &self,
        input: &str,
        chat_history: &[ChatMessage],
    ) -> Result<AgentResponse> {
        if self.verbose {
            info!("> Entering new AgentExecutor chain...");
        }

        let definitions = self.tools.definitions();
        let mut scratchpad: Vec<ChatMessage> = vec![];
        let mut steps: Vec<AgentStep> = vec![];

        for _ in 0..self.max_iterations {
            let messages = self.prompt.format(input, chat_history, &scratchpad)?;
            let reply = self.llm.chat(&messages, &definitions).await?;

            let tool_calls = match &reply {
                ChatMessage::Assistant { tool_calls, .. } if !tool_calls.is_empty() => {
                    tool_calls.clone()
                }
                ChatMessage::Assistant { content, .. } => {
                    let output = content.clone().unwrap_or_default();
                    if self.verbose {
                        info!("{}", output);
                        info!("> Finished chain.");
                    }
                    return Ok(AgentResponse {
                        input: input.to_string(),
                        output,
                        intermediate_steps: steps,
                    });
                }
                other => {
                    return Err(RagError::Llm(format!(
                        "expected an assistant message, got {:?}",
                        other
                    )))
                }
            };

            scratchpad.push(reply);
            for call in tool_calls {
                let step = self.run_tool(&call).await?;
                scratchpad.push(ChatMessage::tool(&call.id, &step.observation));
                steps.push(step);
            }
        }

        warn!("Stopping after {} iterations", self.max_iterations);

        Ok(AgentResponse {
            input: input.to_string(),
            output: MAX_ITERATIONS_OUTPUT.to_string(),
            intermediate_steps: steps,
        })
    }

    async fn run_tool(&self, call: &ToolCall) -> Result<AgentStep> {
        let name = &call.function.name;
        let tool_input = parse_arguments(&call.function.arguments)?;

        if self.verbose {
            info!("Invoking: `{}` with `{}`", name, tool_input);
        }

        let output = match self.tools.get(name) {
            Some(tool) => tool.call(tool_input.clone()).await?,
            None => ToolOutput {
                content: format!(
                    "{} is not a valid tool, try one of [{}].",
                    name,
                    self.tools.names().join(", ")
                ),
                artifact: Value::Null,
            },
        };

        if self.verbose {
            info!("{}", output.content);
        }

        Ok(AgentStep {
            tool: name.clone(),
            tool_input,
            tool_call_id: call.id.clone(),
            observation: output.content,
            artifact: output.artifact,
        })
    }
}

/// Tool arguments are a JSON object encoded as a string; an empty string means no arguments.
fn parse_arguments(raw: &str) -> Result<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(raw)
        .map_err(|e| RagError::Llm(format!("tool arguments are not valid JSON ({}): {}", e, raw)))
}
