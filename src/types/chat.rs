//! Chat completion types.

use serde::{Deserialize, Serialize};

use super::common::{FinishReason, Role, Usage};
use super::tools::{Tool, ToolCall, ToolChoice, ToolChoiceOption};

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model ID to use.
    pub model_id: String,
    /// Project to scope the request to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Deployment space to scope the request to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,
    /// Messages in the conversation.
    pub messages: Vec<Message>,
    /// Available tools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
    /// Tool choice mode (auto/required/none).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice_option: Option<ToolChoiceOption>,
    /// Forces one specific tool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Top-p (nucleus) sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Maximum tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Overall time limit in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u64>,
    /// Stop sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

impl ChatRequest {
    /// Creates a new chat request builder.
    pub fn builder() -> ChatRequestBuilder {
        ChatRequestBuilder::new()
    }

    /// Creates a simple request with model and messages.
    pub fn new(model_id: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model_id: model_id.into(),
            project_id: None,
            space_id: None,
            messages,
            tools: None,
            tool_choice_option: None,
            tool_choice: None,
            temperature: None,
            top_p: None,
            max_tokens: None,
            time_limit: None,
            stop: None,
        }
    }

    /// Returns true when the request forces the model to produce tool calls.
    pub fn requires_tool_call(&self) -> bool {
        matches!(self.tool_choice_option, Some(ToolChoiceOption::Required))
            || self.tool_choice.is_some()
    }
}

/// Builder for chat requests.
#[derive(Default)]
pub struct ChatRequestBuilder {
    model_id: Option<String>,
    project_id: Option<String>,
    space_id: Option<String>,
    messages: Vec<Message>,
    tools: Option<Vec<Tool>>,
    tool_choice_option: Option<ToolChoiceOption>,
    tool_choice: Option<ToolChoice>,
    temperature: Option<f64>,
    top_p: Option<f64>,
    max_tokens: Option<u32>,
    time_limit: Option<u64>,
    stop: Option<Vec<String>>,
}

impl ChatRequestBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model.
    pub fn model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    /// Sets the project id.
    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Sets the space id.
    pub fn space_id(mut self, space_id: impl Into<String>) -> Self {
        self.space_id = Some(space_id.into());
        self
    }

    /// Sets the messages.
    pub fn messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self
    }

    /// Adds a message.
    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Sets tools.
    pub fn tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// Sets the tool choice mode.
    pub fn tool_choice_option(mut self, option: ToolChoiceOption) -> Self {
        self.tool_choice_option = Some(option);
        self
    }

    /// Forces one specific tool.
    pub fn tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    /// Sets the temperature.
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets top_p.
    pub fn top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Sets max_tokens.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the time limit in milliseconds.
    pub fn time_limit(mut self, time_limit: u64) -> Self {
        self.time_limit = Some(time_limit);
        self
    }

    /// Sets stop sequences.
    pub fn stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Builds the request.
    pub fn build(self) -> ChatRequest {
        ChatRequest {
            model_id: self
                .model_id
                .unwrap_or_else(|| "ibm/granite-3-8b-instruct".to_string()),
            project_id: self.project_id,
            space_id: self.space_id,
            messages: self.messages,
            tools: self.tools,
            tool_choice_option: self.tool_choice_option,
            tool_choice: self.tool_choice,
            temperature: self.temperature,
            top_p: self.top_p,
            max_tokens: self.max_tokens,
            time_limit: self.time_limit,
            stop: self.stop,
        }
    }
}

/// A message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    /// System message.
    System(SystemMessage),
    /// User message.
    User(UserMessage),
    /// Assistant message.
    Assistant(AssistantMessage),
    /// Tool result message.
    Tool(ToolMessage),
}

impl Message {
    /// Creates a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Message::System(SystemMessage {
            content: content.into(),
        })
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message::User(UserMessage {
            content: content.into(),
        })
    }

    /// Creates an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant(AssistantMessage {
            content: Some(content.into()),
            thinking: None,
            tool_calls: None,
        })
    }

    /// Creates a tool result message.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Message::Tool(ToolMessage {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        })
    }
}

/// System message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMessage {
    /// Message content.
    pub content: String,
}

/// User message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMessage {
    /// Message content.
    pub content: String,
}

/// Assistant message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Message content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Model reasoning text, when the model emits it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
    /// Tool calls made by the assistant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

/// Tool result message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolMessage {
    /// Tool call ID this message is responding to.
    pub tool_call_id: String,
    /// Tool result content.
    pub content: String,
}

/// Chat completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Response ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Model used.
    pub model_id: String,
    /// Creation timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    /// Completion choices.
    pub choices: Vec<ChatChoice>,
    /// Token usage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// A completion choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatChoice {
    /// Choice index.
    pub index: u32,
    /// The assistant's message.
    pub message: AssistantMessage,
    /// Reason for stopping.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

/// Streaming chunk for chat completions.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChunk {
    /// Chunk ID.
    pub id: Option<String>,
    /// Model used.
    pub model_id: Option<String>,
    /// Creation timestamp.
    pub created: Option<i64>,
    /// Streaming choices (may be empty on keep-alive chunks).
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    /// Cumulative usage, when reported.
    pub usage: Option<Usage>,
}

/// A streaming choice.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamChoice {
    /// Choice index.
    pub index: u32,
    /// Content delta.
    #[serde(default)]
    pub delta: ContentDelta,
    /// Finish reason (in the final chunk).
    pub finish_reason: Option<FinishReason>,
}

/// Content delta in streaming.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentDelta {
    /// Role (in first chunk).
    pub role: Option<Role>,
    /// Content text delta.
    pub content: Option<String>,
    /// Reasoning text delta.
    pub thinking: Option<String>,
    /// Tool call fragments.
    pub tool_calls: Option<Vec<ToolCallDelta>>,
}

/// One incremental slice of a tool call, keyed by index.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallDelta {
    /// Index of the tool call this slice belongs to.
    pub index: u32,
    /// Tool call ID (first slice only).
    pub id: Option<String>,
    /// Tool type.
    #[serde(rename = "type")]
    pub tool_type: Option<String>,
    /// Function name/argument slices.
    pub function: Option<FunctionDelta>,
}

/// Incremental function name and argument text.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionDelta {
    /// Function name slice.
    pub name: Option<String>,
    /// Argument text slice.
    pub arguments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let system = Message::system("You are helpful.");
        let user = Message::user("Hello!");
        let assistant = Message::assistant("Hi there!");

        assert!(matches!(system, Message::System(_)));
        assert!(matches!(user, Message::User(_)));
        assert!(matches!(assistant, Message::Assistant(_)));
    }

    #[test]
    fn test_request_builder() {
        let request = ChatRequest::builder()
            .model_id("ibm/granite-3-8b-instruct")
            .project_id("proj-1")
            .message(Message::user("Hello"))
            .temperature(0.7)
            .max_tokens(100)
            .build();

        assert_eq!(request.model_id, "ibm/granite-3-8b-instruct");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.max_tokens, Some(100));
    }

    #[test]
    fn test_requires_tool_call() {
        let auto = ChatRequest::builder()
            .tool_choice_option(ToolChoiceOption::Auto)
            .build();
        assert!(!auto.requires_tool_call());

        let required = ChatRequest::builder()
            .tool_choice_option(ToolChoiceOption::Required)
            .build();
        assert!(required.requires_tool_call());

        let forced = ChatRequest::builder()
            .tool_choice(ToolChoice::function("get_weather"))
            .build();
        assert!(forced.requires_tool_call());
    }

    #[test]
    fn test_chunk_deserialization() {
        let json = r#"{
            "id": "chat-1",
            "model_id": "ibm/granite-3-8b-instruct",
            "choices": [{
                "index": 0,
                "delta": {"content": "Hel"},
                "finish_reason": null
            }]
        }"#;

        let chunk: ChatChunk = serde_json::from_str(json).unwrap();
        assert_eq!(chunk.choices.len(), 1);
        assert_eq!(chunk.choices[0].delta.content.as_deref(), Some("Hel"));
        assert!(chunk.choices[0].finish_reason.is_none());
    }

    #[test]
    fn test_tool_call_delta_deserialization() {
        let json = r#"{
            "choices": [{
                "index": 0,
                "delta": {
                    "tool_calls": [{
                        "index": 0,
                        "id": "tc-1",
                        "type": "function",
                        "function": {"name": "get_weather", "arguments": "{\"ci"}
                    }]
                }
            }]
        }"#;

        let chunk: ChatChunk = serde_json::from_str(json).unwrap();
        let deltas = chunk.choices[0].delta.tool_calls.as_ref().unwrap();
        assert_eq!(deltas[0].index, 0);
        assert_eq!(deltas[0].id.as_deref(), Some("tc-1"));
        assert_eq!(
            deltas[0].function.as_ref().unwrap().arguments.as_deref(),
            Some("{\"ci")
        );
    }
}
