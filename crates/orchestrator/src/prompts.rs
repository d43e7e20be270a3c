//! Prompt construction for the two model round-trips.
//!
//! The intent prompt constrains the model to the registered tool names and a
//! strict two-field JSON reply. The synthesis prompts carry a fixed assistant
//! persona; the post-processing variant additionally carries the tool outcome
//! and asks for a reply tailored to the user's request, not a raw dump.

use opsrelay_core::intent::ReplyContext;
use opsrelay_core::model::PromptMessage;
use opsrelay_core::tool::SchemaRegistry;

const PERSONA: &str = "You are a helpful assistant for a cloud release-management service. \
You help users inspect and manage their deployment environments. Be concise and helpful.";

/// Build the intent-extraction prompt for one user message.
pub fn intent_messages(registry: &SchemaRegistry, user_text: &str) -> Vec<PromptMessage> {
    let mut catalog = String::new();
    for descriptor in registry.descriptors() {
        catalog.push_str(&format!("- {}\n", descriptor.name));
        for param in &descriptor.required_params {
            let description = descriptor
                .descriptions
                .get(param)
                .map(String::as_str)
                .unwrap_or("");
            catalog.push_str(&format!("    {param} (required): {description}\n"));
        }
        for (param, description) in &descriptor.descriptions {
            if !descriptor.required_params.contains(param) {
                catalog.push_str(&format!("    {param} (optional): {description}\n"));
            }
        }
    }

    let system = format!(
        "You decide whether a user message asks to invoke one of these tools:\n\
         {catalog}\n\
         Reply with ONLY a JSON object with exactly two fields:\n\
         {{\"tool\": <tool name or null>, \"params\": <object of parameter values>}}\n\
         Use null for \"tool\" when the message is not a tool request. \
         Do not add any other text."
    );

    vec![PromptMessage::system(system), PromptMessage::user(user_text)]
}

/// Build the direct-mode synthesis prompt (no tool was used).
pub fn direct_messages(user_text: &str) -> Vec<PromptMessage> {
    vec![
        PromptMessage::system(PERSONA),
        PromptMessage::user(user_text),
    ]
}

/// Build the post-processing synthesis prompt (a tool ran).
pub fn post_processing_messages(context: &ReplyContext) -> Vec<PromptMessage> {
    let tool = context.invoked_tool.as_deref().unwrap_or_default();
    let result = context
        .tool_result
        .as_ref()
        .map(|r| r.serialized())
        .unwrap_or_default();

    let system = format!(
        "{PERSONA}\n\
         The tool `{tool}` was just executed for the user's request. \
         Use its result below to answer the user's original message. \
         Summarize and explain rather than echoing raw data; if the tool \
         failed, say so plainly and suggest what to check.\n\
         Tool result: {result}"
    );

    vec![
        PromptMessage::system(system),
        PromptMessage::user(context.original_message.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsrelay_core::tool::{ToolDescriptor, ToolResult};

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.register(
            ToolDescriptor::new("create_environment")
                .required("name", "Environment name")
                .optional("description", "Free text"),
        );
        registry
    }

    #[test]
    fn intent_prompt_names_tools_and_contract() {
        let messages = intent_messages(&registry(), "create an env");
        assert_eq!(messages.len(), 2);
        let system = &messages[0].content;
        assert!(system.contains("create_environment"));
        assert!(system.contains("name (required)"));
        assert!(system.contains("description (optional)"));
        assert!(system.contains(r#"{"tool":"#));
        assert_eq!(messages[1].content, "create an env");
    }

    #[test]
    fn post_processing_prompt_carries_serialized_result() {
        let context = ReplyContext::after_tool(
            "list envs",
            "get_environments",
            ToolResult::failure("backend down"),
        );
        let messages = post_processing_messages(&context);
        assert!(messages[0].content.contains("get_environments"));
        assert!(messages[0].content.contains("backend down"));
        assert_eq!(messages[1].content, "list envs");
    }
}
