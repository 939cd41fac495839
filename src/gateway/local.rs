use crate::error::GatewayError;
use crate::gateway::gateway::Gateway;

const EMPTY_PROMPT_NOTE: &str = "[Please provide a prompt to enhance]";

const CHECKLIST: &[&str] = &[
    "[Enhanced by RACCO with the following improvements:]",
    "• Added specific context and constraints",
    "• Included examples for better understanding",
    "• Clarified expected output format",
    "• Added role and perspective guidance",
];

/// Offline enhancement: appends a fixed improvement checklist.
pub fn enhance_locally(prompt: &str) -> String {
    if prompt.trim().is_empty() {
        return format!("{}\n\n{}", prompt, EMPTY_PROMPT_NOTE);
    }
    format!("{}\n\n{}", prompt, CHECKLIST.join("\n"))
}

/// Last-resort strategy; never fails.
pub struct LocalHeuristic;

impl Gateway for LocalHeuristic {
    fn name(&self) -> &str {
        "local"
    }

    fn enhance(&self, text: &str) -> Result<String, GatewayError> {
        Ok(enhance_locally(text))
    }
}
