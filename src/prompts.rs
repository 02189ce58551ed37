//! Prompts - system roles and user templates for SQL generation and correction

use crate::llm::types::{ChatCompletionRequest, ChatMessage};

/// System prompt for natural-language to SQL generation
pub const GENERATION_SYSTEM_PROMPT: &str = "You are a SQL expert. Convert natural language queries to SQL. Return only the SQL query without any explanation.";

/// System prompt for correcting an incorrect SQL query
pub const CORRECTION_SYSTEM_PROMPT: &str = "You are a SQL expert. Correct the given SQL query to match the natural language requirement. Return only the corrected SQL query without any explanation.";

pub const GENERATION_TEMPERATURE: f32 = 0.1;
pub const GENERATION_MAX_TOKENS: u32 = 500;

pub const CORRECTION_TEMPERATURE: f32 = 0.1;
// Corrected queries tend to run longer than fresh ones.
pub const CORRECTION_MAX_TOKENS: u32 = 2048;

pub fn generation_prompt(nl_query: &str) -> String {
    format!(
        r#"Convert the following natural language query to SQL:
Query: {}

Generate only the SQL query without any explanation. The SQL should be compatible with PostgreSQL."#,
        nl_query
    )
}

pub fn correction_prompt(nl_query: &str, incorrect_query: &str) -> String {
    format!(
        r#"Given the following natural language query and incorrect SQL query, generate the correct SQL query:

Natural Language Query: {}
Incorrect SQL Query: {}

Generate only the correct SQL SELECT query without any explanation. The SQL should be compatible with PostgreSQL."#,
        nl_query, incorrect_query
    )
}

pub fn generation_request(model: &str, nl_query: &str) -> ChatCompletionRequest {
    ChatCompletionRequest::new(
        model,
        vec![
            ChatMessage::system(GENERATION_SYSTEM_PROMPT),
            ChatMessage::user(generation_prompt(nl_query)),
        ],
        GENERATION_TEMPERATURE,
        GENERATION_MAX_TOKENS,
    )
}

pub fn correction_request(
    model: &str,
    nl_query: &str,
    incorrect_query: &str,
) -> ChatCompletionRequest {
    ChatCompletionRequest::new(
        model,
        vec![
            ChatMessage::system(CORRECTION_SYSTEM_PROMPT),
            ChatMessage::user(correction_prompt(nl_query, incorrect_query)),
        ],
        CORRECTION_TEMPERATURE,
        CORRECTION_MAX_TOKENS,
    )
}
