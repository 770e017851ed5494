pub(crate) mod http_errors;
pub mod ollama_cli;
pub mod openai_compat;
