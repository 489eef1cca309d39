//! Minicrew is a small toolkit for running crews of LLM agents.
//! It provides tool-calling agents over an OpenAI-compatible chat API, strictly
//! sequential workflows and token-budget enforcement between runs.
pub mod agent;
pub mod budget;
pub mod config;
pub mod llm;
pub mod persistence;
pub mod pipeline;
pub mod sequential_workflow;
pub mod task;
pub mod tool;

mod conversation;
