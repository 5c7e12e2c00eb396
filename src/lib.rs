//! Website audit service: page extraction plus three generation stages
//! (audit, redesign, roadmap) whose output is coerced onto fixed result types.

pub mod config;
pub mod credential;
pub mod extract;
pub mod llm;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
pub mod rate_limit;
pub mod routes;
