/// OpenAPI documentation generation.
pub mod documentation;
/// Game flow: turns, scoring, timer controls, settings and roster.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Finished game records.
pub mod history_service;
/// Offline question templates.
pub mod question_templates;
/// Question cache and generation.
pub mod question_service;
/// User preferences, completion settings and token usage.
pub mod settings_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage backend supervision and degraded mode.
pub mod storage_supervisor;
/// Question countdown.
pub mod timer_service;

#[cfg(test)]
mod test_support;
