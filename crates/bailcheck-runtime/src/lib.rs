//! # bailcheck-runtime
//!
//! Case management and the legal chat assistant around `bailcheck-core`.
//!
//! ## Important
//!
//! Bail evaluation is fully deterministic and never calls an LLM. The chat
//! assistant in this crate is a separate, optional surface for general
//! questions about Indian criminal law; the Gemini backend is behind the
//! `gemini` feature.
//!
//! ## Example
//!
//! ```rust,ignore
//! use bailcheck_runtime::{CaseService, InMemoryCaseStore, RuntimeConfig};
//!
//! let config = RuntimeConfig::from_yaml_file("bailcheck.yaml")?;
//! let service = CaseService::from_config(&config, Arc::new(InMemoryCaseStore::new()))?;
//!
//! let id = service.register_case("officer-1", intake).await?;
//! let assessment = service.analyze_case("officer-1", &id).await?;
//! ```

pub mod chat;
pub mod config;
pub mod prompts;
pub mod providers;
pub mod resilience;
pub mod service;
pub mod store;

pub use chat::{ChatAssistant, ChatError, ChatReply};
pub use config::{ChatConfig, ConfigError, RuntimeConfig};
pub use providers::{ChatMessage, LlmProvider, ProviderError, ProviderRegistry};
pub use service::{CaseReport, CaseService, DashboardStats, ServiceError};
pub use store::{AuditAction, AuditEntry, CaseStore, InMemoryCaseStore, StoreError};
