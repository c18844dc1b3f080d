//! Services for the analysis pipeline

pub mod batch_orchestrator;
pub mod ollama_client;
pub mod prompt_builder;
pub mod recovery_parser;
pub mod result_merger;
pub mod text_sanitizer;

pub use batch_orchestrator::{partition, AnalysisRun, Batch, BatchOrchestrator};
pub use ollama_client::OllamaClient;
pub use prompt_builder::build_request;
pub use recovery_parser::{ParseOutcome, RecoveryParser, RESULTS_KEY};
pub use result_merger::{merge, MergeReport};
pub use text_sanitizer::{sanitize, TextSanitizer};
