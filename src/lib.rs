//! Platy - declarative resource-graph engine for production app deployments
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  ast/       YAML → Rust types (Stack, ResourceDecl)          │
//! │  graph/     Resource DAG (GraphBuilder, ResourceGraph)       │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  engine/    DAG execution (Engine, StateStore, deploy)       │
//! │  binding/   ${node.path} reference wiring                    │
//! │  outputs    Named output export and collection               │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    INFRASTRUCTURE LAYER                      │
//! │  provider/  Resource materialization (local, mock)           │
//! │  event/     Event sourcing (EventLog, TraceWriter)           │
//! │  util/      Interner, output paths, constants                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`ast`] | YAML parsing → `Stack`, `ResourceDecl` |
//! | [`graph`] | Dependency DAG with eager duplicate/cycle checks |
//! | [`engine`] | Ready-set execution with tokio concurrency |
//! | [`binding`] | `${node.path}` reference extraction and resolution |
//! | [`outputs`] | Named output references, post-run collection |
//! | [`provider`] | Resource materialization abstraction |
//! | [`event`] | Event sourcing and NDJSON traces |
//! | [`util`] | String interning, output path parser |
//! | [`error`] | Error types with codes and fix suggestions |

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL - declarations and the resource DAG
// ═══════════════════════════════════════════════════════════════
pub mod ast;
pub mod graph;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER - execution logic
// ═══════════════════════════════════════════════════════════════
pub mod binding;
pub mod engine;
pub mod outputs;

// ═══════════════════════════════════════════════════════════════
// INFRASTRUCTURE LAYER - providers, events
// ═══════════════════════════════════════════════════════════════
pub mod event;
pub mod provider;
pub mod util;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - error handling, configuration
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

// Error types
pub use error::{FixSuggestion, PlatyError};

// Config types
pub use config::PlatyConfig;

// AST types (Domain Model)
pub use ast::{ResourceDecl, Stack};

// Graph types
pub use graph::{GraphBuilder, ResourceGraph, ResourceKind, ResourceNode};

// Engine types (Application Layer)
pub use engine::{
    declare, deploy, Deployment, DeploymentReport, Engine, NodeRecord, NodeStatus, StackContext,
    StateStore,
};

// Output types
pub use outputs::{Exporter, OutputRef};

// Provider types
pub use provider::{create_provider, LocalProvider, MockProvider, Provider, ResourceRequest};

// Event types
pub use event::{
    calculate_stack_hash, generate_generation_id, list_traces, Event, EventKind, EventLog,
    TraceInfo, TraceWriter,
};
