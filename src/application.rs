//! Application layer module
//!
//! This module contains the run workflow, the batch upsert and the deal
//! board that orchestrate the domain logic over the infrastructure.

pub mod deal_board;
pub mod deal_workflow;
pub mod progress;
pub mod upsert_engine;

pub use deal_board::{DealBoard, DealFilter, DealRow};
pub use deal_workflow::{DealWorkflow, LastUpdate, RunReport};
pub use progress::ProgressChannels;
pub use upsert_engine::{UpsertEngine, UpsertSummary};
