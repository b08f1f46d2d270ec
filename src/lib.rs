// worldsim - rolling LLM-narrated world simulation
// Library exports

pub mod cli;
pub mod config;
pub mod errors;
pub mod ground_truth;
pub mod logging;
pub mod narrator;
pub mod providers;
pub mod report;
pub mod simulation;
pub mod snapshot;
