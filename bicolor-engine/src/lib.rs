pub mod backtest;
pub mod config;
pub mod constraints;
pub mod engine;
pub mod ensemble;
pub mod error;
pub mod generator;
pub mod models;
pub mod recommend;
pub mod reconcile;
pub mod sampler;
pub mod strategy;

pub use config::EngineConfig;
pub use constraints::PredictOptions;
pub use engine::{Engine, DISCLAIMER};
pub use error::EngineError;
pub use strategy::Strategy;
