pub mod config;
pub mod controller;
pub mod domain;
pub mod error;
pub mod indices;
pub mod metrics;
pub mod output;
pub mod provider;
pub mod range;
pub mod series;
