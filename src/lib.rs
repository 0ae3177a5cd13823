//! Shift Scheduling with a genetic algorithm
//!
//! This library provides the domain model, the violation scorer, and a
//! genetic optimizer that assigns employees to shift slots, plus a small
//! run controller and REST surface around it.
//!
//! Fitness is `1 / (1 + weighted violations)`; a schedule with fitness 1 has
//! no violations at all.

pub mod api;
pub mod chromosome;
pub mod config;
pub mod console;
pub mod constraints;
pub mod demo_data;
pub mod domain;
pub mod dto;
pub mod error;
pub mod operators;
pub mod progress;
pub mod service;
pub mod solver;

pub use error::{Result, SchedulingError};
