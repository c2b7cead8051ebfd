//! Type definitions for the watsonx.ai API.

pub mod batch;
pub mod chat;
pub mod common;
pub mod extraction;
pub mod generation;
pub mod tools;
