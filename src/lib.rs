//! Affordability scoring and AI-assisted vehicle recommendation workflows
//! for an auto-financing onboarding product.
//!
//! The crate exposes four workflow modules behind a thin HTTP/CLI front end
//! (see `src/main.rs`): composite affordability scoring, loan/lease payment
//! math, county sales-tax lookup through a generative text model, and the
//! catalog ranking client with its bounded retry loop.

pub mod config;
pub mod error;
pub mod gemini;
pub mod telemetry;
pub mod workflows;
