//! TraktHook Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `MediaEvent`, `EventKind`, `ProviderIds` and the webhook normalizer
//! - **Use cases** - `WebhookHandler`, `MaintenanceUseCase`
//! - **Port definitions** - `IMediaTracker`, implemented by the Trakt adapter crate
//! - **Configuration** - typed settings loaded from the environment / env file
//!
//! # Architecture
//!
//! The domain module contains pure business logic with no I/O.
//! Ports define trait interfaces that adapter crates implement.
//! Use cases orchestrate domain entities through port interfaces and turn
//! their outcomes into replies for the (external) HTTP layer.

pub mod config;
pub mod domain;
pub mod ports;
pub mod usecases;
