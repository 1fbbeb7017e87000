//! # Arena Server Library
//!
//! Coordinates short timed multiplayer sessions played on networked
//! buzzer devices:
//! - RESTful HTTP API for the operator console
//! - WebSocket push surface for read-only observers
//! - Redis pub/sub ingestion of device telemetry
//! - PostgreSQL for session and device persistence
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Session state machine, scores, clock, liveness
//! - **Application Layer**: Telemetry decoding, aggregation, and the coordinator
//! - **Infrastructure Layer**: Database, telemetry transport, metrics
//! - **Presentation Layer**: HTTP handlers and the observer gateway
//!
//! ## Module Structure
//!
//! ```text
//! arena_server/
//! +-- config/        Configuration management
//! +-- domain/        Domain entities and repository traits
//! +-- application/   Coordinator, decoder, aggregator, DTOs
//! +-- infrastructure/ Database, ingest, and metrics implementations
//! +-- presentation/  HTTP routes and WebSocket handlers
//! +-- shared/        Common utilities (errors, validation)
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Coordination and DTOs
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP and WebSocket handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Tracing and observability
pub mod observability;
