//! # hud-core
//!
//! Shared sampler plumbing for gpuhud.
//!
//! This crate provides the two pieces every sampler is built on:
//!
//! - [`SnapshotCache`]: a single-slot, concurrency-safe holder for the most
//!   recent snapshot produced by a poll cycle
//! - [`Sampler`] and [`spawn_sampler`]: the fixed-interval background loop
//!   that drives a sampler without ever overlapping its poll cycles
//!
//! Samplers own their cache and expose `latest()`; readers (REST handlers,
//! the push stream) only ever clone an `Arc` out of the slot.

pub mod sampler;
pub mod snapshot;

pub use sampler::{spawn_sampler, Sampler, SamplerHandle};
pub use snapshot::SnapshotCache;
