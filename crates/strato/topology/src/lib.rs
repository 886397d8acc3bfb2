//! # strato-topology
//!
//! Pure transformation from the declarative application model to the
//! resource graph of one context: compute endpoints, routing, IAM role,
//! scheduled triggers, the queue/topic/subscription fabric, and the
//! document table. Nothing here touches the network; the deploy crate
//! renders and reconciles what this crate builds.
//!
//! Determinism is the contract. Resource names are pure functions of
//! `(project, environment, name)` — names, not stored ids, are the join
//! key between desired and existing resources — and repeated builds from
//! an unchanged model yield identical templates.

pub mod builder;
pub mod naming;
pub mod project;
pub mod subscriptions;

pub use builder::{ResourceTopology, TopologyBuilder};
pub use naming::ResourceNames;
pub use project::{build_project_template, build_topic_template};
pub use subscriptions::{resolve_subscriptions, SubscriptionRequest};
