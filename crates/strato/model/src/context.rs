//! Contexts, services and the declarations they own.
//!
//! A context declares what exists (entities, command handlers, event
//! subscriptions); the topology builder decides what that means in cloud
//! resources. Listener registrations are keyed by the registering service
//! name and hold event references that resolve to `(context, event)` pairs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

// ── Event references ───────────────────────────────────────────────────

/// A reference to an event owned by some context.
///
/// Either a qualified string (`"Orders.OrderPlaced"`, split on the first
/// `.`) or an already-resolved typed reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventRef {
    /// `"context.EventName"` form.
    Qualified(String),
    /// Resolved form carrying the owning context and the event name.
    Typed { context: String, name: String },
}

impl EventRef {
    /// Resolve to `(source_context, event_name)`.
    pub fn resolve(&self) -> ModelResult<(String, String)> {
        match self {
            EventRef::Qualified(s) => match s.split_once('.') {
                Some((ctx, name)) if !ctx.is_empty() && !name.is_empty() => {
                    Ok((ctx.to_string(), name.to_string()))
                }
                _ => Err(ModelError::BadEventRef(s.clone())),
            },
            EventRef::Typed { context, name } => Ok((context.clone(), name.clone())),
        }
    }
}

// ── Timers and command handlers ────────────────────────────────────────

/// A scheduled trigger declared on a command handler.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerDef {
    /// Cron expression, passed through to the schedule rule verbatim.
    pub cron: String,
    /// Restrict the timer to one deployment environment. `None` means the
    /// timer fires in every environment.
    pub environment: Option<String>,
    /// Name of the command the timer dispatches.
    pub command: String,
}

impl TimerDef {
    /// Whether the timer applies when deploying to `environment`.
    pub fn applies_to(&self, environment: &str) -> bool {
        match &self.environment {
            Some(env) => env == environment,
            None => true,
        }
    }
}

/// A command handler owned by a context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandHandlerDef {
    /// Handler name, used as the invocation target identity.
    pub name: String,
    /// Optional timer attached to the handler.
    pub timer: Option<TimerDef>,
}

impl CommandHandlerDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timer: None,
        }
    }

    pub fn with_timer(mut self, timer: TimerDef) -> Self {
        self.timer = Some(timer);
        self
    }
}

// ── Entities ───────────────────────────────────────────────────────────

/// An entity owned by a context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDef {
    pub name: String,
    /// Whether the entity is a concrete aggregate root. Only aggregate
    /// roots participate in schema migration.
    pub aggregate_root: bool,
}

impl EntityDef {
    pub fn aggregate(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aggregate_root: true,
        }
    }

    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aggregate_root: false,
        }
    }
}

// ── Context and service ────────────────────────────────────────────────

/// A bounded domain module: the unit the topology builder works from.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Context {
    pub name: String,
    pub entities: Vec<EntityDef>,
    pub command_handlers: Vec<CommandHandlerDef>,
    /// Listener registrations keyed by the registering service name.
    pub event_listeners: BTreeMap<String, Vec<EventRef>>,
    /// Context-level environment variable overrides surfaced into the
    /// deployed compute endpoints.
    pub environment_overrides: BTreeMap<String, String>,
}

impl Context {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_entity(mut self, entity: EntityDef) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_handler(mut self, handler: CommandHandlerDef) -> Self {
        self.command_handlers.push(handler);
        self
    }

    pub fn with_listener(mut self, service: impl Into<String>, events: Vec<EventRef>) -> Self {
        self.event_listeners.insert(service.into(), events);
        self
    }

    /// Aggregate-root entities, the only ones eligible for schema migration.
    pub fn aggregate_roots(&self) -> impl Iterator<Item = &EntityDef> {
        self.entities.iter().filter(|e| e.aggregate_root)
    }
}

/// A named deployable unit belonging to one context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    /// Name of the owning context.
    pub context: String,
}

impl Service {
    pub fn new(name: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            context: context.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_ref_resolves() {
        let r = EventRef::Qualified("Orders.OrderPlaced".into());
        assert_eq!(r.resolve().unwrap(), ("Orders".into(), "OrderPlaced".into()));
    }

    #[test]
    fn typed_ref_resolves() {
        let r = EventRef::Typed {
            context: "Billing".into(),
            name: "InvoicePaid".into(),
        };
        assert_eq!(r.resolve().unwrap(), ("Billing".into(), "InvoicePaid".into()));
    }

    #[test]
    fn bare_ref_is_rejected() {
        assert!(EventRef::Qualified("OrderPlaced".into()).resolve().is_err());
        assert!(EventRef::Qualified(".OrderPlaced".into()).resolve().is_err());
    }

    #[test]
    fn timer_environment_filter() {
        let timer = TimerDef {
            cron: "0 * * * ? *".into(),
            environment: Some("prod".into()),
            command: "Sweep".into(),
        };
        assert!(timer.applies_to("prod"));
        assert!(!timer.applies_to("staging"));

        let unrestricted = TimerDef {
            cron: "0 * * * ? *".into(),
            environment: None,
            command: "Sweep".into(),
        };
        assert!(unrestricted.applies_to("staging"));
    }

    #[test]
    fn aggregate_roots_filtered() {
        let ctx = Context::new("Orders")
            .with_entity(EntityDef::aggregate("Order"))
            .with_entity(EntityDef::plain("OrderLine"));
        let roots: Vec<_> = ctx.aggregate_roots().map(|e| e.name.as_str()).collect();
        assert_eq!(roots, vec!["Order"]);
    }
}
