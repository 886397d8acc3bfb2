//! Subscription resolution.
//!
//! Flattens a context's event-listener registrations into individual
//! `(event_name, source_context)` requests and groups them by source
//! context. The group matching the context itself becomes the local
//! fan-in subscription; every other group becomes a cross-context
//! subscription, whose topic the orchestrator ensures exists before the
//! stack is reconciled.

use std::collections::BTreeMap;

use strato_model::{Context, ModelResult};

/// One requested event delivery: this event, from that context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionRequest {
    pub event_name: String,
    pub source_context: String,
}

/// Resolve a context's listener registrations into requests grouped by
/// source context.
///
/// Groups with zero entries never appear — the grouping drops them
/// naturally, so no empty filter-policy subscription is ever emitted.
pub fn resolve_subscriptions(
    context: &Context,
) -> ModelResult<BTreeMap<String, Vec<SubscriptionRequest>>> {
    let mut groups: BTreeMap<String, Vec<SubscriptionRequest>> = BTreeMap::new();
    for events in context.event_listeners.values() {
        for event_ref in events {
            let (source_context, event_name) = event_ref.resolve()?;
            groups
                .entry(source_context.clone())
                .or_default()
                .push(SubscriptionRequest {
                    event_name,
                    source_context,
                });
        }
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strato_model::EventRef;

    #[test]
    fn no_listeners_no_groups() {
        let ctx = Context::new("Orders");
        assert!(resolve_subscriptions(&ctx).unwrap().is_empty());
    }

    #[test]
    fn groups_by_source_context() {
        let ctx = Context::new("Billing")
            .with_listener(
                "billing-svc",
                vec![
                    EventRef::Qualified("Orders.OrderPlaced".into()),
                    EventRef::Qualified("Orders.OrderCancelled".into()),
                    EventRef::Qualified("Billing.InvoiceRequested".into()),
                ],
            );

        let groups = resolve_subscriptions(&ctx).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups["Orders"].len(), 2);
        assert_eq!(groups["Billing"].len(), 1);
        assert_eq!(groups["Orders"][0].event_name, "OrderPlaced");
    }

    #[test]
    fn typed_refs_mix_with_qualified() {
        let ctx = Context::new("Billing").with_listener(
            "billing-svc",
            vec![
                EventRef::Typed {
                    context: "Orders".into(),
                    name: "OrderPlaced".into(),
                },
                EventRef::Qualified("Orders.OrderShipped".into()),
            ],
        );
        let groups = resolve_subscriptions(&ctx).unwrap();
        let names: Vec<_> = groups["Orders"].iter().map(|r| r.event_name.as_str()).collect();
        assert_eq!(names, vec!["OrderPlaced", "OrderShipped"]);
    }

    #[test]
    fn bad_ref_propagates() {
        let ctx = Context::new("Billing")
            .with_listener("billing-svc", vec![EventRef::Qualified("Nonsense".into())]);
        assert!(resolve_subscriptions(&ctx).is_err());
    }
}
