//! Deterministic resource naming.
//!
//! Every name is a pure function of `(project, environment, name)`.
//! Identical inputs always yield identical identifiers across process
//! runs — this is the idempotency anchor for the whole system. Distinct
//! logical resources never share a name because every kind carries its
//! own suffix by construction.

use strato_model::DeployConfig;

/// Lower-dashed form: `"OrdersSvc"` → `"orders-svc"`, `"orders_svc"` →
/// `"orders-svc"`.
pub fn dasherize(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_dash = true;
    for ch in name.chars() {
        if ch == '_' || ch == '-' || ch == ' ' {
            if !prev_dash {
                out.push('-');
                prev_dash = true;
            }
        } else if ch.is_ascii_uppercase() {
            if !prev_dash {
                out.push('-');
            }
            out.push(ch.to_ascii_lowercase());
            prev_dash = false;
        } else {
            out.push(ch);
            prev_dash = false;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// Pascal form: `"orders-svc"` → `"OrdersSvc"`, `"billing"` → `"Billing"`.
pub fn pascal_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = true;
    for ch in name.chars() {
        if ch == '_' || ch == '-' || ch == ' ' || ch == '.' {
            upper_next = true;
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Name factory for one deployment target.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceNames {
    pub project: String,
    pub environment: String,
    pub region: String,
    pub account_id: String,
}

impl ResourceNames {
    pub fn new(
        project: impl Into<String>,
        environment: impl Into<String>,
        region: impl Into<String>,
        account_id: impl Into<String>,
    ) -> Self {
        Self {
            project: project.into(),
            environment: environment.into(),
            region: region.into(),
            account_id: account_id.into(),
        }
    }

    pub fn from_config(config: &DeployConfig, environment: &str) -> Self {
        Self::new(
            config.project.clone(),
            environment,
            config.region.clone(),
            config.account_id.clone(),
        )
    }

    /// `"acme-staging"` — the dashed project/environment prefix.
    pub fn prefix(&self) -> String {
        format!("{}-{}", dasherize(&self.project), dasherize(&self.environment))
    }

    /// `"AcmeStaging"` — the Pascal project/environment prefix used in
    /// logical ids and physical compute names.
    pub fn pascal_prefix(&self) -> String {
        format!(
            "{}{}",
            pascal_case(&self.project),
            pascal_case(&self.environment)
        )
    }

    /// Stack name: `"acme-staging"` for the project stack,
    /// `"acme-staging-billing"` for a context stack. Stable across runs,
    /// which is what makes create-vs-update reconciliation idempotent.
    pub fn stack_name(&self, context: Option<&str>) -> String {
        match context {
            Some(ctx) => format!("{}-{}", self.prefix(), dasherize(ctx)),
            None => self.prefix(),
        }
    }

    /// Pascal compound for a service, e.g. `"AcmeStagingOrdersSvc"`.
    pub fn service_name(&self, service: &str) -> String {
        format!("{}{}", self.pascal_prefix(), pascal_case(service))
    }

    /// Physical name of the gateway-triggered endpoint.
    pub fn sync_function_name(&self, service: &str) -> String {
        format!("{}Sync", self.service_name(service))
    }

    /// Physical name of the queue-triggered endpoint.
    pub fn async_function_name(&self, service: &str) -> String {
        format!("{}Async", self.service_name(service))
    }

    /// URL path segment a context is routed under.
    pub fn route_path(&self, context: &str) -> String {
        dasherize(context)
    }

    pub fn queue_name(&self, context: &str) -> String {
        format!("{}-{}-queue", self.prefix(), dasherize(context))
    }

    pub fn dlq_name(&self, context: &str) -> String {
        format!("{}-dlq", self.queue_name(context))
    }

    /// The one event topic every context owns.
    pub fn topic_name(&self, context: &str) -> String {
        format!("{}-{}-events", self.prefix(), dasherize(context))
    }

    pub fn alert_topic_name(&self, context: &str) -> String {
        format!("{}-{}-alerts", self.prefix(), dasherize(context))
    }

    pub fn table_name(&self, context: &str) -> String {
        format!("{}-{}-documents", self.prefix(), dasherize(context))
    }

    /// ARN of a context's event topic, used for queue policies,
    /// subscription wiring and foreign-topic discovery.
    pub fn topic_arn(&self, context: &str) -> String {
        format!(
            "arn:aws:sns:{}:{}:{}",
            self.region,
            self.account_id,
            self.topic_name(context)
        )
    }

    /// Display name of the gateway API.
    pub fn gateway_display_name(&self) -> String {
        format!(
            "{} {} API",
            pascal_case(&self.project),
            pascal_case(&self.environment)
        )
    }

    /// Cross-stack export name under which the project stack publishes
    /// the gateway's identity. Service stacks import it by reference so
    /// they always bind to the current gateway even if it is recreated.
    pub fn gateway_export(&self) -> String {
        format!("{}GatewayId", self.pascal_prefix())
    }

    /// Object-storage prefix a service's code artifacts live under.
    pub fn code_prefix(&self, service: &str) -> String {
        format!("code/{}", dasherize(service))
    }

    /// Artifact key embedding an ISO-8601 timestamp: distinct and
    /// sortable per deployment.
    pub fn code_key(&self, service: &str, timestamp: &str) -> String {
        format!("{}/{}.zip", self.code_prefix(service), timestamp)
    }

    /// Object-storage key the rendered template for a stack is published
    /// under.
    pub fn template_key(&self, context: Option<&str>) -> String {
        format!("templates/{}.json", self.stack_name(context))
    }

    // ── Logical ids ────────────────────────────────────────────────────

    pub fn sync_function_id(&self, service: &str) -> String {
        format!("{}Sync", pascal_case(service))
    }

    pub fn async_function_id(&self, service: &str) -> String {
        format!("{}Async", pascal_case(service))
    }

    pub fn role_id(&self, service: &str) -> String {
        format!("{}ExecutionRole", pascal_case(service))
    }

    pub fn queue_id(&self, context: &str) -> String {
        format!("{}Queue", pascal_case(context))
    }

    pub fn dlq_id(&self, context: &str) -> String {
        format!("{}QueueDlq", pascal_case(context))
    }

    pub fn topic_id(&self, context: &str) -> String {
        format!("{}Topic", pascal_case(context))
    }

    pub fn alert_topic_id(&self, context: &str) -> String {
        format!("{}AlertTopic", pascal_case(context))
    }

    pub fn table_id(&self, context: &str) -> String {
        format!("{}Documents", pascal_case(context))
    }

    pub fn integration_id(&self, context: &str) -> String {
        format!("{}Integration", pascal_case(context))
    }

    pub fn route_id(&self, context: &str) -> String {
        format!("{}Route", pascal_case(context))
    }

    /// Subscription logical id. Same-context fan-in omits the source;
    /// cross-context wiring carries both ends.
    pub fn subscription_id(&self, context: &str, source: Option<&str>) -> String {
        match source {
            Some(src) => format!(
                "{}{}Subscription",
                pascal_case(context),
                pascal_case(src)
            ),
            None => format!("{}Subscription", pascal_case(context)),
        }
    }

    pub fn timer_rule_id(&self, handler: &str) -> String {
        format!("{}TimerRule", pascal_case(handler))
    }

    pub fn timer_permission_id(&self, handler: &str) -> String {
        format!("{}TimerPermission", pascal_case(handler))
    }
}
