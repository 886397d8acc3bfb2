//! The renderer boundary.
//!
//! Turning a [`Template`] into the wire-format document is a separate
//! concern from building it; the orchestrator only depends on this trait.
//! The in-tree [`JsonRenderer`] is the default implementation and is
//! deterministic: every map in the model is ordered, so identical
//! templates produce byte-identical documents.

use crate::document::Template;
use crate::error::TemplateResult;

/// Renders templates to the control plane's wire format.
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &Template) -> TemplateResult<String>;

    /// Name of this renderer for logging.
    fn name(&self) -> &str;
}

/// Deterministic JSON renderer.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonRenderer;

impl TemplateRenderer for JsonRenderer {
    fn render(&self, template: &Template) -> TemplateResult<String> {
        Ok(serde_json::to_string(template)?)
    }

    fn name(&self) -> &str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Parameter;
    use crate::resource::Resource;
    use crate::value::Value;

    fn sample_template() -> Template {
        let mut t = Template::described("sample");
        t.add_parameter("MemorySize", Parameter::number(3008));
        t.add_resource(
            "OrdersTopic",
            Resource::new("Service::Topic").prop("TopicName", "acme-staging-orders"),
        );
        t.add_resource(
            "OrdersQueue",
            Resource::new("Service::Queue")
                .prop("QueueName", "acme-staging-orders")
                .prop("RedrivePolicy", Value::map([
                    ("deadLetterTargetArn".to_string(), Value::get_att("OrdersQueueDlq", "Arn")),
                    ("maxReceiveCount".to_string(), Value::from(1000i64)),
                ])),
        );
        t
    }

    #[test]
    fn rendering_is_deterministic() {
        let renderer = JsonRenderer;
        let a = renderer.render(&sample_template()).unwrap();
        let b = renderer.render(&sample_template()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rendering_is_insertion_order_independent() {
        let renderer = JsonRenderer;

        let mut forward = Template::new();
        forward.add_resource("A", Resource::new("Service::Topic"));
        forward.add_resource("B", Resource::new("Service::Queue"));

        let mut reverse = Template::new();
        reverse.add_resource("B", Resource::new("Service::Queue"));
        reverse.add_resource("A", Resource::new("Service::Topic"));

        assert_eq!(
            renderer.render(&forward).unwrap(),
            renderer.render(&reverse).unwrap()
        );
    }

    #[test]
    fn rendered_document_carries_format_version() {
        let doc = JsonRenderer.render(&sample_template()).unwrap();
        assert!(doc.contains(r#""AWSTemplateFormatVersion":"2010-09-09""#));
    }
}
