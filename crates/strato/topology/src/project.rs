//! The shared project-level stack.
//!
//! Everything the service stacks depend on lives here: the deployment
//! bucket (with a lifecycle rule expiring short-lived `tmp/` objects),
//! the HTTP gateway with an auto-deploying stage, a default endpoint
//! behind the catch-all route, and the gateway-id export that service
//! stacks import by reference.

use strato_model::DeployConfig;
use strato_template::{Output, Parameter, Resource, Template, Value};

use crate::naming::ResourceNames;

/// Inline source of the default endpoint: echoes its invocation payload.
const DEFAULT_HANDLER_SOURCE: &str = "exports.handler = async (event) => event;\n";
const DEFAULT_HANDLER_RUNTIME: &str = "nodejs20.x";

/// Build the project stack template for one deployment target.
pub fn build_project_template(config: &DeployConfig, names: &ResourceNames) -> Template {
    let mut template = Template::described(format!(
        "{} shared project resources",
        names.gateway_display_name()
    ));

    let memory = template.add_parameter(
        format!("{}MemorySize", names.pascal_prefix()),
        Parameter::number(config.memory_size as i64),
    );
    let timeout = template.add_parameter(
        format!("{}GatewayTimeout", names.pascal_prefix()),
        Parameter::number(config.gateway_timeout_secs as i64),
    );

    template.add_resource(
        format!("{}Bucket", names.pascal_prefix()),
        Resource::new("AWS::S3::Bucket")
            .prop("BucketName", config.bucket.as_str())
            .prop("AccessControl", "Private")
            .prop(
                "LifecycleConfiguration",
                Value::map([(
                    "Rules".to_string(),
                    Value::List(vec![Value::map([
                        ("Prefix".to_string(), Value::str("tmp")),
                        ("Status".to_string(), Value::str("Enabled")),
                        ("ExpirationInDays".to_string(), Value::from(1u32)),
                    ])]),
                )]),
            ),
    );

    let gateway_id = template.add_resource(
        format!("{}Gateway", names.pascal_prefix()),
        Resource::new("AWS::ApiGatewayV2::Api")
            .prop("Name", names.gateway_display_name())
            .prop("ProtocolType", "HTTP"),
    );

    let role_id = template.add_resource(
        format!("{}GatewayRole", names.pascal_prefix()),
        default_endpoint_role(),
    );

    let function_id = template.add_resource(
        format!("{}DefaultFn", names.pascal_prefix()),
        Resource::new("AWS::Lambda::Function")
            .prop("FunctionName", format!("{}Default", names.pascal_prefix()))
            .prop(
                "Code",
                Value::map([("ZipFile".to_string(), Value::str(DEFAULT_HANDLER_SOURCE))]),
            )
            .prop("Handler", "index.handler")
            .prop("Runtime", DEFAULT_HANDLER_RUNTIME)
            .prop("Role", Value::get_att(&role_id, "Arn"))
            .prop("MemorySize", memory)
            .prop("Timeout", timeout),
    );

    let integration_id = template.add_resource(
        format!("{}DefaultIntegration", names.pascal_prefix()),
        Resource::new("AWS::ApiGatewayV2::Integration")
            .prop("ApiId", Value::reference(&gateway_id))
            .prop("IntegrationType", "AWS_PROXY")
            .prop("PayloadFormatVersion", "2.0")
            .prop(
                "IntegrationUri",
                Value::join(
                    "",
                    vec![
                        Value::str("arn:aws:lambda:"),
                        Value::str(&config.region),
                        Value::str(":"),
                        Value::str(&config.account_id),
                        Value::str(":function:"),
                        Value::reference(&function_id),
                    ],
                ),
            )
            .depends_on(function_id.clone()),
    );

    template.add_resource(
        format!("{}DefaultRoute", names.pascal_prefix()),
        Resource::new("AWS::ApiGatewayV2::Route")
            .prop("ApiId", Value::reference(&gateway_id))
            .prop("RouteKey", "$default")
            .prop("AuthorizationType", "NONE")
            .prop(
                "Target",
                Value::join("/", vec![
                    Value::str("integrations"),
                    Value::reference(&integration_id),
                ]),
            )
            .depends_on(integration_id),
    );

    template.add_resource(
        format!("{}Stage", names.pascal_prefix()),
        Resource::new("AWS::ApiGatewayV2::Stage")
            .prop("StageName", "api")
            .prop("ApiId", Value::reference(&gateway_id))
            .prop("AutoDeploy", true),
    );

    template.add_output(
        names.gateway_export(),
        Output::value(Value::reference(&gateway_id)).exported(names.gateway_export()),
    );

    template
}

/// A minimal single-topic stack: bootstraps a foreign context's event
/// topic so cross-context subscriptions can be wired before that context
/// is ever deployed itself. Separate stack, independent lifecycle.
pub fn build_topic_template(names: &ResourceNames, context: &str) -> Template {
    let mut template = Template::new();
    template.add_resource(
        names.topic_id(context),
        Resource::new("AWS::SNS::Topic").prop("TopicName", names.topic_name(context)),
    );
    template
}

fn default_endpoint_role() -> Resource {
    Resource::new("AWS::IAM::Role")
        .prop("Path", "/")
        .prop(
            "Policies",
            Value::List(vec![Value::map([
                ("PolicyName".to_string(), Value::str("root")),
                (
                    "PolicyDocument".to_string(),
                    Value::map([
                        ("Version".to_string(), Value::str("2012-10-17")),
                        (
                            "Statement".to_string(),
                            Value::List(vec![Value::map([
                                (
                                    "Action".to_string(),
                                    Value::List(vec![Value::str("logs:*")]),
                                ),
                                (
                                    "Resource".to_string(),
                                    Value::str("arn:aws:logs:*:*:*"),
                                ),
                                ("Effect".to_string(), Value::str("Allow")),
                            ])]),
                        ),
                    ]),
                ),
            ])]),
        )
        .prop(
            "AssumeRolePolicyDocument",
            Value::map([
                ("Version".to_string(), Value::str("2012-10-17")),
                (
                    "Statement".to_string(),
                    Value::List(vec![Value::map([
                        (
                            "Action".to_string(),
                            Value::List(vec![Value::str("sts:AssumeRole")]),
                        ),
                        ("Effect".to_string(), Value::str("Allow")),
                        (
                            "Principal".to_string(),
                            Value::map([(
                                "Service".to_string(),
                                Value::List(vec![Value::str("lambda.amazonaws.com")]),
                            )]),
                        ),
                    ])]),
                ),
            ]),
        )
}
