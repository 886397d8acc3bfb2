//! The topology builder.
//!
//! Builds the full resource graph for one context/service pair: two
//! compute endpoints (gateway-triggered and queue-triggered), their shared
//! IAM role, gateway routing, scheduled-trigger rules, the queue/DLQ pair
//! with policies, the context's event topic and its subscriptions, and
//! the document table. The graph is built fresh every run and replaced
//! wholesale — the declare-full-desired-state model of the underlying
//! control plane.

use strato_model::{Context, DeployConfig, ModelError, ModelResult, Service};
use strato_template::{Output, Parameter, Resource, Template, Value};

use crate::naming::{pascal_case, ResourceNames};
use crate::subscriptions::resolve_subscriptions;

/// The in-memory resource graph for one context, plus the logical ids
/// hooks and tests most often need to reach.
#[derive(Clone, Debug)]
pub struct ResourceTopology {
    pub context: String,
    pub service: String,
    pub template: Template,
    pub sync_function: String,
    pub async_function: String,
    pub queue: String,
    pub dlq: String,
    pub topic: String,
    /// Foreign contexts whose topics must exist before this topology's
    /// stack can be reconciled.
    pub subscribed_contexts: Vec<String>,
}

/// Builds [`ResourceTopology`] values for one deployment target.
pub struct TopologyBuilder<'a> {
    config: &'a DeployConfig,
    names: ResourceNames,
    environment: String,
}

impl<'a> TopologyBuilder<'a> {
    pub fn new(config: &'a DeployConfig, environment: impl Into<String>) -> Self {
        let environment = environment.into();
        Self {
            names: ResourceNames::from_config(config, &environment),
            config,
            environment,
        }
    }

    pub fn names(&self) -> &ResourceNames {
        &self.names
    }

    /// Build the full topology for `context`/`service`.
    ///
    /// `code_key` is the uploaded artifact's object key; required unless
    /// the configuration selects container-image mode.
    pub fn build(
        &self,
        context: &Context,
        service: &Service,
        code_key: Option<&str>,
    ) -> ModelResult<ResourceTopology> {
        if self.config.image_uri.is_none() && code_key.is_none() {
            return Err(ModelError::MissingConfiguration(
                "code artifact key (no image uri configured)".into(),
            ));
        }

        let names = &self.names;
        let svc = pascal_case(&service.name);
        let mut template = Template::new();

        let memory = template.add_parameter(
            format!("{svc}MemorySize"),
            Parameter::number(self.config.memory_size as i64),
        );
        let gateway_timeout = template.add_parameter(
            format!("{svc}GatewayTimeout"),
            Parameter::number(self.config.gateway_timeout_secs as i64),
        );
        let async_timeout = template.add_parameter(
            format!("{svc}AsyncTimeout"),
            Parameter::number(self.config.async_timeout_secs as i64),
        );

        let role_id = template.add_resource(names.role_id(&service.name), execution_role());

        let environment_block = self.endpoint_environment(context);

        let sync_id = template.add_resource(
            names.sync_function_id(&service.name),
            self.function(
                &names.sync_function_name(&service.name),
                &role_id,
                &memory,
                &gateway_timeout,
                environment_block.clone(),
                code_key,
            )?,
        );
        let async_id = template.add_resource(
            names.async_function_id(&service.name),
            self.function(
                &names.async_function_name(&service.name),
                &role_id,
                &memory,
                &async_timeout,
                environment_block,
                code_key,
            )?,
        );

        self.add_gateway_wiring(&mut template, context, service, &sync_id);
        self.add_timers(&mut template, context, &async_id);
        self.add_alerting(&mut template, context);

        let groups = resolve_subscriptions(context)?;
        let source_topic_arns: Vec<Value> = groups
            .keys()
            .map(|source| Value::str(names.topic_arn(source)))
            .collect();

        let dlq_id = template.add_resource(
            names.dlq_id(&context.name),
            queue_resource(&names.dlq_name(&context.name), None),
        );
        template.add_resource(
            format!("{}Policy", names.dlq_id(&context.name)),
            queue_policy(&names.dlq_id(&context.name), &source_topic_arns),
        );

        let queue_id = template.add_resource(
            names.queue_id(&context.name),
            queue_resource(&names.queue_name(&context.name), Some(&dlq_id))
                .depends_on(dlq_id.clone()),
        );
        template.add_resource(
            format!("{}Policy", names.queue_id(&context.name)),
            queue_policy(&names.queue_id(&context.name), &source_topic_arns),
        );

        template.add_resource(
            format!("{}AsyncMapping", pascal_case(&context.name)),
            Resource::new("AWS::Lambda::EventSourceMapping")
                .prop("BatchSize", 1u32)
                .prop("Enabled", true)
                .prop("EventSourceArn", Value::get_att(&queue_id, "Arn"))
                .prop("FunctionName", names.async_function_name(&service.name))
                .depends_on(queue_id.clone())
                .depends_on(async_id.clone()),
        );

        let topic_id = template.add_resource(
            names.topic_id(&context.name),
            Resource::new("AWS::SNS::Topic")
                .prop("TopicName", names.topic_name(&context.name)),
        );

        let mut subscribed_contexts = Vec::new();
        for (source, requests) in &groups {
            let filter_policy = Value::map([(
                "_name".to_string(),
                Value::List(
                    requests
                        .iter()
                        .map(|r| Value::str(&r.event_name))
                        .collect(),
                ),
            )]);
            let redrive = Value::map([(
                "deadLetterTargetArn".to_string(),
                Value::get_att(&dlq_id, "Arn"),
            )]);

            if source == &context.name {
                template.add_resource(
                    names.subscription_id(&context.name, None),
                    Resource::new("AWS::SNS::Subscription")
                        .prop("Protocol", "sqs")
                        .prop("Endpoint", Value::get_att(&queue_id, "Arn"))
                        .prop("TopicArn", names.topic_arn(&context.name))
                        .prop("FilterPolicy", filter_policy)
                        .prop("RedrivePolicy", redrive)
                        .depends_on(queue_id.clone())
                        .depends_on(dlq_id.clone())
                        .depends_on(topic_id.clone()),
                );
            } else {
                subscribed_contexts.push(source.clone());
                template.add_resource(
                    names.subscription_id(&context.name, Some(source)),
                    Resource::new("AWS::SNS::Subscription")
                        .prop("Protocol", "sqs")
                        .prop("Endpoint", Value::get_att(&queue_id, "Arn"))
                        .prop("TopicArn", names.topic_arn(source))
                        .prop("FilterPolicy", filter_policy)
                        .prop("RedrivePolicy", redrive)
                        .depends_on(queue_id.clone())
                        .depends_on(dlq_id.clone()),
                );
            }
        }

        let table_id = template.add_resource(
            names.table_id(&context.name),
            document_table(&names.table_name(&context.name)),
        );
        template.add_output(
            "DocumentTable",
            Output::value(Value::reference(&table_id)).described("Document table"),
        );

        Ok(ResourceTopology {
            context: context.name.clone(),
            service: service.name.clone(),
            template,
            sync_function: sync_id,
            async_function: async_id,
            queue: queue_id,
            dlq: dlq_id,
            topic: topic_id,
            subscribed_contexts,
        })
    }

    /// A compute endpoint. Selects between container-image and
    /// code-archive mode; attaches VPC placement only when completely
    /// configured.
    fn function(
        &self,
        physical_name: &str,
        role_id: &str,
        memory: &Value,
        timeout: &Value,
        environment: Value,
        code_key: Option<&str>,
    ) -> ModelResult<Resource> {
        let mut resource = Resource::new("AWS::Lambda::Function")
            .prop("FunctionName", physical_name)
            .prop("Role", Value::get_att(role_id, "Arn"))
            .prop("MemorySize", memory.clone())
            .prop("Timeout", timeout.clone())
            .prop(
                "Environment",
                Value::map([("Variables".to_string(), environment)]),
            );

        match (&self.config.image_uri, code_key) {
            (Some(image_uri), _) => {
                resource = resource
                    .prop(
                        "Code",
                        Value::map([("ImageUri".to_string(), Value::str(image_uri))]),
                    )
                    .prop("PackageType", "Image");
            }
            (None, Some(key)) => {
                resource = resource
                    .prop(
                        "Code",
                        Value::map([
                            ("S3Bucket".to_string(), Value::str(&self.config.bucket)),
                            ("S3Key".to_string(), Value::str(key)),
                        ]),
                    )
                    .prop("Runtime", self.config.runtime.as_str())
                    .prop("Handler", self.config.handler.as_str());
            }
            (None, None) => {
                return Err(ModelError::MissingConfiguration(
                    "code artifact key".into(),
                ))
            }
        }

        if let Some(vpc) = self.config.vpc_placement() {
            resource = resource.prop(
                "VpcConfig",
                Value::map([
                    (
                        "SecurityGroupIds".to_string(),
                        Value::List(vpc.security_group_ids.iter().map(Value::str).collect()),
                    ),
                    (
                        "SubnetIds".to_string(),
                        Value::List(vpc.subnet_ids.iter().map(Value::str).collect()),
                    ),
                ]),
            );
        }

        Ok(resource)
    }

    /// Environment variables surfaced into both endpoints. Context-level
    /// overrides shadow the defaults.
    fn endpoint_environment(&self, context: &Context) -> Value {
        let names = &self.names;
        let mut vars = std::collections::BTreeMap::new();
        vars.insert("PROJECT".to_string(), Value::str(&self.config.project));
        vars.insert("ENVIRONMENT".to_string(), Value::str(&self.environment));
        vars.insert(
            "ACCOUNT_ID".to_string(),
            Value::str(&self.config.account_id),
        );
        vars.insert("CONTEXT".to_string(), Value::str(&context.name));
        vars.insert("REGION".to_string(), Value::str(&self.config.region));
        vars.insert("BUCKET".to_string(), Value::str(&self.config.bucket));
        vars.insert(
            "DOCUMENT_TABLE".to_string(),
            Value::str(names.table_name(&context.name)),
        );
        for (key, value) in &context.environment_overrides {
            vars.insert(key.clone(), Value::str(value));
        }
        if let Some(url) = &self.config.error_report_url {
            vars.insert("ERROR_REPORT_URL".to_string(), Value::str(url));
        }
        Value::Map(vars)
    }

    fn add_gateway_wiring(
        &self,
        template: &mut Template,
        context: &Context,
        service: &Service,
        sync_id: &str,
    ) {
        let names = &self.names;
        let route = names.route_path(&context.name);

        template.add_resource(
            format!("{}SyncPermission", pascal_case(&service.name)),
            Resource::new("AWS::Lambda::Permission")
                .prop("Action", "lambda:InvokeFunction")
                .prop("FunctionName", names.sync_function_name(&service.name))
                .prop("Principal", "apigateway.amazonaws.com")
                .prop(
                    "SourceArn",
                    Value::join(
                        "",
                        vec![
                            Value::str("arn:aws:execute-api:"),
                            Value::str(&self.config.region),
                            Value::str(":"),
                            Value::str(&self.config.account_id),
                            Value::str(":"),
                            Value::import(names.gateway_export()),
                            Value::str("/*/*/"),
                            Value::str(&route),
                            Value::str("*"),
                        ],
                    ),
                )
                .depends_on(sync_id.to_string()),
        );

        let integration_id = template.add_resource(
            names.integration_id(&context.name),
            Resource::new("AWS::ApiGatewayV2::Integration")
                .prop("ApiId", Value::import(names.gateway_export()))
                .prop("PayloadFormatVersion", "2.0")
                .prop("IntegrationType", "AWS_PROXY")
                .prop(
                    "IntegrationUri",
                    Value::join(
                        "",
                        vec![
                            Value::str("arn:aws:lambda:"),
                            Value::str(&self.config.region),
                            Value::str(":"),
                            Value::str(&self.config.account_id),
                            Value::str(":function:"),
                            Value::reference(sync_id),
                        ],
                    ),
                ),
        );

        template.add_resource(
            format!("{}Base", names.route_id(&context.name)),
            Resource::new("AWS::ApiGatewayV2::Route")
                .prop("ApiId", Value::import(names.gateway_export()))
                .prop("RouteKey", format!("ANY /{route}"))
                .prop("AuthorizationType", "NONE")
                .prop(
                    "Target",
                    Value::join("/", vec![
                        Value::str("integrations"),
                        Value::reference(&integration_id),
                    ]),
                )
                .depends_on(integration_id.clone()),
        );
        template.add_resource(
            format!("{}Proxy", names.route_id(&context.name)),
            Resource::new("AWS::ApiGatewayV2::Route")
                .prop("ApiId", Value::import(names.gateway_export()))
                .prop("RouteKey", format!("ANY /{route}/{{proxy+}}"))
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
    }

    /// Scheduled-trigger rules. Timers restricted to a different
    /// environment are filtered before rule creation and leave no trace.
    fn add_timers(&self, template: &mut Template, context: &Context, async_id: &str) {
        let names = &self.names;
        for handler in &context.command_handlers {
            let Some(timer) = &handler.timer else {
                continue;
            };
            if !timer.applies_to(&self.environment) {
                continue;
            }

            let rule_id = template.add_resource(
                names.timer_rule_id(&timer.command),
                Resource::new("AWS::Events::Rule")
                    .prop("ScheduleExpression", format!("cron({})", timer.cron))
                    .prop("State", "ENABLED")
                    .prop(
                        "Targets",
                        Value::List(vec![Value::map([
                            ("Arn".to_string(), Value::get_att(async_id, "Arn")),
                            ("Id".to_string(), Value::str(async_id)),
                            (
                                "Input".to_string(),
                                Value::str(format!(
                                    "{{\"_context\": \"{}\", \"_type\": \"command\", \"_name\": \"{}\"}}",
                                    context.name, handler.name
                                )),
                            ),
                        ])]),
                    ),
            );
            template.add_resource(
                names.timer_permission_id(&timer.command),
                Resource::new("AWS::Lambda::Permission")
                    .prop("Action", "lambda:InvokeFunction")
                    .prop("Principal", "events.amazonaws.com")
                    .prop("FunctionName", Value::reference(async_id))
                    .prop("SourceArn", Value::get_att(&rule_id, "Arn")),
            );
        }
    }

    /// Alerting resources, only when recipients are configured.
    fn add_alerting(&self, template: &mut Template, context: &Context) {
        let names = &self.names;
        let Some(alerts) = &self.config.alerts else {
            return;
        };
        if alerts.email_recipients.is_empty() {
            return;
        }

        let alert_topic_id = template.add_resource(
            names.alert_topic_id(&context.name),
            Resource::new("AWS::SNS::Topic")
                .prop("TopicName", names.alert_topic_name(&context.name)),
        );
        for (i, recipient) in alerts.email_recipients.iter().enumerate() {
            template.add_resource(
                format!("{}AlertSubscription{}", pascal_case(&context.name), i),
                Resource::new("AWS::SNS::Subscription")
                    .prop("Protocol", "email")
                    .prop("Endpoint", recipient.as_str())
                    .prop("TopicArn", Value::reference(&alert_topic_id))
                    .depends_on(alert_topic_id.clone()),
            );
        }
    }
}

/// The execution role shared by both endpoints: log access plus the
/// broad service-action allowlist the deployed application needs.
fn execution_role() -> Resource {
    let statement = |actions: Vec<&str>, resource: Value| {
        Value::map([
            (
                "Action".to_string(),
                Value::List(actions.into_iter().map(Value::str).collect()),
            ),
            ("Resource".to_string(), resource),
            ("Effect".to_string(), Value::str("Allow")),
        ])
    };

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
                            Value::List(vec![
                                statement(vec!["logs:*"], Value::str("arn:aws:logs:*:*:*")),
                                statement(
                                    vec![
                                        "dynamodb:*",
                                        "lambda:InvokeFunction",
                                        "s3:*",
                                        "secretsmanager:GetSecretValue",
                                        "sns:*",
                                        "sqs:*",
                                    ],
                                    Value::str("*"),
                                ),
                            ]),
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

/// A queue, optionally redriving to a DLQ. Failures are retried up to the
/// receive-count ceiling before a message is considered permanently dead.
fn queue_resource(physical_name: &str, dlq_id: Option<&str>) -> Resource {
    let mut resource = Resource::new("AWS::SQS::Queue")
        .prop("QueueName", physical_name)
        .prop("VisibilityTimeout", 905u32)
        .prop("ReceiveMessageWaitTimeSeconds", 20u32)
        .prop("MessageRetentionPeriod", 1_209_600u32);
    if let Some(dlq) = dlq_id {
        resource = resource.prop(
            "RedrivePolicy",
            Value::map([
                (
                    "deadLetterTargetArn".to_string(),
                    Value::get_att(dlq, "Arn"),
                ),
                ("maxReceiveCount".to_string(), Value::from(1000u32)),
            ]),
        );
    }
    resource
}

/// Policy permitting `SendMessage` from the subscribed topics and no one
/// else.
fn queue_policy(queue_id: &str, source_topic_arns: &[Value]) -> Resource {
    Resource::new("AWS::SQS::QueuePolicy")
        .prop("Queues", Value::List(vec![Value::reference(queue_id)]))
        .prop(
            "PolicyDocument",
            Value::map([
                ("Version".to_string(), Value::str("2008-10-17")),
                ("Id".to_string(), Value::str(format!("{queue_id}Policy"))),
                (
                    "Statement".to_string(),
                    Value::List(vec![Value::map([
                        (
                            "Action".to_string(),
                            Value::List(vec![Value::str("sqs:SendMessage")]),
                        ),
                        ("Effect".to_string(), Value::str("Allow")),
                        ("Resource".to_string(), Value::get_att(queue_id, "Arn")),
                        (
                            "Principal".to_string(),
                            Value::map([("AWS".to_string(), Value::str("*"))]),
                        ),
                        (
                            "Condition".to_string(),
                            Value::map([(
                                "ForAnyValue:ArnEquals".to_string(),
                                Value::map([(
                                    "aws:SourceArn".to_string(),
                                    Value::List(source_topic_arns.to_vec()),
                                )]),
                            )]),
                        ),
                    ])]),
                ),
            ]),
        )
        .depends_on(queue_id.to_string())
}

/// The per-context document table: two-part key, on-demand billing, TTL.
fn document_table(physical_name: &str) -> Resource {
    Resource::new("AWS::DynamoDB::Table")
        .prop("TableName", physical_name)
        .prop(
            "AttributeDefinitions",
            Value::List(vec![
                Value::map([
                    ("AttributeName".to_string(), Value::str("pk")),
                    ("AttributeType".to_string(), Value::str("S")),
                ]),
                Value::map([
                    ("AttributeName".to_string(), Value::str("sk")),
                    ("AttributeType".to_string(), Value::str("S")),
                ]),
            ]),
        )
        .prop("BillingMode", "PAY_PER_REQUEST")
        .prop(
            "KeySchema",
            Value::List(vec![
                Value::map([
                    ("AttributeName".to_string(), Value::str("pk")),
                    ("KeyType".to_string(), Value::str("HASH")),
                ]),
                Value::map([
                    ("AttributeName".to_string(), Value::str("sk")),
                    ("KeyType".to_string(), Value::str("RANGE")),
                ]),
            ]),
        )
        .prop(
            "TimeToLiveSpecification",
            Value::map([
                ("AttributeName".to_string(), Value::str("TimeToLive")),
                ("Enabled".to_string(), Value::from(true)),
            ]),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use strato_model::{CommandHandlerDef, EventRef, TimerDef, VpcConfig};
    use strato_template::{JsonRenderer, TemplateRenderer};

    fn config() -> DeployConfig {
        DeployConfig::new("acme", "us-east-1", "123456789012", "acme-deploys")
    }

    fn orders_context() -> Context {
        Context::new("Orders")
            .with_handler(CommandHandlerDef::new("PlaceOrder"))
            .with_listener(
                "orders-svc",
                vec![EventRef::Qualified("Orders.OrderPlaced".into())],
            )
    }

    fn orders_service() -> Service {
        Service::new("orders-svc", "Orders")
    }

    fn build(config: &DeployConfig, context: &Context) -> ResourceTopology {
        TopologyBuilder::new(config, "staging")
            .build(context, &orders_service(), Some("code/orders-svc/t1.zip"))
            .unwrap()
    }

    #[test]
    fn repeated_builds_render_identically() {
        let config = config();
        let context = orders_context();
        let renderer = JsonRenderer;
        let a = renderer.render(&build(&config, &context).template).unwrap();
        let b = renderer.render(&build(&config, &context).template).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn two_endpoints_share_role_and_memory() {
        let topology = build(&config(), &orders_context());
        let sync = topology.template.resource(&topology.sync_function).unwrap();
        let a = topology.template.resource(&topology.async_function).unwrap();
        assert_eq!(sync.property("Role"), a.property("Role"));
        assert_eq!(sync.property("MemorySize"), a.property("MemorySize"));
        assert_eq!(
            sync.property("Timeout"),
            Some(&Value::Ref("OrdersSvcGatewayTimeout".into()))
        );
        assert_eq!(
            a.property("Timeout"),
            Some(&Value::Ref("OrdersSvcAsyncTimeout".into()))
        );
    }

    #[test]
    fn archive_mode_carries_bucket_and_key() {
        let topology = build(&config(), &orders_context());
        let sync = topology.template.resource(&topology.sync_function).unwrap();
        match sync.property("Code").unwrap() {
            Value::Map(code) => {
                assert_eq!(code.get("S3Bucket"), Some(&Value::str("acme-deploys")));
                assert_eq!(
                    code.get("S3Key"),
                    Some(&Value::str("code/orders-svc/t1.zip"))
                );
            }
            other => panic!("unexpected Code shape: {other:?}"),
        }
        assert!(sync.property("PackageType").is_none());
    }

    #[test]
    fn image_mode_skips_runtime() {
        let mut config = config();
        config.image_uri = Some("123456789012.dkr.ecr.us-east-1.amazonaws.com/acme:1".into());
        let topology = TopologyBuilder::new(&config, "staging")
            .build(&orders_context(), &orders_service(), None)
            .unwrap();
        let sync = topology.template.resource(&topology.sync_function).unwrap();
        assert_eq!(sync.property("PackageType"), Some(&Value::str("Image")));
        assert!(sync.property("Runtime").is_none());
    }

    #[test]
    fn archive_mode_without_code_key_is_rejected() {
        let config = config();
        let result =
            TopologyBuilder::new(&config, "staging").build(&orders_context(), &orders_service(), None);
        assert!(result.is_err());
    }

    #[test]
    fn vpc_attaches_to_both_endpoints() {
        let mut config = config();
        config.vpc = Some(VpcConfig {
            subnet_ids: vec!["subnet-1".into()],
            security_group_ids: vec!["sg-1".into()],
        });
        let topology = TopologyBuilder::new(&config, "staging")
            .build(&orders_context(), &orders_service(), Some("k.zip"))
            .unwrap();
        for id in [&topology.sync_function, &topology.async_function] {
            assert!(topology
                .template
                .resource(id)
                .unwrap()
                .property("VpcConfig")
                .is_some());
        }
    }

    #[test]
    fn timer_in_other_environment_leaves_no_trace() {
        let context = Context::new("Orders").with_handler(
            CommandHandlerDef::new("SweepStale").with_timer(TimerDef {
                cron: "0 * * * ? *".into(),
                environment: Some("prod".into()),
                command: "SweepStale".into(),
            }),
        );
        let config = config();
        let topology = TopologyBuilder::new(&config, "staging")
            .build(&context, &orders_service(), Some("k.zip"))
            .unwrap();
        assert_eq!(
            topology.template.resources_of_kind("AWS::Events::Rule").count(),
            0
        );
    }

    #[test]
    fn timer_in_matching_environment_creates_rule_and_permission() {
        let context = Context::new("Orders").with_handler(
            CommandHandlerDef::new("SweepStale").with_timer(TimerDef {
                cron: "0 12 * * ? *".into(),
                environment: Some("staging".into()),
                command: "SweepStale".into(),
            }),
        );
        let config = config();
        let topology = TopologyBuilder::new(&config, "staging")
            .build(&context, &orders_service(), Some("k.zip"))
            .unwrap();
        let rule = topology.template.resource("SweepStaleTimerRule").unwrap();
        assert_eq!(
            rule.property("ScheduleExpression"),
            Some(&Value::str("cron(0 12 * * ? *)"))
        );
        assert!(topology
            .template
            .resource("SweepStaleTimerPermission")
            .is_some());
    }

    #[test]
    fn local_subscription_filter_lists_exact_events() {
        let context = Context::new("Orders").with_listener(
            "orders-svc",
            vec![
                EventRef::Qualified("Orders.OrderPlaced".into()),
                EventRef::Qualified("Orders.OrderCancelled".into()),
            ],
        );
        let topology = build(&config(), &context);
        let sub = topology.template.resource("OrdersSubscription").unwrap();
        match sub.property("FilterPolicy").unwrap() {
            Value::Map(policy) => match policy.get("_name").unwrap() {
                Value::List(names) => assert_eq!(
                    names,
                    &vec![Value::str("OrderPlaced"), Value::str("OrderCancelled")]
                ),
                other => panic!("unexpected _name shape: {other:?}"),
            },
            other => panic!("unexpected FilterPolicy shape: {other:?}"),
        }
    }

    #[test]
    fn cross_context_subscription_targets_foreign_topic() {
        let context = Context::new("Billing").with_listener(
            "billing-svc",
            vec![EventRef::Qualified("Orders.OrderPlaced".into())],
        );
        let config = config();
        let topology = TopologyBuilder::new(&config, "staging")
            .build(&context, &Service::new("billing-svc", "Billing"), Some("k.zip"))
            .unwrap();
        assert_eq!(topology.subscribed_contexts, vec!["Orders".to_string()]);
        let sub = topology
            .template
            .resource("BillingOrdersSubscription")
            .unwrap();
        assert_eq!(
            sub.property("TopicArn"),
            Some(&Value::str(
                "arn:aws:sns:us-east-1:123456789012:acme-staging-orders-events"
            ))
        );
    }

    #[test]
    fn no_listeners_yields_no_subscriptions() {
        let context = Context::new("Orders");
        let topology = build(&config(), &context);
        assert_eq!(
            topology
                .template
                .resources_of_kind("AWS::SNS::Subscription")
                .count(),
            0
        );
    }

    #[test]
    fn queue_redrives_to_dlq_with_high_ceiling() {
        let topology = build(&config(), &orders_context());
        let queue = topology.template.resource(&topology.queue).unwrap();
        match queue.property("RedrivePolicy").unwrap() {
            Value::Map(redrive) => {
                assert_eq!(redrive.get("maxReceiveCount"), Some(&Value::from(1000u32)));
            }
            other => panic!("unexpected RedrivePolicy shape: {other:?}"),
        }
        assert!(topology.template.resource(&topology.dlq).is_some());
        assert!(topology.template.resource("OrdersQueuePolicy").is_some());
        assert!(topology.template.resource("OrdersQueueDlqPolicy").is_some());
    }

    #[test]
    fn topic_is_always_created() {
        let context = Context::new("Orders");
        let topology = build(&config(), &context);
        assert!(topology.template.resource(&topology.topic).is_some());
    }

    #[test]
    fn alerting_only_with_recipients() {
        let bare = build(&config(), &orders_context());
        assert!(bare.template.resource("OrdersAlertTopic").is_none());

        let mut config = config();
        config.alerts = Some(strato_model::AlertConfig {
            email_recipients: vec!["ops@acme.example".into(), "dev@acme.example".into()],
        });
        let topology = TopologyBuilder::new(&config, "staging")
            .build(&orders_context(), &orders_service(), Some("k.zip"))
            .unwrap();
        assert!(topology.template.resource("OrdersAlertTopic").is_some());
        assert!(topology
            .template
            .resource("OrdersAlertSubscription0")
            .is_some());
        assert!(topology
            .template
            .resource("OrdersAlertSubscription1")
            .is_some());
    }

    #[test]
    fn endpoint_environment_carries_table_and_overrides() {
        let mut context = orders_context();
        context
            .environment_overrides
            .insert("FEATURE_FLAG".into(), "on".into());
        let topology = build(&config(), &context);
        let sync = topology.template.resource(&topology.sync_function).unwrap();
        let env = match sync.property("Environment").unwrap() {
            Value::Map(env) => match env.get("Variables").unwrap() {
                Value::Map(vars) => vars.clone(),
                other => panic!("unexpected Variables shape: {other:?}"),
            },
            other => panic!("unexpected Environment shape: {other:?}"),
        };
        assert_eq!(
            env.get("DOCUMENT_TABLE"),
            Some(&Value::str("acme-staging-orders-documents"))
        );
        assert_eq!(env.get("FEATURE_FLAG"), Some(&Value::str("on")));
        assert_eq!(env.get("CONTEXT"), Some(&Value::str("Orders")));
    }

    #[test]
    fn table_output_is_exported() {
        let topology = build(&config(), &orders_context());
        let table = topology.template.resource("OrdersDocuments").unwrap();
        assert_eq!(
            table.property("BillingMode"),
            Some(&Value::str("PAY_PER_REQUEST"))
        );
        assert!(topology.template.outputs.contains_key("DocumentTable"));
    }
}
