use std::{collections::BTreeMap, sync::Arc, time::Duration};

use mockline::{
    monitors::{InterceptionStats, Tracer},
    *,
};

#[derive(Clone, Debug)]
enum GroupEvent {
    Request { group: String },
    Created { group: String, key: u32 },
}

impl Event for GroupEvent {}

// Would call the remote service; the mock keeps it from running.
struct CreateGroup;

impl Processor<GroupEvent> for CreateGroup {
    fn process(&self, _envelope: Envelope<GroupEvent>) -> Result<Envelope<GroupEvent>> {
        Err(Error::external(std::io::Error::other("no network in tests")))
    }
}

struct Logger;

impl Processor<GroupEvent> for Logger {
    fn process(&self, envelope: Envelope<GroupEvent>) -> Result<Envelope<GroupEvent>> {
        println!("[{}] {:?}", envelope.flow_name(), envelope.message());
        Ok(envelope)
    }
}

struct Flow {
    steps: Vec<Instance<GroupEvent>>,
}

impl Flow {
    fn run(&self, envelope: Envelope<GroupEvent>) -> Result<Envelope<GroupEvent>> {
        self.steps
            .iter()
            .try_fold(envelope, |envelope, step| step.process(envelope))
    }
}

fn build_flow(ctx: &Arc<MockContext<GroupEvent>>) -> Result<Flow> {
    let mut connector = BTreeMap::new();
    connector.insert("config-ref".to_string(), "jiraConfig".to_string());

    let steps = vec![
        ctx.create_interceptable(
            "Logger",
            ComponentId::parse("logger")?,
            BTreeMap::new(),
            SourceLocation::new("jira.xml", 10),
            &[],
        )?,
        ctx.create_interceptable(
            "CreateGroup",
            ComponentId::parse("jira:create-group")?,
            connector,
            SourceLocation::new("jira.xml", 11),
            &[],
        )?,
        ctx.create_interceptable(
            "Logger",
            ComponentId::parse("logger")?,
            BTreeMap::new(),
            SourceLocation::new("jira.xml", 14),
            &[],
        )?,
    ];
    Ok(Flow { steps })
}

#[tokio::main]
async fn main() -> Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mockline=debug")),
        )
        .init();

    let ctx = MockContext::<GroupEvent>::with_config(
        MockConfig::default().with_settle_timeout(Duration::from_secs(2)),
    );
    ctx.register_class(ProcessorClass::new("Logger").nullary(|| Logger));
    ctx.register_class(ProcessorClass::new("CreateGroup").nullary(|| CreateGroup));

    let stats = InterceptionStats::new();
    ctx.monitors().add(Tracer);
    ctx.monitors().add(stats.clone());

    // Mock the connector and check what it is asked to do
    ctx.on_call("create-group")
        .of_namespace("jira")
        .with_attribute("config-ref", "jiraConfig")
        .then_apply(|event| match event {
            GroupEvent::Request { group } => GroupEvent::Created { key: 42, group },
            other => other,
        })?;
    ctx.spy("jira:create-group").before([spy_action(
        |envelope: &Envelope<GroupEvent>| match envelope.message() {
            GroupEvent::Request { group } if !group.is_empty() => Ok(()),
            other => Err(Error::assertion(format!("unexpected request {other:?}"))),
        },
    )])?;

    let flow = Arc::new(build_flow(&ctx)?);

    let runs: Vec<_> = ["admins", "developers", "auditors"]
        .into_iter()
        .map(|group| {
            let guard = ctx.pipeline().guard();
            let flow = flow.clone();
            tokio::spawn(async move {
                let _guard = guard;
                let request = GroupEvent::Request {
                    group: group.to_string(),
                };
                flow.run(Envelope::new(request).with_flow("callingJira"))
            })
        })
        .collect();

    ctx.verify_call("jira:create-group")
        .eventually(Cardinality::Exactly(3))
        .await?;
    ctx.verify_call("logger").eventually(Cardinality::Exactly(6)).await?;

    for run in runs {
        let out = run.await.map_err(Error::external)??;
        println!("result: {:?}", out.message());
    }

    println!(
        "create-group mocked {} time(s)",
        stats.mocked_count(&ComponentId::parse("jira:create-group")?)
    );
    for frame in ctx.call_trace().iter().take(3) {
        println!("  {frame}");
    }
    Ok(())
}
