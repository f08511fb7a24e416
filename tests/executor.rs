// ABOUTME: Integration tests for the batch executor and teardown.
// ABOUTME: Uses the in-memory fake runtime; no daemon required.

mod support;

use std::sync::Arc;

use flotilla::config::Descriptor;
use flotilla::diagnostics::Diagnostics;
use flotilla::graph::DependencyGraph;
use flotilla::orchestrate::{
    self, DownOutcome, ExecError, ServiceState, StateTable, UpOptions, UpOutcome,
};
use flotilla::output::{Output, OutputMode};
use flotilla::runtime::ContainerState;
use flotilla::status::StatusReporter;
use flotilla::types::ServiceName;
use support::descriptor;
use support::fake_runtime::{Behavior, FakeRuntime};
use tokio::sync::watch;

fn name(s: &str) -> ServiceName {
    ServiceName::new(s).unwrap()
}

async fn run_up(
    runtime: &FakeRuntime,
    descriptor: &Descriptor,
) -> (UpOutcome, Arc<StateTable>, Diagnostics) {
    let graph = DependencyGraph::build(descriptor).unwrap();
    let schedule = graph.schedule();
    let table = Arc::new(StateTable::new(descriptor.services.keys().cloned()));
    let (_cancel_tx, mut cancel_rx) = watch::channel(false);
    let mut diag = Diagnostics::default();
    let output = Output::new(OutputMode::Quiet);

    let outcome = orchestrate::up(
        runtime,
        descriptor,
        &graph,
        &schedule,
        &table,
        &mut cancel_rx,
        &UpOptions::default(),
        &output,
        &mut diag,
    )
    .await
    .expect("up should not abort");

    (outcome, table, diag)
}

async fn run_down(runtime: &FakeRuntime, descriptor: &Descriptor) -> DownOutcome {
    let graph = DependencyGraph::build(descriptor).unwrap();
    let schedule = graph.schedule();
    let output = Output::new(OutputMode::Quiet);

    orchestrate::down(runtime, descriptor, &schedule, &output)
        .await
        .expect("down should not abort")
}

const CHAIN: &str = r#"
project: etl
services:
  zookeeper:
    image: zk:3.8
  kafka:
    image: kafka:3.7
    depends_on: [zookeeper]
  init-topics:
    image: kafka:3.7
    depends_on: [kafka]
    one_shot: true
"#;

mod up {
    use super::*;

    #[tokio::test]
    async fn chain_starts_in_dependency_order() {
        let runtime = FakeRuntime::new();
        runtime.behave(
            "etl-init-topics",
            Behavior {
                exits_with: Some(0),
                ..Default::default()
            },
        );
        let descriptor = descriptor(CHAIN);

        let (outcome, table, _) = run_up(&runtime, &descriptor).await;

        assert!(outcome.success());
        let zk = runtime.start_index("etl-zookeeper").unwrap();
        let kafka = runtime.start_index("etl-kafka").unwrap();
        let init = runtime.start_index("etl-init-topics").unwrap();
        assert!(zk < kafka && kafka < init);

        assert_eq!(table.state_of(&name("zookeeper")), Some(ServiceState::Running));
        assert_eq!(table.state_of(&name("kafka")), Some(ServiceState::Running));
        assert_eq!(
            table.state_of(&name("init-topics")),
            Some(ServiceState::Stopped)
        );
    }

    #[tokio::test]
    async fn project_network_is_created_before_any_start() {
        let runtime = FakeRuntime::new();
        let descriptor = descriptor(
            r#"
project: solo
services:
  app:
    image: app:1
"#,
        );

        let (outcome, _, _) = run_up(&runtime, &descriptor).await;

        assert!(outcome.success());
        assert_eq!(runtime.network_names(), vec!["solo".to_string()]);
        let events = runtime.events();
        let network = events.iter().position(|e| e == "network solo").unwrap();
        let start = runtime.start_index("solo-app").unwrap();
        assert!(network < start);
    }

    #[tokio::test]
    async fn one_shot_exit_zero_counts_as_success() {
        let runtime = FakeRuntime::new();
        runtime.behave(
            "etl-init-topics",
            Behavior {
                exits_with: Some(0),
                ..Default::default()
            },
        );
        let descriptor = descriptor(CHAIN);

        let (outcome, table, _) = run_up(&runtime, &descriptor).await;

        assert!(outcome.success());
        let rows = table.snapshot();
        let init = rows
            .iter()
            .find(|r| r.service == name("init-topics"))
            .unwrap();
        assert_eq!(init.state, ServiceState::Stopped);
        assert_eq!(init.detail.as_deref(), Some("exited 0"));
    }

    #[tokio::test]
    async fn failed_service_blocks_its_subtree_but_not_others() {
        let runtime = FakeRuntime::new();
        // seed is a one-shot that fails; reporter depends on it.
        // The zookeeper/kafka branch is unrelated and must still start.
        runtime.behave(
            "etl-seed",
            Behavior {
                exits_with: Some(7),
                ..Default::default()
            },
        );
        let descriptor = descriptor(
            r#"
project: etl
services:
  seed:
    image: app:1
    one_shot: true
  reporter:
    image: app:1
    depends_on: [seed]
  zookeeper:
    image: zk:3.8
  kafka:
    image: kafka:3.7
    depends_on: [zookeeper]
"#,
        );

        let (outcome, table, _) = run_up(&runtime, &descriptor).await;

        assert!(!outcome.success());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].0, name("seed"));
        assert!(outcome.failures[0].1.contains("code 7"));
        assert_eq!(outcome.blocked, vec![name("reporter")]);

        // The failed service is Failed, its dependent was never issued
        assert_eq!(table.state_of(&name("seed")), Some(ServiceState::Failed));
        assert_eq!(table.state_of(&name("reporter")), Some(ServiceState::Pending));
        assert!(runtime.start_index("etl-reporter").is_none());

        // Unrelated branch came up fully
        assert_eq!(table.state_of(&name("kafka")), Some(ServiceState::Running));
    }

    #[tokio::test]
    async fn best_effort_failure_does_not_block_dependents() {
        let runtime = FakeRuntime::new();
        runtime.behave(
            "etl-seed",
            Behavior {
                exits_with: Some(1),
                ..Default::default()
            },
        );
        let descriptor = descriptor(
            r#"
project: etl
services:
  seed:
    image: app:1
    one_shot: true
    best_effort: true
  app:
    image: app:1
    depends_on: [seed]
"#,
        );

        let (outcome, table, diag) = run_up(&runtime, &descriptor).await;

        // The failure is recorded but the dependent still started
        assert!(!outcome.success());
        assert!(outcome.blocked.is_empty());
        assert_eq!(table.state_of(&name("seed")), Some(ServiceState::Failed));
        assert_eq!(table.state_of(&name("app")), Some(ServiceState::Running));
        assert!(runtime.start_index("etl-app").is_some());
        assert!(diag.has_warnings());
    }

    #[tokio::test]
    async fn healthcheck_gates_the_next_batch() {
        let runtime = FakeRuntime::new();
        runtime.behave(
            "etl-kafka",
            Behavior {
                unhealthy_checks: 2,
                ..Default::default()
            },
        );
        let descriptor = descriptor(
            r#"
project: etl
services:
  kafka:
    image: kafka:3.7
    healthcheck:
      cmd: "nc -z localhost 9092"
      interval: 0s
      start_period: 0s
      retries: 5
  app:
    image: app:1
    depends_on: [kafka]
"#,
        );

        let (outcome, table, _) = run_up(&runtime, &descriptor).await;

        assert!(outcome.success());
        assert_eq!(table.state_of(&name("kafka")), Some(ServiceState::Healthy));

        // Two failing checks plus the passing one, all before app starts
        let events = runtime.events();
        let checks: Vec<usize> = events
            .iter()
            .enumerate()
            .filter(|(_, e)| *e == "healthcheck etl-kafka")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(checks.len(), 3);
        let app_start = runtime.start_index("etl-app").unwrap();
        assert!(checks.iter().all(|&c| c < app_start));
    }

    #[tokio::test]
    async fn exhausted_healthcheck_retries_fail_the_service() {
        let runtime = FakeRuntime::new();
        runtime.behave(
            "etl-kafka",
            Behavior {
                never_healthy: true,
                ..Default::default()
            },
        );
        let descriptor = descriptor(
            r#"
project: etl
services:
  kafka:
    image: kafka:3.7
    healthcheck:
      cmd: "nc -z localhost 9092"
      interval: 0s
      start_period: 0s
      retries: 2
  app:
    image: app:1
    depends_on: [kafka]
"#,
        );

        let (outcome, table, _) = run_up(&runtime, &descriptor).await;

        assert!(!outcome.success());
        assert_eq!(table.state_of(&name("kafka")), Some(ServiceState::Failed));
        assert_eq!(outcome.blocked, vec![name("app")]);
        assert!(runtime.start_index("etl-app").is_none());
    }

    #[tokio::test]
    async fn long_running_service_that_exits_is_failed() {
        let runtime = FakeRuntime::new();
        // Exits immediately but is NOT declared one_shot
        runtime.behave(
            "etl-app",
            Behavior {
                exits_with: Some(0),
                ..Default::default()
            },
        );
        let descriptor = descriptor(
            r#"
project: etl
services:
  app:
    image: app:1
"#,
        );

        let (outcome, table, _) = run_up(&runtime, &descriptor).await;

        assert!(!outcome.success());
        assert_eq!(table.state_of(&name("app")), Some(ServiceState::Failed));
        assert!(outcome.failures[0].1.contains("exited during startup"));
    }

    #[tokio::test]
    async fn start_failure_removes_the_created_container() {
        let runtime = FakeRuntime::new();
        runtime.behave(
            "etl-app",
            Behavior {
                fail_start: true,
                ..Default::default()
            },
        );
        let descriptor = descriptor(
            r#"
project: etl
services:
  app:
    image: app:1
"#,
        );

        let (outcome, _, _) = run_up(&runtime, &descriptor).await;

        assert!(!outcome.success());
        let events = runtime.events();
        assert!(events.contains(&"create etl-app".to_string()));
        assert!(events.contains(&"remove etl-app".to_string()));
        assert!(runtime.container_names().is_empty());
    }

    #[tokio::test]
    async fn cancellation_stops_before_any_batch() {
        let runtime = FakeRuntime::new();
        let descriptor = descriptor(CHAIN);
        let graph = DependencyGraph::build(&descriptor).unwrap();
        let schedule = graph.schedule();
        let table = StateTable::new(descriptor.services.keys().cloned());
        let (cancel_tx, mut cancel_rx) = watch::channel(false);
        cancel_tx.send(true).unwrap();
        let mut diag = Diagnostics::default();
        let output = Output::new(OutputMode::Quiet);

        let result = orchestrate::up(
            &runtime,
            &descriptor,
            &graph,
            &schedule,
            &table,
            &mut cancel_rx,
            &UpOptions::default(),
            &output,
            &mut diag,
        )
        .await;

        assert!(matches!(result, Err(ExecError::Interrupted)));
        assert!(runtime.start_index("etl-zookeeper").is_none());
    }

    #[tokio::test]
    async fn status_reporter_reflects_final_states() {
        let runtime = FakeRuntime::new();
        runtime.behave(
            "etl-init-topics",
            Behavior {
                exits_with: Some(0),
                ..Default::default()
            },
        );
        let descriptor = descriptor(CHAIN);

        let (_, table, _) = run_up(&runtime, &descriptor).await;
        let reporter = StatusReporter::new(table);

        let lines = reporter.render_lines();
        assert_eq!(lines.len(), 4); // header + three services
        assert!(lines[0].contains("SERVICE"));
        assert!(lines.iter().any(|l| l.contains("init-topics") && l.contains("stopped")));
        assert!(lines.iter().any(|l| l.contains("kafka") && l.contains("running")));
    }
}

mod down {
    use super::*;

    #[tokio::test]
    async fn down_removes_containers_in_reverse_order() {
        let runtime = FakeRuntime::new();
        runtime.behave(
            "etl-init-topics",
            Behavior {
                exits_with: Some(0),
                ..Default::default()
            },
        );
        let descriptor = descriptor(CHAIN);
        let (outcome, _, _) = run_up(&runtime, &descriptor).await;
        assert!(outcome.success());

        let down = run_down(&runtime, &descriptor).await;

        assert!(down.success());
        assert_eq!(down.stopped.len(), 3);
        assert!(down.missing.is_empty());

        let events = runtime.events();
        let remove_pos = |name: &str| {
            events
                .iter()
                .position(|e| e == &format!("remove {}", name))
                .unwrap()
        };
        let init = remove_pos("etl-init-topics");
        let kafka = remove_pos("etl-kafka");
        let zk = remove_pos("etl-zookeeper");
        assert!(init < kafka && kafka < zk);

        assert!(runtime.container_names().is_empty());
        assert!(runtime.network_names().is_empty());
    }

    #[tokio::test]
    async fn down_sweeps_orphaned_project_containers() {
        let runtime = FakeRuntime::new();
        let descriptor = descriptor(
            r#"
project: etl
services:
  app:
    image: app:1
"#,
        );

        // Left behind by a descriptor that used to declare "old-worker"
        runtime.seed_container(
            "etl-old-worker",
            "app:1",
            ContainerState::Exited,
            &[
                ("flotilla.project", "etl"),
                ("flotilla.service", "old-worker"),
                ("flotilla.managed", "true"),
            ],
        );

        let down = run_down(&runtime, &descriptor).await;

        assert!(down.success());
        assert_eq!(down.orphans, vec!["etl-old-worker".to_string()]);
        assert!(runtime.container_names().is_empty());
    }

    #[tokio::test]
    async fn down_without_containers_reports_missing() {
        let runtime = FakeRuntime::new();
        let descriptor = descriptor(CHAIN);

        let down = run_down(&runtime, &descriptor).await;

        assert!(down.success());
        assert!(down.stopped.is_empty());
        assert_eq!(down.missing.len(), 3);
    }

    #[tokio::test]
    async fn down_ignores_containers_from_other_projects() {
        let runtime = FakeRuntime::new();
        let descriptor = descriptor(
            r#"
project: etl
services:
  app:
    image: app:1
"#,
        );

        runtime.seed_container(
            "other-app",
            "app:1",
            ContainerState::Running,
            &[
                ("flotilla.project", "other"),
                ("flotilla.service", "app"),
                ("flotilla.managed", "true"),
            ],
        );

        let down = run_down(&runtime, &descriptor).await;

        assert!(down.orphans.is_empty());
        assert_eq!(runtime.container_names(), vec!["other-app".to_string()]);
    }
}
