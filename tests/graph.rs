// ABOUTME: Integration tests for dependency graph building and validation.
// ABOUTME: Covers unresolved references, cycle detection, and ordering properties.

use flotilla::config::Descriptor;
use flotilla::error::Error;
use flotilla::graph::{DependencyGraph, GraphError};
use flotilla::types::ServiceName;

fn name(s: &str) -> ServiceName {
    ServiceName::new(s).unwrap()
}

fn descriptor(yaml: &str) -> Descriptor {
    Descriptor::from_yaml(yaml).unwrap()
}

mod validation {
    use super::*;

    #[test]
    fn dangling_dependency_is_rejected() {
        let descriptor = descriptor(
            r#"
services:
  app:
    image: my-app:1.0
    depends_on:
      - ghost
"#,
        );

        let err = DependencyGraph::build(&descriptor).unwrap_err();
        match &err {
            GraphError::UnresolvedReference {
                service,
                dependency,
            } => {
                assert_eq!(service, &name("app"));
                assert_eq!(dependency, &name("ghost"));
            }
            other => panic!("expected UnresolvedReference, got {other:?}"),
        }

        assert_eq!(Error::from(err).exit_code(), 3);
    }

    #[test]
    fn two_node_cycle_names_both_members() {
        let descriptor = descriptor(
            r#"
services:
  a:
    image: img:1
    depends_on: [b]
  b:
    image: img:1
    depends_on: [a]
"#,
        );

        let err = DependencyGraph::build(&descriptor).unwrap_err();
        match &err {
            GraphError::Cycle { members } => {
                assert_eq!(members.len(), 2);
                assert!(members.contains(&name("a")));
                assert!(members.contains(&name("b")));
            }
            other => panic!("expected Cycle, got {other:?}"),
        }

        let message = err.to_string();
        assert!(message.contains('a') && message.contains('b'));
        assert_eq!(Error::from(err).exit_code(), 4);
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let descriptor = descriptor(
            r#"
services:
  a:
    image: img:1
    depends_on: [a]
"#,
        );

        let err = DependencyGraph::build(&descriptor).unwrap_err();
        assert!(matches!(err, GraphError::Cycle { ref members } if members == &[name("a")]));
    }

    #[test]
    fn longer_cycle_is_reported_with_all_members() {
        let descriptor = descriptor(
            r#"
services:
  a:
    image: img:1
    depends_on: [c]
  b:
    image: img:1
    depends_on: [a]
  c:
    image: img:1
    depends_on: [b]
"#,
        );

        let err = DependencyGraph::build(&descriptor).unwrap_err();
        match err {
            GraphError::Cycle { members } => {
                assert_eq!(members.len(), 3);
            }
            other => panic!("expected Cycle, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_depends_on_entries_collapse() {
        let descriptor = descriptor(
            r#"
services:
  db:
    image: pg:16
  app:
    image: my-app:1.0
    depends_on: [db, db]
"#,
        );

        let graph = DependencyGraph::build(&descriptor).unwrap();
        assert_eq!(graph.dependencies(&name("app")), &[name("db")]);
    }
}

mod edges {
    use super::*;

    #[test]
    fn forward_and_reverse_edges_agree() {
        let descriptor = descriptor(
            r#"
services:
  zookeeper:
    image: zk:3.8
  kafka:
    image: kafka:3.7
    depends_on: [zookeeper]
  producer:
    image: app:1
    depends_on: [kafka]
  consumer:
    image: app:1
    depends_on: [kafka]
"#,
        );

        let graph = DependencyGraph::build(&descriptor).unwrap();
        assert_eq!(graph.dependencies(&name("kafka")), &[name("zookeeper")]);
        assert_eq!(
            graph.dependents(&name("kafka")),
            &[name("consumer"), name("producer")]
        );
        assert!(graph.dependents(&name("producer")).is_empty());
    }

    #[test]
    fn transitive_dependents_cover_the_whole_subtree() {
        let descriptor = descriptor(
            r#"
services:
  zookeeper:
    image: zk:3.8
  kafka:
    image: kafka:3.7
    depends_on: [zookeeper]
  producer:
    image: app:1
    depends_on: [kafka]
  unrelated:
    image: app:1
"#,
        );

        let graph = DependencyGraph::build(&descriptor).unwrap();
        let blocked = graph.transitive_dependents(&name("zookeeper"));

        assert!(blocked.contains(&name("kafka")));
        assert!(blocked.contains(&name("producer")));
        assert!(!blocked.contains(&name("unrelated")));
        assert!(!blocked.contains(&name("zookeeper")));
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    /// Build a descriptor for `n` services where each service may depend
    /// only on lower-numbered ones. Such graphs are acyclic by construction.
    fn yaml_for_edges(edges: &[Vec<usize>]) -> String {
        let mut yaml = String::from("services:\n");
        for (i, deps) in edges.iter().enumerate() {
            yaml.push_str(&format!("  svc-{}:\n    image: img:1\n", i));
            if !deps.is_empty() {
                yaml.push_str("    depends_on:\n");
                for d in deps {
                    yaml.push_str(&format!("      - svc-{}\n", d));
                }
            }
        }
        yaml
    }

    fn acyclic_edges() -> impl Strategy<Value = Vec<Vec<usize>>> {
        // For service i, pick a subset of 0..i as dependencies
        (1usize..10).prop_flat_map(|n| {
            (0..n)
                .map(|i| proptest::sample::subsequence((0..i).collect::<Vec<_>>(), 0..=i))
                .collect::<Vec<_>>()
        })
    }

    proptest! {
        #[test]
        fn every_service_starts_after_its_dependencies(edges in acyclic_edges()) {
            let descriptor = descriptor(&yaml_for_edges(&edges));
            let graph = DependencyGraph::build(&descriptor).unwrap();
            let order = graph.schedule().start_order();

            // Total order covers every service exactly once
            prop_assert_eq!(order.len(), edges.len());
            let mut seen = std::collections::BTreeSet::new();
            for service in &order {
                prop_assert!(seen.insert(service.clone()));
            }

            // Every dependency is strictly earlier
            let position = |s: &ServiceName| order.iter().position(|o| o == s).unwrap();
            for (i, deps) in edges.iter().enumerate() {
                let service = name(&format!("svc-{}", i));
                for d in deps {
                    let dep = name(&format!("svc-{}", d));
                    prop_assert!(position(&dep) < position(&service));
                }
            }
        }

        #[test]
        fn batches_only_contain_satisfied_services(edges in acyclic_edges()) {
            let descriptor = descriptor(&yaml_for_edges(&edges));
            let graph = DependencyGraph::build(&descriptor).unwrap();
            let schedule = graph.schedule();

            let mut placed = std::collections::BTreeSet::new();
            for batch in schedule.batches() {
                for service in batch.iter() {
                    for dep in graph.dependencies(service) {
                        prop_assert!(placed.contains(dep));
                    }
                }
                for service in batch.iter() {
                    placed.insert(service.clone());
                }
            }
        }
    }
}
