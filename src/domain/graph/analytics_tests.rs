#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use crate::domain::graph::analytics::{PathMetric, find_all_critical_paths, find_all_cycles, find_critical_path, is_connected};
    use crate::domain::graph::graph::{Dag, Topology, Traversal};
    use crate::domain::utils::id::NodeId;
    use crate::error::Error;

    fn id(value: &str) -> NodeId {
        NodeId::new(value)
    }

    fn dag(nodes: &[(&str, i64)], edges: &[(&str, &str)]) -> Dag {
        let mut dag = Dag::new();
        for (name, weight) in nodes {
            dag.add_node(0.0, 0.0, *weight, Some(id(name))).unwrap();
        }
        for (source, target) in edges {
            dag.add_edge(*source, *target, 1).unwrap();
        }
        dag
    }

    fn diamond() -> Dag {
        dag(&[("A", 3), ("B", 2), ("C", 4), ("D", 1)], &[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")])
    }

    #[test]
    fn test_critical_path_of_diamond() {
        let path = find_critical_path(&diamond(), Traversal::Forward, PathMetric::Weight).unwrap();

        assert_eq!(path.value, 8);
        assert_eq!(path.path, vec![id("A"), id("C"), id("D")]);
    }

    #[test]
    fn test_all_forward_paths_fold_in_own_weight() {
        let paths = find_all_critical_paths(&diamond(), Traversal::Forward, PathMetric::Weight).unwrap();

        assert_eq!(paths[&id("D")].value, 1);
        assert_eq!(paths[&id("B")].value, 3);
        assert_eq!(paths[&id("C")].value, 5);
        assert_eq!(paths[&id("C")].path, vec![id("C"), id("D")]);
    }

    #[test]
    fn test_backward_paths_run_towards_sources() {
        let paths = find_all_critical_paths(&diamond(), Traversal::Backward, PathMetric::Weight).unwrap();

        assert_eq!(paths[&id("A")].value, 3);
        assert_eq!(paths[&id("D")].value, 8);
        assert_eq!(paths[&id("D")].path, vec![id("D"), id("C"), id("A")]);
    }

    #[test]
    fn test_hop_count_paths() {
        let paths = find_all_critical_paths(&diamond(), Traversal::Forward, PathMetric::HopCount).unwrap();

        assert_eq!(paths[&id("A")].value, 3);
        // Both successors tie, the first one in edge order wins.
        assert_eq!(paths[&id("A")].path, vec![id("A"), id("B"), id("D")]);
        assert_eq!(paths[&id("D")].value, 1);
    }

    fn chain(count: usize) -> Dag {
        let mut chain = Dag::new();
        for index in 0..count {
            chain.add_node(0.0, 0.0, 1, Some(id(&format!("n{:06}", index)))).unwrap();
        }
        for index in 1..count {
            chain.add_edge(format!("n{:06}", index - 1).as_str(), format!("n{:06}", index).as_str(), 1).unwrap();
        }
        chain
    }

    #[test]
    fn test_critical_path_of_long_chain() {
        let count = 1_000;
        let path = find_critical_path(&chain(count), Traversal::Forward, PathMetric::Weight).unwrap();

        assert_eq!(path.value, count as i64);
        assert_eq!(path.path.len(), count);
    }

    #[test]
    fn test_deep_graph_does_not_exhaust_the_stack() {
        let deep = chain(100_000);

        assert!(find_all_cycles(&deep).is_empty());
        assert!(is_connected(&deep));
    }

    #[test]
    fn test_critical_path_rejects_cycles() {
        let cyclic = dag(&[("X", 1), ("Y", 1), ("Z", 1)], &[("X", "Y"), ("Y", "Z"), ("Z", "X")]);

        assert!(matches!(find_all_critical_paths(&cyclic, Traversal::Forward, PathMetric::Weight), Err(Error::CyclicGraph(_))));
    }

    #[test]
    fn test_empty_graph_has_empty_critical_path() {
        let path = find_critical_path(&Dag::new(), Traversal::Forward, PathMetric::Weight).unwrap();

        assert_eq!(path.value, 0);
        assert!(path.path.is_empty());
    }

    #[test]
    fn test_three_node_cycle_is_found() {
        let cyclic = dag(&[("X", 1), ("Y", 1), ("Z", 1)], &[("X", "Y"), ("Y", "Z"), ("Z", "X")]);

        let cycles = find_all_cycles(&cyclic);

        assert!(!cycles.is_empty());
        let expected: BTreeSet<NodeId> = [id("X"), id("Y"), id("Z")].into_iter().collect();
        assert!(cycles.iter().any(|cycle| cycle.iter().cloned().collect::<BTreeSet<_>>() == expected));
    }

    #[test]
    fn test_cycle_edges_exist_in_graph() {
        let cyclic = dag(
            &[("A", 1), ("B", 1), ("C", 1), ("D", 1)],
            &[("A", "B"), ("B", "C"), ("C", "D"), ("D", "B"), ("C", "A")],
        );

        let cycles = find_all_cycles(&cyclic);

        assert!(!cycles.is_empty());
        for cycle in cycles {
            for index in 0..cycle.len() {
                let source = &cycle[index];
                let target = &cycle[(index + 1) % cycle.len()];
                assert!(
                    cyclic.edges().iter().any(|edge| &edge.source == source && &edge.target == target),
                    "Missing edge {} -> {} for cycle {:?}",
                    source,
                    target,
                    cycle
                );
            }
        }
    }

    #[test]
    fn test_two_node_cycle_and_self_loop() {
        let two = dag(&[("X", 1), ("Y", 1)], &[("X", "Y"), ("Y", "X")]);
        assert_eq!(find_all_cycles(&two), vec![vec![id("X"), id("Y")]]);

        let self_loop = dag(&[("X", 1)], &[("X", "X")]);
        assert_eq!(find_all_cycles(&self_loop), vec![vec![id("X")]]);
    }

    #[test]
    fn test_acyclic_graph_has_no_cycles() {
        assert!(find_all_cycles(&diamond()).is_empty());
    }

    #[test]
    fn test_undirected_cycle_ignores_tree_edges() {
        let mut path = Topology::new();
        let mut ring = Topology::new();
        for name in ["A", "B", "C"] {
            path.add_node(0.0, 0.0, 1, Some(id(name))).unwrap();
            ring.add_node(0.0, 0.0, 1, Some(id(name))).unwrap();
        }
        path.add_edge("A", "B", 1).unwrap();
        path.add_edge("B", "C", 1).unwrap();
        ring.add_edge("A", "B", 1).unwrap();
        ring.add_edge("B", "C", 1).unwrap();
        ring.add_edge("C", "A", 1).unwrap();

        assert!(find_all_cycles(&path).is_empty());
        assert!(!find_all_cycles(&ring).is_empty());
    }

    #[test]
    fn test_connectivity() {
        let mut topology = Topology::new();
        for name in ["A", "B", "C", "D"] {
            topology.add_node(0.0, 0.0, 1, Some(id(name))).unwrap();
        }
        topology.add_edge("A", "B", 1).unwrap();
        topology.add_edge("C", "D", 1).unwrap();
        assert!(!is_connected(&topology), "Two components must not count as connected");

        topology.add_edge("B", "C", 1).unwrap();
        assert!(is_connected(&topology));

        assert!(is_connected(&diamond()), "Directed graphs are checked over the undirected relation");
        assert!(is_connected(&Topology::new()));
    }
}
