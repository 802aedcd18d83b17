/// End-to-end scenarios for `Scheduler` and its placement strategies.
#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use crate::domain::graph::graph::{Dag, Topology};
    use crate::domain::routing::router_type::RouterType;
    use crate::domain::scheduler::context::SchedulingContext;
    use crate::domain::scheduler::queue_policy::DownwardWeightQueue;
    use crate::domain::scheduler::scheduler::Scheduler;
    use crate::domain::scheduler::scheduler_type::SchedulerType;
    use crate::domain::scheduler::transfer_scheduler::{AdvanceTransfers, NoAdvanceTransfers, TransferScheduler};
    use crate::domain::scheduler::unit_priority::{CohesionPriority, UnitPriorityPolicy, UnitRanking};
    use crate::domain::scheduler::unit_selector::{CostAggregation, ModellingSelector, NearestTransferSelector, PrioritySelector, UnitSelector};
    use crate::domain::system::system::System;
    use crate::domain::utils::id::NodeId;
    use crate::error::{Error, Result};

    const PRESETS: [SchedulerType; 4] =
        [SchedulerType::Dummy, SchedulerType::Neighbour, SchedulerType::AdvanceNeighbour, SchedulerType::ModellingNeighbour];

    fn id(value: &str) -> NodeId {
        NodeId::new(value)
    }

    fn dag(nodes: &[(&str, i64)], edges: &[(&str, &str, i64)]) -> Dag {
        let mut dag = Dag::new();
        for (name, weight) in nodes {
            dag.add_node(0.0, 0.0, *weight, Some(id(name))).unwrap();
        }
        for (source, target, weight) in edges {
            dag.add_edge(*source, *target, *weight).unwrap();
        }
        dag
    }

    /// Two units X and Y with one link each, joined by a single edge.
    fn pair_topology() -> Topology {
        let mut topology = Topology::new();
        topology.add_node(0.0, 0.0, 1, Some(id("X"))).unwrap();
        topology.add_node(0.0, 0.0, 1, Some(id("Y"))).unwrap();
        topology.add_edge("X", "Y", 1).unwrap();
        topology
    }

    /// A 2x2 mesh: P - Q, Q - S, S - R, R - P.
    fn mesh_topology() -> Topology {
        let mut topology = Topology::new();
        for name in ["P", "Q", "R", "S"] {
            topology.add_node(0.0, 0.0, 2, Some(id(name))).unwrap();
        }
        for (source, target) in [("P", "Q"), ("Q", "S"), ("S", "R"), ("R", "P")] {
            topology.add_edge(source, target, 1).unwrap();
        }
        topology
    }

    /// C consumes a heavy input from A and a light one from B.
    fn fan_in() -> Dag {
        dag(&[("A", 2), ("B", 2), ("C", 1)], &[("A", "C", 4), ("B", "C", 1)])
    }

    fn layered() -> Dag {
        dag(
            &[("a", 3), ("b", 2), ("c", 4), ("d", 1), ("e", 5), ("f", 2), ("g", 3), ("h", 1)],
            &[
                ("a", "b", 2),
                ("a", "c", 3),
                ("a", "d", 1),
                ("b", "e", 2),
                ("c", "e", 1),
                ("c", "f", 4),
                ("d", "f", 2),
                ("e", "g", 1),
                ("f", "g", 3),
                ("f", "h", 2),
            ],
        )
    }

    fn run(dag: &Dag, topology: &Topology, preset: SchedulerType) -> System {
        let mut system = System::new(topology, false, true);
        Scheduler::new(
            dag,
            topology,
            Box::new(DownwardWeightQueue),
            Box::new(CohesionPriority),
            &mut system,
            RouterType::Dfs.get_instance(topology),
        )
        .with_preset(preset, CostAggregation::Sum)
        .schedule_dag()
        .unwrap();
        system
    }

    fn assert_valid_schedule(dag: &Dag, system: &System) {
        for task in dag.node_ids() {
            let units = system.units_running(task);
            assert_eq!(units.len(), 1, "Task {} must run on exactly one unit, found {:?}", task, units);
            assert_eq!(system.calc_of(task).map(|calc| calc.duration()), dag.node(task).map(|node| node.weight));
        }
        for edge in dag.edges() {
            let source = system.calc_of(&edge.source).unwrap();
            let target = system.calc_of(&edge.target).unwrap();
            assert!(target.start >= source.end, "{} starts at {} before {} ends at {}", edge.target, target.start, edge.source, source.end);
        }
        for unit in system.units() {
            let timeline = unit.timeline();
            for pair in timeline.windows(2) {
                assert!(pair[0].end <= pair[1].start, "Overlapping calculations on unit {}", unit.id);
            }
        }
    }

    #[test]
    fn test_single_unit_runs_tasks_back_to_back() {
        let mut topology = Topology::new();
        topology.add_node(0.0, 0.0, 1, Some(id("U"))).unwrap();
        let dag = layered();

        for preset in PRESETS {
            let system = run(&dag, &topology, preset);

            assert_valid_schedule(&dag, &system);
            assert_eq!(system.duration(), dag.duration_on_one_cpu(), "{:?} must not leave gaps on a single unit", preset);
        }
    }

    #[test]
    fn test_dummy_follows_unit_priority() {
        let dag = dag(&[("A", 2), ("B", 3)], &[("A", "B", 4)]);
        let topology = pair_topology();

        let system = run(&dag, &topology, SchedulerType::Dummy);

        // Equal degree, so Y outranks X and takes both tasks.
        assert_eq!(system.unit_running(&id("A")).unwrap(), id("Y"));
        assert_eq!(system.unit_running(&id("B")).unwrap(), id("Y"));
        assert_eq!(system.duration(), 5);
    }

    #[test]
    fn test_dummy_pays_for_heavy_transfer() {
        let dag = fan_in();
        let topology = pair_topology();

        let system = run(&dag, &topology, SchedulerType::Dummy);

        assert_eq!(system.unit_running(&id("B")).unwrap(), id("Y"));
        assert_eq!(system.unit_running(&id("A")).unwrap(), id("X"));
        assert_eq!(system.unit_running(&id("C")).unwrap(), id("Y"));
        let calc = system.calc_of(&id("C")).unwrap();
        assert_eq!((calc.start, calc.end), (6, 7));
    }

    #[test]
    fn test_neighbour_moves_consumer_to_heavy_producer() {
        let dag = fan_in();
        let topology = pair_topology();

        let system = run(&dag, &topology, SchedulerType::Neighbour);

        assert_eq!(system.unit_running(&id("C")).unwrap(), id("X"));
        let calc = system.calc_of(&id("C")).unwrap();
        assert_eq!((calc.start, calc.end), (3, 4));
        assert_eq!(system.duration(), 4);
    }

    #[test]
    fn test_modelling_finds_earliest_start() {
        let dag = fan_in();
        let topology = pair_topology();

        let system = run(&dag, &topology, SchedulerType::ModellingNeighbour);

        assert_eq!(system.unit_running(&id("C")).unwrap(), id("X"));
        assert_eq!(system.duration(), 4);
        assert_valid_schedule(&dag, &system);
    }

    #[test]
    fn test_every_preset_yields_valid_schedule_on_mesh() {
        let dag = layered();
        let topology = mesh_topology();

        for preset in PRESETS {
            let system = run(&dag, &topology, preset);

            assert_valid_schedule(&dag, &system);
            assert!(system.duration() >= 12, "{:?} beat the critical path with makespan {}", preset, system.duration());
        }
    }

    #[test]
    fn test_schedules_are_deterministic() {
        let dag = layered();
        let topology = mesh_topology();

        for preset in PRESETS {
            let first = run(&dag, &topology, preset);
            let second = run(&dag, &topology, preset);

            for task in dag.node_ids() {
                assert_eq!(first.calc_of(task), second.calc_of(task), "{:?} placed {} differently", preset, task);
            }
        }
    }

    #[test]
    fn test_empty_dag_finishes_immediately() {
        let system = run(&Dag::new(), &pair_topology(), SchedulerType::ModellingNeighbour);

        assert_eq!(system.duration(), 0);
        assert!(system.scheduled().is_empty());
    }

    /// X and Y hang off a two-link hub Z; both are one hop from anything running on Z.
    fn hub_topology() -> Topology {
        let mut topology = Topology::new();
        topology.add_node(0.0, 0.0, 1, Some(id("X"))).unwrap();
        topology.add_node(0.0, 0.0, 1, Some(id("Y"))).unwrap();
        topology.add_node(0.0, 0.0, 2, Some(id("Z"))).unwrap();
        topology.add_edge("X", "Z", 1).unwrap();
        topology.add_edge("Y", "Z", 1).unwrap();
        topology
    }

    #[test]
    fn test_modelling_tie_goes_to_higher_ranked_unit_and_leaves_no_residue() {
        let topology = hub_topology();
        let dag = dag(&[("P", 2), ("Q", 50), ("T", 2)], &[("P", "T", 3)]);
        let mut system = System::new(&topology, false, true);
        system.schedule_calculation(&id("P"), 0, 2, &id("Z")).unwrap();
        system.schedule_calculation(&id("Q"), 2, 50, &id("Z")).unwrap();
        system.new_session();

        let router = RouterType::Dfs.get_instance(&topology);
        let ranking = UnitRanking::new(CohesionPriority.priorities(&topology));
        let transfers = AdvanceTransfers;

        let mut ctx = SchedulingContext { dag: &dag, system: &mut system, router: router.as_ref(), ranking: &ranking, transfer_scheduler: &transfers };
        let chosen = ModellingSelector.choose_unit(&mut ctx, 2, &id("T")).unwrap();

        // Z is busy until 52; X and Y both receive P's output over one hop in [2, 5).
        assert_eq!(ranking.order(), &[id("Z"), id("Y"), id("X")]);
        assert_eq!(chosen, Some(id("Y")));

        assert!(system.units().all(|unit| unit.links().iter().all(|link| link.is_empty())), "Trial transfers must be rolled back");
        assert!(system.unit(&id("X")).unwrap().is_empty());
        assert!(system.unit(&id("Y")).unwrap().is_empty());
        assert_eq!(system.unit(&id("Z")).unwrap().timeline().len(), 2);
        assert_eq!(system.transmissions().count(), 0);
        assert!(system.current_session().is_empty());
    }

    #[test]
    fn test_priority_passes_over_linkless_unit_when_inputs_live_elsewhere() {
        let mut topology = Topology::new();
        topology.add_node(0.0, 0.0, 1, Some(id("X"))).unwrap();
        topology.add_node(0.0, 0.0, 1, Some(id("Y"))).unwrap();
        topology.add_node(0.0, 0.0, 0, Some(id("Z"))).unwrap();
        for (source, target) in [("X", "Y"), ("Y", "Z"), ("Z", "X")] {
            topology.add_edge(source, target, 1).unwrap();
        }
        let dag = dag(&[("A", 2), ("C", 1)], &[("A", "C", 1)]);
        let mut system = System::new(&topology, false, true);
        system.schedule_calculation(&id("A"), 0, 2, &id("X")).unwrap();
        system.new_session();

        let router = RouterType::Dfs.get_instance(&topology);
        let ranking = UnitRanking::new(CohesionPriority.priorities(&topology));
        let mut ctx =
            SchedulingContext { dag: &dag, system: &mut system, router: router.as_ref(), ranking: &ranking, transfer_scheduler: &NoAdvanceTransfers };

        assert_eq!(ranking.order()[0], id("Z"));
        assert!(!ctx.can_receive(&id("C"), &id("Z")).unwrap());
        assert_eq!(ctx.candidates(2, &id("C")).unwrap(), vec![id("X"), id("Y")]);
        assert_eq!(PrioritySelector.choose_unit(&mut ctx, 2, &id("C")).unwrap(), Some(id("Y")));
        assert_eq!(
            NearestTransferSelector::new(CostAggregation::Sum).choose_unit(&mut ctx, 2, &id("C")).unwrap(),
            Some(id("X"))
        );
    }

    fn try_schedule(dag: &Dag, topology: &Topology, preset: SchedulerType) -> (Result<()>, System) {
        let mut system = System::new(topology, false, true);
        let result = Scheduler::new(
            dag,
            topology,
            Box::new(DownwardWeightQueue),
            Box::new(CohesionPriority),
            &mut system,
            RouterType::Dfs.get_instance(topology),
        )
        .with_preset(preset, CostAggregation::Sum)
        .schedule_dag();
        (result, system)
    }

    #[test]
    fn test_empty_topology_reports_unschedulable_tasks() {
        let dag = dag(&[("A", 1)], &[]);

        for preset in PRESETS {
            let (result, system) = try_schedule(&dag, &Topology::new(), preset);

            match result {
                Err(Error::Unschedulable { tick, tasks }) => {
                    assert_eq!(tick, 0, "{:?}", preset);
                    assert_eq!(tasks, vec![id("A")]);
                }
                other => panic!("{:?}: expected unschedulable tasks, got {:?}", preset, other),
            }
            assert!(system.scheduled().is_empty());
        }
    }

    #[test]
    fn test_linkless_units_report_stuck_consumer() {
        let mut topology = Topology::new();
        topology.add_node(0.0, 0.0, 0, Some(id("X"))).unwrap();
        topology.add_node(0.0, 0.0, 0, Some(id("Y"))).unwrap();
        topology.add_edge("X", "Y", 1).unwrap();
        let dag = fan_in();

        for preset in PRESETS {
            let (result, system) = try_schedule(&dag, &topology, preset);

            match result {
                Err(Error::Unschedulable { tick, tasks }) => {
                    assert_eq!(tick, 2, "{:?}", preset);
                    assert_eq!(tasks, vec![id("C")]);
                }
                other => panic!("{:?}: expected unschedulable tasks, got {:?}", preset, other),
            }
            assert_eq!(system.scheduled().into_iter().collect::<Vec<_>>(), vec![id("A"), id("B")]);
            assert_eq!(system.transmissions().count(), 0);
        }
    }

    /// Runs each listed task on its pinned unit once that unit is free.
    #[derive(Debug)]
    struct PinnedSelector(Vec<(NodeId, NodeId)>);

    impl UnitSelector for PinnedSelector {
        fn choose_unit(&self, ctx: &mut SchedulingContext<'_>, time: i64, task: &NodeId) -> Result<Option<NodeId>> {
            let pinned = self.0.iter().find(|(pinned, _)| pinned == task).map(|(_, unit)| unit.clone());
            Ok(pinned.filter(|unit| ctx.system.unit(unit).is_some_and(|unit| unit.is_free(time))))
        }
    }

    #[test]
    fn test_infeasible_transfer_defers_task_instead_of_aborting() {
        // The only route from Y to X crosses Z, which has no links.
        let mut topology = Topology::new();
        topology.add_node(0.0, 0.0, 1, Some(id("X"))).unwrap();
        topology.add_node(0.0, 0.0, 1, Some(id("Y"))).unwrap();
        topology.add_node(0.0, 0.0, 0, Some(id("Z"))).unwrap();
        topology.add_edge("X", "Z", 1).unwrap();
        topology.add_edge("Z", "Y", 1).unwrap();
        let dag = dag(&[("A", 2), ("C", 1)], &[("A", "C", 1)]);
        let mut system = System::new(&topology, false, true);

        let result = Scheduler::new(
            &dag,
            &topology,
            Box::new(DownwardWeightQueue),
            Box::new(CohesionPriority),
            &mut system,
            RouterType::Dfs.get_instance(&topology),
        )
        .with_unit_selector(Box::new(PinnedSelector(vec![(id("A"), id("Y")), (id("C"), id("X"))])))
        .schedule_dag();

        assert!(matches!(result, Err(Error::Unschedulable { tick: 2, ref tasks }) if tasks == &vec![id("C")]), "Got {:?}", result);
        assert_eq!(system.unit_running(&id("A")).unwrap(), id("Y"));
        assert!(system.units().all(|unit| unit.links().iter().all(|link| link.is_empty())));
        assert!(system.current_session().is_empty());
    }

    #[test]
    fn test_advance_transfers_start_when_producer_ends() {
        let topology = pair_topology();
        let dag = dag(&[("A", 2), ("C", 1)], &[("A", "C", 3)]);
        let router = RouterType::Dfs.get_instance(&topology);
        let ranking = UnitRanking::new(CohesionPriority.priorities(&topology));

        let strategies: [(&dyn TransferScheduler, i64); 2] = [(&NoAdvanceTransfers, 8), (&AdvanceTransfers, 5)];
        for (transfers, expected) in strategies {
            let mut system = System::new(&topology, false, true);
            system.schedule_calculation(&id("A"), 0, 2, &id("X")).unwrap();
            system.new_session();

            let mut ctx =
                SchedulingContext { dag: &dag, system: &mut system, router: router.as_ref(), ranking: &ranking, transfer_scheduler: transfers };
            let ready = transfers.schedule_transfers(&mut ctx, 5, &id("C"), &id("Y")).unwrap();

            assert_eq!(ready, expected, "{:?}", transfers);
        }
    }

    #[test]
    fn test_advance_never_reports_ready_before_candidate_time() {
        let topology = pair_topology();
        let dag = dag(&[("A", 2), ("C", 1)], &[("A", "C", 1)]);
        let router = RouterType::Dfs.get_instance(&topology);
        let ranking = UnitRanking::new(CohesionPriority.priorities(&topology));
        let mut system = System::new(&topology, false, true);
        system.schedule_calculation(&id("A"), 0, 2, &id("X")).unwrap();

        let mut ctx = SchedulingContext { dag: &dag, system: &mut system, router: router.as_ref(), ranking: &ranking, transfer_scheduler: &AdvanceTransfers };
        let ready = AdvanceTransfers.schedule_transfers(&mut ctx, 10, &id("C"), &id("Y")).unwrap();

        assert_eq!(ready, 10);
    }

    #[test]
    fn test_disconnected_topology_is_fatal() {
        let mut topology = pair_topology();
        topology.delete_edge(&id("X"), &id("Y")).unwrap();
        let dag = fan_in();
        let mut system = System::new(&topology, false, true);

        let result = Scheduler::new(
            &dag,
            &topology,
            Box::new(DownwardWeightQueue),
            Box::new(CohesionPriority),
            &mut system,
            RouterType::Dfs.get_instance(&topology),
        )
        .with_preset(SchedulerType::Neighbour, CostAggregation::Max)
        .schedule_dag();

        assert!(matches!(result, Err(Error::NoRoute { .. })), "Got {:?}", result);
    }

    #[test]
    fn test_cyclic_dag_is_rejected() {
        let dag = dag(&[("A", 1), ("B", 1)], &[("A", "B", 1), ("B", "A", 1)]);
        let topology = pair_topology();
        let mut system = System::new(&topology, false, true);

        let result = Scheduler::new(
            &dag,
            &topology,
            Box::new(DownwardWeightQueue),
            Box::new(CohesionPriority),
            &mut system,
            RouterType::Dfs.get_instance(&topology),
        )
        .schedule_dag();

        assert!(matches!(result, Err(Error::CyclicGraph(_))));
        assert!(system.scheduled().is_empty());
    }

    #[test]
    fn test_tick_limit_aborts_long_runs() {
        let dag = dag(&[("A", 10)], &[]);
        let topology = pair_topology();
        let mut system = System::new(&topology, false, true);

        let result = Scheduler::new(
            &dag,
            &topology,
            Box::new(DownwardWeightQueue),
            Box::new(CohesionPriority),
            &mut system,
            RouterType::Dfs.get_instance(&topology),
        )
        .with_max_ticks(Some(3))
        .schedule_dag();

        assert!(matches!(result, Err(Error::TickLimitExceeded(3))));
    }

    #[traced_test]
    #[test]
    fn test_placements_are_traced() {
        let dag = fan_in();
        let topology = pair_topology();

        run(&dag, &topology, SchedulerType::Neighbour);

        assert!(logs_contain("Scheduling started"));
        assert!(logs_contain("Task placed"));
        assert!(logs_contain("Scheduling finished"));
    }
}
