// src/dag/graph.rs

//! Producer -> consumer graph over pending tasks, used for the optional cycle
//! check after resolution.

use std::collections::HashMap;
use std::rc::Rc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::task_dag::PendingTask;
use crate::errors::{DagError, Result};
use crate::task::ProductCell;

/// Build the dependency graph of the pending tasks.
///
/// Edge direction: producer -> consumer. Bindings to products outside the
/// pending set (literals, already executed tasks) add no edge.
pub(crate) fn dependency_graph(pending: &[PendingTask]) -> DiGraphMap<&str, ()> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    let mut producers: HashMap<*const ProductCell, &str> = HashMap::new();

    for p in pending {
        let name = p.task.name();
        graph.add_node(name);
        for product in p.task.products() {
            producers.insert(Rc::as_ptr(&product.handle()), name);
        }
    }

    for p in pending {
        let consumer = p.task.name();
        let bound = p
            .task
            .products()
            .iter()
            .flat_map(|product| product.requirements())
            .filter_map(|r| r.product());

        for product in bound {
            if let Some(&producer) = producers.get(&Rc::as_ptr(product)) {
                graph.add_edge(producer, consumer, ());
            }
        }
    }

    graph
}

/// Fail with [`DagError::DagCycle`] if the bindings form a cycle.
pub(crate) fn check_cycles(pending: &[PendingTask]) -> Result<()> {
    let graph = dependency_graph(pending);

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(DagError::DagCycle(format!(
            "task '{}' depends on itself through its bindings",
            cycle.node_id()
        ))),
    }
}
