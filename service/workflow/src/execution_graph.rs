use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use domain_workflow::{
    exception::{WorkflowException, WorkflowResult},
    model::vo::WorkflowDag,
};
use uuid::Uuid;

use crate::runnable::TaskExecutionRunnable;

/// The static dag plus one instance's dynamic readiness: stored runnables,
/// skip overlays and the begin-node subset of a partial or resumed run.
pub struct WorkflowExecutionGraph {
    dag: WorkflowDag,
    /// Nodes this run may execute; the whole dag when no begin subset was
    /// given, otherwise the forward closure of the begin nodes.
    reachable: HashSet<String>,
    runnables: HashMap<String, Arc<TaskExecutionRunnable>>,
    code_to_name: HashMap<i64, String>,
    skipped: HashSet<String>,
    succeeded: HashSet<String>,
}

impl std::fmt::Debug for WorkflowExecutionGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowExecutionGraph")
            .field("dag", &self.dag)
            .field("reachable", &self.reachable)
            .field("runnables", &self.runnables.keys().collect::<Vec<_>>())
            .field("code_to_name", &self.code_to_name)
            .field("skipped", &self.skipped)
            .field("succeeded", &self.succeeded)
            .finish()
    }
}

impl WorkflowExecutionGraph {
    pub fn new(dag: WorkflowDag, begin_nodes: &[String]) -> WorkflowResult<Self> {
        let reachable = if begin_nodes.is_empty() {
            dag.node_names().map(ToOwned::to_owned).collect()
        } else {
            Self::forward_closure(&dag, begin_nodes)?
        };
        let skipped = dag
            .node_names()
            .filter(|n| dag.is_skip(n).unwrap_or(false))
            .map(ToOwned::to_owned)
            .collect();
        Ok(Self {
            dag,
            reachable,
            runnables: HashMap::new(),
            code_to_name: HashMap::new(),
            skipped,
            succeeded: HashSet::new(),
        })
    }

    /// Every node reachable from the begin set, begin nodes included. The
    /// walk visits each node at most once, so a cycle that survived
    /// upstream validation cannot hang it.
    fn forward_closure(dag: &WorkflowDag, begin_nodes: &[String]) -> WorkflowResult<HashSet<String>> {
        let mut seen = HashSet::new();
        let mut frontier: VecDeque<String> = VecDeque::new();
        for name in begin_nodes {
            if !dag.contains(name) {
                return Err(WorkflowException::NoSuchNode { name: name.clone() });
            }
            frontier.push_back(name.clone());
        }
        while let Some(name) = frontier.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            for succ in dag.successors(&name)? {
                frontier.push_back(succ.to_owned());
            }
        }
        Ok(seen)
    }

    pub fn dag(&self) -> &WorkflowDag {
        &self.dag
    }

    pub fn store_runnable(&mut self, runnable: Arc<TaskExecutionRunnable>) {
        self.code_to_name.insert(runnable.task_code, runnable.node_name().to_owned());
        self.runnables.insert(runnable.node_name().to_owned(), runnable);
    }

    pub fn runnable_by_name(&self, name: &str) -> Option<&Arc<TaskExecutionRunnable>> {
        self.runnables.get(name)
    }

    pub fn runnable_by_code(&self, task_code: i64) -> Option<&Arc<TaskExecutionRunnable>> {
        self.code_to_name.get(&task_code).and_then(|n| self.runnables.get(n))
    }

    pub fn runnable_by_instance_id(&self, id: Uuid) -> Option<&Arc<TaskExecutionRunnable>> {
        self.runnables
            .values()
            .find(|r| r.instance().map(|i| i.id == id).unwrap_or(false))
    }

    pub fn runnables(&self) -> impl Iterator<Item = &Arc<TaskExecutionRunnable>> {
        self.runnables.values()
    }

    pub fn mark_skip(&mut self, name: &str) {
        self.skipped.insert(name.to_owned());
    }

    pub fn mark_succeeded(&mut self, name: &str) {
        self.succeeded.insert(name.to_owned());
    }

    pub fn is_skipped(&self, name: &str) -> bool {
        self.skipped.contains(name)
    }

    pub fn is_succeeded(&self, name: &str) -> bool {
        self.succeeded.contains(name)
    }

    pub fn is_reachable(&self, name: &str) -> bool {
        self.reachable.contains(name)
    }

    /// A node may run when it is part of this run and every direct
    /// predecessor inside the run finished successfully or is skipped.
    pub fn is_ready(&self, name: &str) -> WorkflowResult<bool> {
        if !self.is_reachable(name) || self.is_succeeded(name) {
            return Ok(false);
        }
        for pred in self.dag.predecessors(name)? {
            if !self.is_reachable(pred) {
                continue;
            }
            if !self.is_succeeded(pred) && !self.is_skipped(pred) {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// All currently-ready nodes, sorted for deterministic submission.
    pub fn ready_nodes(&self) -> WorkflowResult<Vec<String>> {
        let mut ready = vec![];
        for name in self.reachable.iter() {
            if self.is_skipped(name) {
                continue;
            }
            if self.is_ready(name)? {
                ready.push(name.clone());
            }
        }
        ready.sort_unstable();
        Ok(ready)
    }

    /// Skipped nodes whose predecessors settled; they complete without an
    /// attempt so their successors can proceed.
    pub fn releasable_skips(&self) -> WorkflowResult<Vec<String>> {
        let mut out = vec![];
        for name in self.skipped.iter() {
            if !self.is_reachable(name) || self.is_succeeded(name) {
                continue;
            }
            let mut settled = true;
            for pred in self.dag.predecessors(name)? {
                if self.is_reachable(pred) && !self.is_succeeded(pred) && !self.is_skipped(pred) {
                    settled = false;
                    break;
                }
            }
            if settled {
                out.push(name.clone());
            }
        }
        out.sort_unstable();
        Ok(out)
    }

    /// Every node of this run settled (succeeded or skipped).
    pub fn all_done(&self) -> bool {
        self.reachable.iter().all(|n| self.is_succeeded(n) || self.is_skipped(n))
    }
}

#[cfg(test)]
mod tests {
    use domain_workflow::model::{entity::TaskDefinition, vo::DagNode};

    use super::*;

    fn diamond() -> WorkflowDag {
        WorkflowDag::builder()
            .add_node(DagNode::new("a"))
            .add_node(DagNode::new("b"))
            .add_node(DagNode::new("c"))
            .add_node(DagNode::new("d"))
            .add_edge("a", "b")
            .add_edge("a", "c")
            .add_edge("b", "d")
            .add_edge("c", "d")
            .build()
            .unwrap()
    }

    #[test]
    fn readiness_follows_predecessor_completion() {
        let mut graph = WorkflowExecutionGraph::new(diamond(), &[]).unwrap();
        assert_eq!(graph.ready_nodes().unwrap(), vec!["a"]);

        graph.mark_succeeded("a");
        assert_eq!(graph.ready_nodes().unwrap(), vec!["b", "c"]);

        graph.mark_succeeded("b");
        // d still waits on c.
        assert_eq!(graph.ready_nodes().unwrap(), vec!["c"]);

        graph.mark_succeeded("c");
        assert_eq!(graph.ready_nodes().unwrap(), vec!["d"]);
        assert!(!graph.all_done());
        graph.mark_succeeded("d");
        assert!(graph.all_done());
    }

    #[test]
    fn skipped_predecessor_counts_as_finished() {
        let mut graph = WorkflowExecutionGraph::new(diamond(), &[]).unwrap();
        graph.mark_succeeded("a");
        graph.mark_skip("b");
        graph.mark_succeeded("c");
        assert!(graph.is_ready("d").unwrap());
    }

    #[test]
    fn begin_subset_limits_the_run() {
        let graph = WorkflowExecutionGraph::new(diamond(), &["b".to_owned()]).unwrap();
        assert!(graph.is_reachable("b"));
        assert!(graph.is_reachable("d"));
        assert!(!graph.is_reachable("a"));
        assert!(!graph.is_reachable("c"));
        // b's predecessor a is outside the run, so b is immediately ready.
        assert_eq!(graph.ready_nodes().unwrap(), vec!["b"]);
    }

    #[test]
    fn unknown_begin_node_is_rejected() {
        let err = WorkflowExecutionGraph::new(diamond(), &["ghost".to_owned()]).unwrap_err();
        assert!(matches!(err, WorkflowException::NoSuchNode { .. }));
    }

    #[test]
    fn runnables_are_found_by_name_and_code() {
        let mut graph = WorkflowExecutionGraph::new(diamond(), &[]).unwrap();
        let definition = TaskDefinition {
            code: 42,
            name: "a".into(),
            ..Default::default()
        };
        graph.store_runnable(Arc::new(TaskExecutionRunnable::new(Uuid::new_v4(), definition)));
        assert!(graph.runnable_by_name("a").is_some());
        assert_eq!(graph.runnable_by_code(42).unwrap().node_name(), "a");
        assert!(graph.runnable_by_code(7).is_none());
    }
}
