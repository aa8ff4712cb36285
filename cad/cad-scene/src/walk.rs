//! Pre-order traversal of a document's node arena.
//!
//! The walk uses an explicit stack, so document depth is bounded by memory
//! rather than the call stack, and records every node it enters. Entering a
//! node twice ends the walk with [`SceneError::Cycle`].

use cad_types::{GeometrySource, NodeId, SceneNode};
use hashbrown::HashSet;

use crate::error::{SceneError, SceneResult};

/// A node reached by the walk.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Visit<'d> {
    /// Arena id of the node.
    pub id: NodeId,
    /// The node record.
    pub node: &'d SceneNode,
    /// Visit number of the parent, counting from 0 in pre-order; `None`
    /// for the root.
    pub parent: Option<usize>,
}

/// Depth-first, pre-order walk from the document root.
///
/// Yields visits in exactly the order a recursive walk would. After the
/// first error the iterator is exhausted.
pub(crate) struct PreOrder<'d, D: GeometrySource> {
    source: &'d D,
    stack: Vec<(NodeId, Option<usize>)>,
    visited: HashSet<NodeId>,
    next_slot: usize,
}

impl<'d, D: GeometrySource> PreOrder<'d, D> {
    pub(crate) fn new(source: &'d D) -> Self {
        Self {
            source,
            stack: vec![(source.root(), None)],
            visited: HashSet::with_capacity(source.node_count()),
            next_slot: 0,
        }
    }

    fn fail(&mut self, error: SceneError) -> Option<SceneResult<Visit<'d>>> {
        self.stack.clear();
        Some(Err(error))
    }
}

impl<'d, D: GeometrySource> Iterator for PreOrder<'d, D> {
    type Item = SceneResult<Visit<'d>>;

    fn next(&mut self) -> Option<Self::Item> {
        let (id, parent) = self.stack.pop()?;

        if !self.visited.insert(id) {
            return self.fail(SceneError::Cycle { node: id });
        }
        let Some(node) = self.source.node(id) else {
            return self.fail(SceneError::MissingNode { node: id });
        };

        let slot = self.next_slot;
        self.next_slot += 1;
        self.stack
            .extend(node.children.iter().rev().map(|&child| (child, Some(slot))));

        Some(Ok(Visit { id, node, parent }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use cad_types::Scene;

    fn names(scene: &Scene) -> SceneResult<Vec<String>> {
        PreOrder::new(scene)
            .map(|visit| visit.map(|v| v.node.name.clone()))
            .collect()
    }

    #[test]
    fn visits_in_pre_order() {
        let mut scene = Scene::new("root");
        let root = scene.root();
        let a = scene.add_group(root, "a");
        scene.add_group(a, "a1");
        scene.add_group(a, "a2");
        scene.add_group(root, "b");

        assert_eq!(names(&scene).unwrap(), ["root", "a", "a1", "a2", "b"]);
    }

    #[test]
    fn parents_point_at_earlier_slots() {
        let mut scene = Scene::new("root");
        let root = scene.root();
        let a = scene.add_group(root, "a");
        scene.add_group(a, "a1");
        scene.add_group(root, "b");

        let visits: Vec<_> = PreOrder::new(&scene).map(Result::unwrap).collect();
        let parents: Vec<_> = visits.iter().map(|v| v.parent).collect();
        assert_eq!(parents, [None, Some(0), Some(1), Some(0)]);
        assert!(
            visits
                .iter()
                .enumerate()
                .all(|(i, v)| v.parent.is_none_or(|p| p < i))
        );
    }

    #[test]
    fn cycle_is_reported_once() {
        let mut scene = Scene::new("root");
        let root = scene.root();
        let a = scene.add_group(root, "a");
        scene.link(a, root);

        let results: Vec<_> = PreOrder::new(&scene).collect();
        assert_eq!(results.len(), 3);
        assert!(matches!(
            results.last(),
            Some(Err(SceneError::Cycle { node })) if *node == root
        ));
    }

    #[test]
    fn shared_child_is_rejected() {
        let mut scene = Scene::new("root");
        let root = scene.root();
        let a = scene.add_group(root, "a");
        let b = scene.add_group(root, "b");
        let shared = scene.add_group(a, "shared");
        scene.link(b, shared);

        assert_eq!(names(&scene), Err(SceneError::Cycle { node: shared }));
    }

    #[test]
    fn dangling_child_is_rejected() {
        let mut scene = Scene::new("root");
        let root = scene.root();
        scene.link(root, NodeId(7));

        assert_eq!(
            names(&scene),
            Err(SceneError::MissingNode { node: NodeId(7) })
        );
    }
}
