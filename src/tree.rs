//! Tree Utilities
//!
//! Conversion between the store's flat parented records and nested trees,
//! plus the pre-order projection used for rendering.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::models::{Task, TaskId, TaskList, ListId};

/// A node of a nested tree keyed by id with a back-reference to its parent
pub trait TreeNode: Sized {
    type Id: Copy + Eq + Hash + Debug;

    fn id(&self) -> Self::Id;
    fn parent_id(&self) -> Option<Self::Id>;
    fn set_parent_id(&mut self, parent_id: Option<Self::Id>);
    fn children(&self) -> &[Self];
    fn children_mut(&mut self) -> &mut Vec<Self>;
    /// Copy of this node with an empty `children`
    fn without_children(&self) -> Self;

    /// Whether the flattened projection walks into this node's children
    fn descend(&self) -> bool {
        true
    }
}

impl TreeNode for Task {
    type Id = TaskId;

    fn id(&self) -> TaskId {
        self.id
    }

    fn parent_id(&self) -> Option<TaskId> {
        self.parent_id
    }

    fn set_parent_id(&mut self, parent_id: Option<TaskId>) {
        self.parent_id = parent_id;
    }

    fn children(&self) -> &[Task] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<Task> {
        &mut self.children
    }

    fn without_children(&self) -> Self {
        Task {
            id: self.id,
            title: self.title.clone(),
            completed: self.completed,
            parent_id: self.parent_id,
            level: self.level,
            children: Vec::new(),
            priority: self.priority,
            due_date: self.due_date,
            tags: self.tags.clone(),
            expanded: self.expanded,
        }
    }

    fn descend(&self) -> bool {
        self.expanded
    }
}

impl TreeNode for TaskList {
    type Id = ListId;

    fn id(&self) -> ListId {
        self.id
    }

    fn parent_id(&self) -> Option<ListId> {
        self.parent_id
    }

    fn set_parent_id(&mut self, parent_id: Option<ListId>) {
        self.parent_id = parent_id;
    }

    fn children(&self) -> &[TaskList] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<TaskList> {
        &mut self.children
    }

    fn without_children(&self) -> Self {
        TaskList {
            id: self.id,
            title: self.title.clone(),
            kind: self.kind,
            parent_id: self.parent_id,
            children: Vec::new(),
        }
    }
}

/// Build nested roots from flat parented items.
///
/// Items whose parent is missing become roots. Duplicate ids keep the first
/// occurrence. Nodes caught in a parent cycle are surfaced as roots.
/// Children keep their input order.
pub fn build_hierarchy<T: TreeNode>(flat: Vec<T>) -> Vec<T> {
    let mut order: Vec<T::Id> = Vec::with_capacity(flat.len());
    let mut nodes: HashMap<T::Id, T> = HashMap::with_capacity(flat.len());

    // First pass: index by id
    for mut item in flat {
        let id = item.id();
        if nodes.contains_key(&id) {
            log::warn!("[TREE] Duplicate id {:?} dropped", id);
            continue;
        }
        item.children_mut().clear();
        order.push(id);
        nodes.insert(id, item);
    }

    // Second pass: group under parents
    let mut children_of: HashMap<T::Id, Vec<T::Id>> = HashMap::new();
    let mut roots = Vec::new();
    for id in &order {
        match nodes.get(id).and_then(|n| n.parent_id()) {
            Some(pid) if pid != *id && nodes.contains_key(&pid) => {
                children_of.entry(pid).or_default().push(*id);
            }
            Some(pid) => {
                log::debug!("[TREE] {:?} references missing parent {:?}, kept as root", id, pid);
                roots.push(*id);
            }
            None => roots.push(*id),
        }
    }

    fn assemble<T: TreeNode>(
        id: T::Id,
        nodes: &mut HashMap<T::Id, T>,
        children_of: &HashMap<T::Id, Vec<T::Id>>,
    ) -> Option<T> {
        let mut node = nodes.remove(&id)?;
        if let Some(kids) = children_of.get(&id) {
            for kid in kids {
                if let Some(child) = assemble(*kid, nodes, children_of) {
                    node.children_mut().push(child);
                }
            }
        }
        Some(node)
    }

    let mut result = Vec::with_capacity(roots.len());
    for id in roots {
        if let Some(mut node) = assemble(id, &mut nodes, &children_of) {
            node.set_parent_id(None);
            result.push(node);
        }
    }

    // Anything left is unreachable from a root (parent cycle)
    for id in &order {
        if nodes.contains_key(id) {
            log::warn!("[TREE] {:?} is part of a parent cycle, surfaced as root", id);
            if let Some(mut node) = assemble(*id, &mut nodes, &children_of) {
                node.set_parent_id(None);
                result.push(node);
            }
        }
    }
    result
}

/// A node in display order with its depth from the roots
#[derive(Debug)]
pub struct FlatEntry<'a, T> {
    pub node: &'a T,
    pub depth: usize,
}

/// Lazy pre-order walk over a forest
pub struct Flatten<'a, T> {
    stack: Vec<(std::slice::Iter<'a, T>, usize)>,
    respect_descend: bool,
}

impl<'a, T: TreeNode> Iterator for Flatten<'a, T> {
    type Item = FlatEntry<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (iter, depth) = self.stack.last_mut()?;
            let depth = *depth;
            match iter.next() {
                Some(node) => {
                    let walk_in = !self.respect_descend || node.descend();
                    if walk_in && !node.children().is_empty() {
                        self.stack.push((node.children().iter(), depth + 1));
                    }
                    return Some(FlatEntry { node, depth });
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Parent-before-children walk that skips the subtrees of collapsed nodes
pub fn flatten<T: TreeNode>(roots: &[T]) -> Flatten<'_, T> {
    Flatten {
        stack: vec![(roots.iter(), 0)],
        respect_descend: true,
    }
}

/// Like `flatten` but walks every subtree
pub fn flatten_all<T: TreeNode>(roots: &[T]) -> Flatten<'_, T> {
    Flatten {
        stack: vec![(roots.iter(), 0)],
        respect_descend: false,
    }
}

/// Flat parented copies of every node, ready for `build_hierarchy`
pub fn to_flat<T: TreeNode>(roots: &[T]) -> Vec<T> {
    flatten_all(roots).map(|e| e.node.without_children()).collect()
}

pub fn find<T: TreeNode>(roots: &[T], id: T::Id) -> Option<&T> {
    for node in roots {
        if node.id() == id {
            return Some(node);
        }
        if let Some(found) = find(node.children(), id) {
            return Some(found);
        }
    }
    None
}

pub fn find_mut<T: TreeNode>(roots: &mut [T], id: T::Id) -> Option<&mut T> {
    for node in roots.iter_mut() {
        if node.id() == id {
            return Some(node);
        }
        if let Some(found) = find_mut(node.children_mut(), id) {
            return Some(found);
        }
    }
    None
}

/// Sibling vector holding `parent`'s children, or the roots for `None`
pub fn siblings_mut<T: TreeNode>(roots: &mut Vec<T>, parent: Option<T::Id>) -> Option<&mut Vec<T>> {
    match parent {
        None => Some(roots),
        Some(pid) => find_mut(roots, pid).map(|p| p.children_mut()),
    }
}

/// Remove a node (with its subtree) wherever it is. Returns the detached
/// node and the index it held among its siblings.
pub fn detach<T: TreeNode>(roots: &mut Vec<T>, id: T::Id) -> Option<(T, usize)> {
    if let Some(index) = roots.iter().position(|n| n.id() == id) {
        return Some((roots.remove(index), index));
    }
    roots.iter_mut().find_map(|n| detach(n.children_mut(), id))
}

/// Whether `id` is `node` or one of its descendants
pub fn contains<T: TreeNode>(node: &T, id: T::Id) -> bool {
    node.id() == id || node.children().iter().any(|c| contains(c, id))
}

pub fn count_descendants<T: TreeNode>(node: &T) -> usize {
    node.children().iter().map(|c| 1 + count_descendants(c)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListKind;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn make_task(id: u32, parent_id: Option<u32>) -> Task {
        Task {
            parent_id,
            ..Task::new(id, &format!("Task {}", id))
        }
    }

    fn ids_and_depths(roots: &[Task]) -> Vec<(u32, usize)> {
        flatten(roots).map(|e| (e.node.id, e.depth)).collect()
    }

    #[test]
    fn test_flatten_tree() {
        let items = vec![
            make_task(1, None),    // Root 1
            make_task(2, None),    // Root 2
            make_task(3, Some(1)), // Child of 1
            make_task(4, Some(1)), // Child of 1
            make_task(5, Some(3)), // Child of 3 (grandchild of 1)
        ];

        let tree = build_hierarchy(items);

        // Should be: 1 (depth 0), 3 (depth 1), 5 (depth 2), 4 (depth 1), 2 (depth 0)
        assert_eq!(ids_and_depths(&tree), vec![(1, 0), (3, 1), (5, 2), (4, 1), (2, 0)]);
    }

    #[test]
    fn test_flatten_skips_collapsed() {
        let mut tree = build_hierarchy(vec![
            make_task(1, None),
            make_task(2, Some(1)),
            make_task(3, Some(2)),
            make_task(4, None),
        ]);
        find_mut(&mut tree, 2).unwrap().expanded = false;
        assert_eq!(ids_and_depths(&tree), vec![(1, 0), (2, 1), (4, 0)]);
        assert_eq!(flatten_all(&tree).count(), 4);
    }

    #[test]
    fn test_flatten_is_restartable() {
        let tree = build_hierarchy(vec![make_task(1, None), make_task(2, Some(1))]);
        let first: Vec<_> = flatten(&tree).map(|e| e.node.id).collect();
        let second: Vec<_> = flatten(&tree).map(|e| e.node.id).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_list_folders_always_descend() {
        let mut folder = TaskList::new(1, "Folder", ListKind::Folder);
        let mut child = TaskList::new(2, "Inbox", ListKind::Leaf);
        child.parent_id = Some(1);
        folder.children.push(child);
        let ids: Vec<_> = flatten(std::slice::from_ref(&folder)).map(|e| e.node.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_orphans_become_roots() {
        let tree = build_hierarchy(vec![make_task(1, None), make_task(2, Some(99))]);
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[1].id, 2);
        assert_eq!(tree[1].parent_id, None);
    }

    #[test]
    fn test_cycles_are_not_lost() {
        let tree = build_hierarchy(vec![
            make_task(1, Some(2)),
            make_task(2, Some(1)),
            make_task(3, Some(3)),
        ]);
        assert_eq!(flatten_all(&tree).count(), 3);
    }

    #[test]
    fn test_duplicates_keep_first() {
        let mut dup = make_task(1, None);
        dup.title = "second".into();
        let tree = build_hierarchy(vec![make_task(1, None), dup]);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].title, "Task 1");
    }

    #[test]
    fn test_detach_and_counts() {
        let mut tree = build_hierarchy(vec![
            make_task(1, None),
            make_task(2, Some(1)),
            make_task(3, Some(2)),
            make_task(4, Some(1)),
        ]);
        assert_eq!(count_descendants(&tree[0]), 3);
        assert!(contains(&tree[0], 3));
        let (node, index) = detach(&mut tree, 2).unwrap();
        assert_eq!(index, 0);
        assert_eq!(node.children.len(), 1);
        assert_eq!(count_descendants(&tree[0]), 1);
        assert!(detach(&mut tree, 2).is_none());
    }

    /// Random forest as flat records: each node's parent is an earlier node or none
    fn forest() -> impl Strategy<Value = Vec<Task>> {
        prop::collection::vec(prop::option::weighted(0.7, any::<prop::sample::Index>()), 0..40)
            .prop_map(|parents| {
                parents
                    .into_iter()
                    .enumerate()
                    .map(|(i, parent)| {
                        let id = i as u32 + 1;
                        let parent_id = match parent {
                            Some(ix) if i > 0 => Some(ix.index(i) as u32 + 1),
                            _ => None,
                        };
                        make_task(id, parent_id)
                    })
                    .collect()
            })
    }

    fn pairs(roots: &[Task]) -> HashSet<(u32, Option<u32>)> {
        flatten(roots).map(|e| (e.node.id, e.node.parent_id)).collect()
    }

    proptest! {
        #[test]
        fn prop_round_trip_preserves_parent_pairs(flat in forest()) {
            let tree = build_hierarchy(flat);
            let once = to_flat(&tree);
            let rebuilt = build_hierarchy(once);
            prop_assert_eq!(pairs(&tree), pairs(&rebuilt));
            prop_assert_eq!(flatten(&tree).count(), flatten(&rebuilt).count());
        }
    }
}
