// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Whole-tree traversal of nested adapters.

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashSet;

use crate::{ChildAdapter, WrapperAdapter};

/// Every adapter reachable from `root`, pre-order, each instance once.
pub fn collect_adapters<H>(root: &ChildAdapter<H>) -> Vec<ChildAdapter<H>> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(adapter) = stack.pop() {
        if !visited.insert(adapter.key()) {
            continue;
        }
        if let Some(wrapper) = adapter.as_wrapper() {
            stack.extend(wrapper.wrapped_adapters().into_iter().rev());
        }
        order.push(adapter);
    }
    order
}

/// Releases every wrapper reachable from `root`, children before parents.
///
/// A wrapper shared by several parents is released once. Plain adapters are
/// left alone. Returns the number of wrappers released.
pub fn release_tree<H>(root: &ChildAdapter<H>) -> usize {
    let mut visited = HashSet::new();
    let mut order: Vec<Rc<dyn WrapperAdapter<H>>> = Vec::new();
    // The flag marks a wrapper whose children are already on the stack.
    let mut stack = vec![(root.clone(), false)];
    while let Some((adapter, expanded)) = stack.pop() {
        let Some(wrapper) = adapter.as_wrapper() else {
            continue;
        };
        if expanded {
            order.push(wrapper.clone());
            continue;
        }
        if !visited.insert(adapter.key()) {
            continue;
        }
        let children = wrapper.wrapped_adapters();
        stack.push((adapter, true));
        stack.extend(children.into_iter().rev().map(|child| (child, false)));
    }

    // Releasing empties `wrapped_adapters`, so the whole order is fixed first.
    for wrapper in &order {
        wrapper.release();
    }
    tracing::debug!(released = order.len(), "released adapter tree");
    order.len()
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;

    use super::{collect_adapters, release_tree};
    use crate::test_support::{Holder, TestAdapter};
    use crate::{ChildAdapter, CompositeAdapter, SimpleRelayAdapter};

    #[test]
    fn shared_wrappers_are_visited_once() {
        let leaf = TestAdapter::new(2);
        let inner = CompositeAdapter::<Holder>::new();
        inner.add_adapter(ChildAdapter::plain(leaf.clone())).unwrap();
        let relay = SimpleRelayAdapter::new(ChildAdapter::wrapper(inner.clone())).unwrap();
        let root = CompositeAdapter::<Holder>::new();
        root.add_adapter(ChildAdapter::wrapper(inner.clone())).unwrap();
        root.add_adapter(ChildAdapter::wrapper(relay.clone())).unwrap();

        let root = ChildAdapter::wrapper(root);
        let keys: alloc::vec::Vec<_> = collect_adapters(&root).iter().map(|a| a.key()).collect();
        assert_eq!(
            keys,
            [
                root.key(),
                ChildAdapter::wrapper(inner.clone()).key(),
                ChildAdapter::plain(leaf.clone()).key(),
                ChildAdapter::wrapper(relay.clone()).key(),
            ]
        );

        assert_eq!(release_tree(&root), 3);
        assert!(inner.is_released());
        assert!(!relay.is_wrapped_adapter_alive());
        assert!(leaf.observers.is_empty());
        assert_eq!(Rc::strong_count(&relay), 1);
    }
}
