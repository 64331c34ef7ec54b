//! Invariants of traces and widget snapshots

use std::sync::Arc;
use std::thread;

use proptest::prelude::*;
use tdoc_debug::{DispatchedEvent, EventLog, WidgetTree};
use tdoc_test_utils::MockWidget;

/// Random widget graph with unique identities
fn widget_graph() -> impl Strategy<Value = MockWidget> {
    let leaf = prop_oneof![Just("Button"), Just("Label"), Just("Static"), Just("Input")]
        .prop_map(|kind| MockWidget::new(kind, 0));
    leaf.prop_recursive(5, 48, 4, |inner| {
        (
            prop_oneof![Just("Vertical"), Just("Horizontal"), Just("Container")],
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(kind, children)| {
                children
                    .into_iter()
                    .fold(MockWidget::new(kind, 0), MockWidget::child)
            })
    })
    .prop_map(|mut root| {
        let mut next = 1;
        number(&mut root, &mut next);
        root
    })
}

fn number(widget: &mut MockWidget, next: &mut u64) {
    widget.identity = *next;
    *next += 1;
    for child in &mut widget.children {
        number(child, next);
    }
}

proptest! {
    #[test]
    fn snapshot_is_single_rooted_tree(root in widget_graph()) {
        let tree = WidgetTree::walk(&root);
        prop_assert_eq!(tree.len(), root.count());
        prop_assert_eq!(tree.roots().len(), 1);

        for node in tree.nodes() {
            let parents = tree
                .nodes()
                .iter()
                .filter(|p| p.children.contains(&node.name))
                .count();
            match &node.parent {
                Some(parent) => {
                    prop_assert_eq!(parents, 1);
                    prop_assert!(tree.get(parent).unwrap().children.contains(&node.name));
                }
                None => prop_assert_eq!(parents, 0),
            }
            for child in &node.children {
                prop_assert_eq!(tree.get(child).unwrap().parent.as_deref(), Some(node.name.as_str()));
            }
        }
    }

    #[test]
    fn timestamps_never_decrease(threads in 1usize..6, per_thread in 1usize..40) {
        let log = Arc::new(EventLog::new());
        let handles: Vec<_> = (0..threads)
            .map(|t| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for i in 0..per_thread {
                        log.record(&DispatchedEvent::new(
                            format!("on_worker_{t}"),
                            format!("Tick({i})"),
                            "Tick",
                            "App",
                        ));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let events = log.events();
        prop_assert_eq!(events.len(), threads * per_thread);
        for pair in events.windows(2) {
            prop_assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }
}
