use codepack::selection::{CheckState, SelectionState};
use codepack::tree::DirectoryTree;
use codepack::NodePath;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::integration::support::{materialize, Shape};

fn shape() -> impl Strategy<Value = Shape> {
    Just(Shape::File).prop_recursive(4, 64, 5, |inner| {
        prop::collection::vec(inner, 0..5).prop_map(Shape::Dir)
    })
}

fn tree() -> impl Strategy<Value = DirectoryTree> {
    prop::collection::vec(shape(), 0..6).prop_map(|children| {
        DirectoryTree::new(materialize(&Shape::Dir(children), PathBuf::from("/root")))
            .expect("generated ids are unique")
    })
}

/// A tree plus indices used to pick nodes from its pre-order list.
fn tree_and_picks() -> impl Strategy<Value = (DirectoryTree, Vec<prop::sample::Index>)> {
    (tree(), prop::collection::vec(any::<prop::sample::Index>(), 0..12))
}

fn nodes(tree: &DirectoryTree) -> Vec<NodePath> {
    tree.preorder().cloned().collect()
}

fn directories(tree: &DirectoryTree) -> Vec<NodePath> {
    tree.spans()
        .filter(|(_, is_directory, _)| *is_directory)
        .map(|(id, _, _)| id.clone())
        .collect()
}

/// Brute-force indeterminate set straight from the definition.
fn naive_indeterminate(state: &SelectionState, tree: &DirectoryTree) -> BTreeSet<NodePath> {
    directories(tree)
        .into_iter()
        .filter(|dir| {
            let leaves: Vec<&NodePath> = tree.leaf_descendants(dir).unwrap().collect();
            let checked = leaves.iter().filter(|l| state.is_checked(l)).count();
            checked > 0 && checked < leaves.len()
        })
        .collect()
}

fn apply(tree: &DirectoryTree, picks: &[prop::sample::Index]) -> SelectionState {
    let all = nodes(tree);
    picks.iter().fold(SelectionState::new(), |state, pick| {
        state.toggle(pick.get::<NodePath>(&all), tree).unwrap()
    })
}

proptest! {
    #[test]
    fn toggling_a_directory_from_empty_selects_exactly_its_leaves(
        (tree, picks) in tree_and_picks()
    ) {
        let dirs = directories(&tree);
        for pick in picks {
            let dir = pick.get(&dirs);
            let state = SelectionState::new().toggle(dir, &tree).unwrap();
            let expected: Vec<NodePath> = tree.leaf_descendants(dir).unwrap().cloned().collect();
            prop_assert_eq!(state.flatten(&tree), expected);
        }
    }

    #[test]
    fn double_toggle_restores_uniform_subtree(
        (tree, picks) in tree_and_picks(),
        target in any::<prop::sample::Index>()
    ) {
        let all = nodes(&tree);
        let target = target.get(&all).clone();
        // Only toggle nodes outside the target's strict subtree, so the
        // target's subtree stays uniform and agrees with its own bit.
        let inside: BTreeSet<NodePath> = tree.descendants(&target).unwrap().cloned().collect();
        let outside: Vec<prop::sample::Index> = picks
            .into_iter()
            .filter(|pick| !inside.contains(pick.get(&all)))
            .collect();

        let state = apply(&tree, &outside);
        let twice = state
            .toggle(&target, &tree)
            .unwrap()
            .toggle(&target, &tree)
            .unwrap();
        prop_assert_eq!(twice, state);
    }

    #[test]
    fn toggled_directory_with_leaves_is_never_left_indeterminate(
        (tree, picks) in tree_and_picks(),
        target in any::<prop::sample::Index>()
    ) {
        let dirs = directories(&tree);
        let target = target.get(&dirs).clone();
        prop_assume!(tree.leaf_count(&target).unwrap() > 0);

        let before = apply(&tree, &picks);
        let after = before.toggle(&target, &tree).unwrap();
        let expected = match before.check_state(&target, &tree) {
            Some(CheckState::Checked) => CheckState::Unchecked,
            _ => CheckState::Checked,
        };
        prop_assert_eq!(after.check_state(&target, &tree), Some(expected));
        prop_assert!(!after.indeterminate(&tree).contains(&target));
    }

    #[test]
    fn indeterminate_matches_definition((tree, picks) in tree_and_picks()) {
        let state = apply(&tree, &picks);
        prop_assert_eq!(state.indeterminate(&tree), naive_indeterminate(&state, &tree));
    }

    #[test]
    fn flatten_is_preorder_and_checked_only((tree, picks) in tree_and_picks()) {
        let state = apply(&tree, &picks);
        let flat = state.flatten(&tree);
        let leaves: Vec<NodePath> = tree.leaves().cloned().collect();

        let mut cursor = leaves.iter();
        for path in &flat {
            prop_assert!(state.is_checked(path));
            prop_assert!(cursor.any(|leaf| leaf == path), "out of pre-order: {:?}", path);
        }
        let expected = leaves.iter().filter(|l| state.is_checked(l)).count();
        prop_assert_eq!(flat.len(), expected);
    }
}
