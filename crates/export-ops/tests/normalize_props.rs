use std::collections::HashSet;

use export_ops::normalize;
use kernel_bridge::{Candidate, MockKernel};
use proptest::prelude::*;

const POOL: usize = 6;

/// Container nesting over indices into a shape pool.
#[derive(Debug, Clone)]
enum Tree {
    Leaf(usize),
    List(Vec<Tree>),
    Set(Vec<Tree>),
    Dict(Vec<Tree>),
}

fn tree() -> impl Strategy<Value = Tree> {
    let leaf = (0..POOL).prop_map(Tree::Leaf);
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(Tree::List),
            prop::collection::vec(inner.clone(), 1..4).prop_map(Tree::Set),
            prop::collection::vec(inner, 1..4).prop_map(Tree::Dict),
        ]
    })
}

fn pool() -> Vec<Candidate> {
    let mut k = MockKernel::new();
    (0..POOL)
        .map(|i| {
            let x = i as f64 * 3.0;
            Candidate::shape(k.insert_box([x, 0.0, 0.0], [x + 1.0, 1.0, 1.0]))
        })
        .collect()
}

fn build(t: &Tree, pool: &[Candidate]) -> Candidate {
    match t {
        Tree::Leaf(i) => pool[*i].clone(),
        Tree::List(items) => Candidate::Sequence(items.iter().map(|c| build(c, pool)).collect()),
        Tree::Set(items) => Candidate::Set(items.iter().map(|c| build(c, pool)).collect()),
        Tree::Dict(items) => Candidate::Mapping(
            items
                .iter()
                .enumerate()
                .map(|(i, c)| (format!("k{}", i), build(c, pool)))
                .collect(),
        ),
    }
}

fn leaves(t: &Tree, out: &mut Vec<usize>) {
    match t {
        Tree::Leaf(i) => out.push(*i),
        Tree::List(items) | Tree::Set(items) | Tree::Dict(items) => {
            items.iter().for_each(|c| leaves(c, out))
        }
    }
}

proptest! {
    #[test]
    fn nesting_does_not_change_the_exportable_set(t in tree()) {
        let pool = pool();
        let mut flat = Vec::new();
        leaves(&t, &mut flat);

        let nested = normalize(&build(&t, &pool)).unwrap();
        let flattened =
            normalize(&Candidate::Sequence(flat.iter().map(|&i| pool[i].clone()).collect())).unwrap();
        prop_assert_eq!(nested.ids(), flattened.ids());
    }

    #[test]
    fn each_shape_is_exported_once(t in tree()) {
        let pool = pool();
        let mut flat = Vec::new();
        leaves(&t, &mut flat);
        let distinct: HashSet<usize> = flat.iter().copied().collect();

        let set = normalize(&build(&t, &pool)).unwrap();
        prop_assert_eq!(set.len(), distinct.len());
    }

    #[test]
    fn any_string_next_to_geometry_is_mixed_content(t in tree(), junk in "[a-z]{1,60}") {
        let pool = pool();
        let tree = Candidate::Sequence(vec![build(&t, &pool), Candidate::Text(junk.clone())]);
        let err = normalize(&tree).unwrap_err();
        let expected: String = junk.chars().take(40).collect();
        prop_assert_eq!(
            err,
            export_ops::ValidationError::MixedContent { examples: vec![format!("string:{}", expected)] }
        );
    }
}
