use phylopack::{Error, Precision, TreeRep, TreesSet};
use std::collections::HashMap;

fn new_set() -> TreesSet {
    TreesSet::new(true, Precision::F64, false)
}

// --- BASIC SHAPES ---

#[test]
fn test_two_tip_cladogram() {
    let mut set = new_set();
    let index = set.add("(A,B);", None).unwrap();
    assert_eq!(index, 0);
    assert_eq!(set.len(), 1);

    let rep = set.rep(0).unwrap();
    assert!(rep.is_cladogram());
    assert_eq!(rep.topology().as_ref(), &[0, 1]);
    assert_eq!(rep.heights(), vec![1.0]);

    let tree = set.get(0).unwrap();
    assert_eq!(tree.n_taxa(), 2);
    assert_eq!(tree.n_nodes(), 3);
    assert_eq!(tree.to_newick(None, false, false).unwrap(), "(A,B)");
}

#[test]
fn test_phylogram_heights() {
    let mut set = new_set();
    set.add("((A:1,B:1):2,C:3);", None).unwrap();

    let tree = set.get(0).unwrap();
    assert!(!tree.is_cladogram());

    // root at height 3, all tips at height 0
    let root = tree.node(tree.root_id()).unwrap();
    assert_eq!(root.height, Some(3.0));
    assert_eq!(root.parent, None);
    for &id in &tree.terminals() {
        assert_eq!(tree.node(id).unwrap().height, Some(0.0));
    }
}

#[test]
fn test_set_branch_then_canonical_newick() {
    let mut set = new_set();
    set.add("((A:1,B:1):2,C:3);", None).unwrap();

    let mut tree = set.get(0).unwrap();
    let id_of_a = tree.terminals()[0];
    assert_eq!(tree.node(id_of_a).unwrap().taxon, Some("A"));

    tree.set_branch(id_of_a, 0.5).unwrap();
    assert_eq!(
        tree.to_newick(None, false, false).unwrap(),
        "((A:0.5,B:1.0):2.0,C:3.0)"
    );
}

#[test]
fn test_non_contemporaneous_tips() {
    let mut set = new_set();
    set.add("(A:1,B:2);", None).unwrap();

    let rep = set.rep(0).unwrap();
    assert_eq!(rep.heights(), vec![2.0]);
    assert_eq!(rep.tip_heights(), Some(vec![1.0, 0.0]));

    // height above each tip recovers the input branch lengths
    let tree = set.get(0).unwrap();
    let root = tree.node(tree.root_id()).unwrap();
    let a = tree.node(0).unwrap();
    let b = tree.node(1).unwrap();
    assert_eq!(root.height.unwrap() - a.height.unwrap(), 1.0);
    assert_eq!(root.height.unwrap() - b.height.unwrap(), 2.0);
    assert_eq!(a.branch, Some(1.0));
    assert_eq!(b.branch, Some(2.0));
}

#[test]
fn test_identical_trees_share_taxa_and_rep() {
    let mut set = new_set();
    set.add("((A,B),(C,D));", None).unwrap();
    set.add("((A,B),(C,D));", None).unwrap();

    assert_eq!(set.len(), 2);
    assert_eq!(set.num_taxa(), 4);
    assert_eq!(set.rep(0).unwrap(), set.rep(1).unwrap());
}

#[test]
fn test_leaf_annotation_reaches_expansion() {
    let mut set = new_set();
    set.add("(A[&rate=0.5]:1,B:1);", None).unwrap();

    let tree = set.get(0).unwrap();
    let a = tree.node(0).unwrap();
    assert_eq!(a.taxon, Some("A"));
    assert_eq!(
        a.attributes.unwrap().as_slice(),
        &[("rate".to_string(), "0.5".to_string())]
    );
    assert_eq!(tree.node(1).unwrap().attributes, None);
}

#[test]
fn test_trifurcation_preserved() {
    let mut set = new_set();
    set.add("((A,B,C):1,D:1);", None).unwrap();

    let rep = set.rep(0).unwrap();
    assert_eq!(rep.heights(), vec![1.0, 1.0, 2.0]);

    let tree = set.get(0).unwrap();
    assert_eq!(tree.n_nodes(), 6);
    let inner = tree.node(3).unwrap();
    assert_eq!(inner.sons, &[0, 1, 2]);
    assert_eq!(tree.node(0).unwrap().taxon, Some("A"));
    assert_eq!(tree.node(1).unwrap().taxon, Some("B"));
    assert_eq!(tree.node(2).unwrap().taxon, Some("C"));
}

// --- BOUNDARIES ---

#[test]
fn test_single_tip_tree() {
    let mut set = new_set();
    set.add("A;", None).unwrap();

    let rep = set.rep(0).unwrap();
    assert_eq!(rep.topology().as_ref(), &[0]);
    assert!(rep.heights().is_empty());

    let tree = set.get(0).unwrap();
    assert_eq!(tree.n_nodes(), 1);
    assert_eq!(tree.root_id(), 0);
    assert_eq!(tree.node(0).unwrap().taxon, Some("A"));
    assert_eq!(tree.to_newick(None, false, false).unwrap(), "A");
}

#[test]
fn test_parse_error_leaves_set_untouched() {
    let mut set = new_set();
    set.add("(A,B);", None).unwrap();

    let err = set.add("(A,B);xyz", None).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
    assert_eq!(set.len(), 1);
    assert_eq!(set.num_taxa(), 2);

    // the set keeps working after a failure
    set.add("(C,D);", None).unwrap();
    assert_eq!(set.len(), 2);
}

#[test]
fn test_get_out_of_range() {
    let set = new_set();
    assert!(set.is_empty());
    assert!(matches!(set.get(0), Err(Error::Range { index: 0, len: 0 })));
}

#[test]
fn test_node_out_of_range() {
    let mut set = new_set();
    set.add("(A,B);", None).unwrap();
    let tree = set.get(0).unwrap();
    assert!(matches!(tree.node(3), Err(Error::Range { index: 3, len: 3 })));
}

// --- INVARIANTS ---

#[test]
fn test_node_count_invariant() {
    let mut set = new_set();
    set.add("(((A,B),(C,D)),(E,(F,G)));", None).unwrap();

    let rep = set.rep(0).unwrap();
    let tree = set.get(0).unwrap();
    // binary tree: |topology| + |heights| = 2N-1 = node count
    assert_eq!(
        rep.topology().len() + rep.heights().len(),
        2 * rep.n_taxa() - 1
    );
    assert_eq!(tree.n_nodes(), 2 * rep.n_taxa() - 1);
}

#[test]
fn test_tips_follow_topology() {
    let mut set = new_set();
    set.add("((D,C),(B,A));", None).unwrap();

    let tree = set.get(0).unwrap();
    assert_eq!(tree.taxa(), vec!["D", "C", "B", "A"]);

    let topology = tree.topology();
    for (ordinal, &id) in tree.terminals().iter().enumerate() {
        let view = tree.node(id).unwrap();
        assert_eq!(view.taxon, set.taxon(topology[ordinal]));
    }
}

#[test]
fn test_single_root_and_parent_wiring() {
    let mut set = new_set();
    set.add("((A:1,B:2):1,(C:1,(D:2,E:1):1):2);", None).unwrap();

    let tree = set.get(0).unwrap();
    let mut roots = 0;
    for id in tree.all_ids() {
        let view = tree.node(id).unwrap();
        match view.parent {
            None => roots += 1,
            Some(parent) => {
                let up = tree.node(parent).unwrap();
                assert!(up.sons.contains(&(id as u32)));
            }
        }
        for &son in view.sons {
            assert_eq!(tree.node(son as usize).unwrap().parent, Some(id));
        }
    }
    assert_eq!(roots, 1);
    assert_eq!(tree.node(tree.root_id()).unwrap().parent, None);
}

#[test]
fn test_phylogram_height_invariant() {
    let mut set = new_set();
    set.add("((A:1.5,B:0.5):2,(C:1,D:3):1.25);", None).unwrap();

    let tree = set.get(0).unwrap();
    for id in tree.all_ids() {
        let view = tree.node(id).unwrap();
        if view.sons.is_empty() {
            continue;
        }
        let expected = view
            .sons
            .iter()
            .map(|&s| {
                let son = tree.node(s as usize).unwrap();
                son.height.unwrap() + son.branch.unwrap()
            })
            .fold(f64::MIN, f64::max);
        assert!((view.height.unwrap() - expected).abs() < 1e-12);
    }
}

#[test]
fn test_sibling_order_canonicalised() {
    let mut set = new_set();
    set.add("((A,B),C);", None).unwrap();
    set.add("(C,(B,A));", None).unwrap();

    let first = set.get(0).unwrap().to_newick(None, false, false).unwrap();
    let second = set.get(1).unwrap().to_newick(None, false, false).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, "((A,B),C)");
}

#[test]
fn test_canonical_form_idempotent() {
    let mut set = new_set();
    set.add("((B:1,A:1):2,(D:0.5,C:2.5):1);", None).unwrap();
    let rendered = set.get(0).unwrap().to_newick(None, false, false).unwrap();

    let mut again = new_set();
    again.add(&rendered, None).unwrap();
    let rerendered = again.get(0).unwrap().to_newick(None, false, false).unwrap();
    assert_eq!(rendered, rerendered);
}

#[test]
fn test_taxon_interning_across_trees() {
    let mut set = new_set();
    set.add("(A,B);", None).unwrap();
    set.add("(B,C);", None).unwrap();

    assert_eq!(set.num_taxa(), 3);
    assert_eq!(set.rep(1).unwrap().topology().as_ref(), &[1, 2]);
    assert_eq!(set.taxa().get("B"), Some(1));
}

#[test]
fn test_topology_only_stable_under_encode_expand() {
    let text = "((A:0.1,B:0.2):0.3,(C:0.4,D:0.5):0.6);";
    let mut set = new_set();
    set.add(text, None).unwrap();
    let topo = set.get(0).unwrap().to_newick(None, true, false).unwrap();
    assert_eq!(topo, "((A,B),(C,D))");

    let mut again = new_set();
    again.add(&topo, None).unwrap();
    assert_eq!(
        again.get(0).unwrap().to_newick(None, true, false).unwrap(),
        topo
    );
}

// --- TRAVERSAL ---

#[test]
fn test_orders() {
    let mut set = new_set();
    set.add("((A,B),C);", None).unwrap();
    let tree = set.get(0).unwrap();

    // nodes: A=0, B=1, (A,B)=2, C=3, root=4
    assert_eq!(tree.postorder(None, true).unwrap(), vec![0, 1, 2, 3, 4]);
    assert_eq!(tree.preorder(None, true).unwrap(), vec![4, 2, 0, 1, 3]);
    assert_eq!(tree.postorder(None, false).unwrap(), vec![2, 4]);
    assert_eq!(tree.preorder(None, false).unwrap(), vec![4, 2]);
    assert_eq!(tree.postorder(Some(2), true).unwrap(), vec![0, 1, 2]);
    assert_eq!(tree.terminals(), vec![0, 1, 3]);
    assert_eq!(tree.all_ids(), 0..5);
}

#[test]
fn test_subtree_newick() {
    let mut set = new_set();
    set.add("((A:1,B:1):2,C:3);", None).unwrap();
    let tree = set.get(0).unwrap();

    assert_eq!(tree.to_newick(Some(2), false, false).unwrap(), "(A:1.0,B:1.0)");
    // with the stem, the subtree's own branch is appended
    assert_eq!(
        tree.to_newick(Some(2), false, true).unwrap(),
        "(A:1.0,B:1.0):2.0"
    );
}

// --- BRANCH EDITS ---

#[test]
fn test_set_branch_rejects_negative() {
    let mut set = new_set();
    set.add("(A:1,B:1);", None).unwrap();
    let mut tree = set.get(0).unwrap();
    assert!(matches!(
        tree.set_branch(0, -0.5),
        Err(Error::InvalidArgument(_))
    ));
}

#[test]
fn test_set_branch_rebaselines_negative_heights() {
    let mut set = new_set();
    set.add("((A:1,B:1):2,C:3);", None).unwrap();
    let mut tree = set.get(0).unwrap();

    // lengthening the internal branch pushes its subtree below the base
    // level; the whole tree shifts so the minimum height is 0 again
    tree.set_branch(2, 5.0).unwrap();
    assert_eq!(tree.node(0).unwrap().height, Some(0.0));
    assert_eq!(tree.node(1).unwrap().height, Some(0.0));
    assert_eq!(tree.node(2).unwrap().height, Some(1.0));
    assert_eq!(tree.node(2).unwrap().branch, Some(5.0));
    assert_eq!(tree.node(3).unwrap().height, Some(6.0));
    assert_eq!(tree.node(4).unwrap().height, Some(6.0));
}

#[test]
fn test_set_branch_on_cladogram_only_sets_branch() {
    let mut set = new_set();
    set.add("(A,B);", None).unwrap();
    let mut tree = set.get(0).unwrap();

    tree.set_branch(0, 2.0).unwrap();
    let a = tree.node(0).unwrap();
    assert_eq!(a.branch, Some(2.0));
    assert_eq!(a.height, None);
}

// --- CONFIGURATION ---

#[test]
fn test_uncompressed_matches_compressed() {
    let text = "((A:1,B:1):2,(C:1.5,D:0.25):2.5);";
    let mut compressed = TreesSet::new(true, Precision::F64, false);
    let mut plain = TreesSet::new(false, Precision::F64, false);
    compressed.add(text, None).unwrap();
    plain.add(text, None).unwrap();

    assert_eq!(
        compressed.rep(0).unwrap().topology(),
        plain.rep(0).unwrap().topology()
    );
    assert_eq!(
        compressed.get(0).unwrap().to_newick(None, false, false).unwrap(),
        plain.get(0).unwrap().to_newick(None, false, false).unwrap()
    );
}

#[test]
fn test_f32_precision() {
    let mut set = TreesSet::new(false, Precision::F32, false);
    set.add("((A:0.25,B:0.25):0.5,C:0.75);", None).unwrap();

    assert!(matches!(
        set.rep(0).unwrap(),
        TreeRep::PhylogramF32 { .. }
    ));
    let tree = set.get(0).unwrap();
    assert_eq!(tree.node(tree.root_id()).unwrap().height, Some(0.75));
}

#[test]
fn test_store_mode_keeps_raw_parse() {
    let mut set = TreesSet::new(true, Precision::F64, true);
    set.add("(A[&x=1]:1,B:2);", None).unwrap();

    assert_eq!(set.len(), 1);
    let nodes = set.parsed(0).unwrap();
    assert_eq!(nodes.len(), 3);
    assert_eq!(nodes[0].taxon.as_deref(), Some("A"));
    assert_eq!(nodes[0].branch, Some(1.0));

    // store mode bypasses the encoder, so there is no compact tree to get
    assert!(matches!(set.get(0), Err(Error::Range { .. })));
    assert_eq!(set.num_taxa(), 0);
}

#[test]
fn test_per_tree_attribute_bag() {
    let mut set = new_set();
    let mut attrs = HashMap::new();
    attrs.insert("posterior".to_string(), "0.91".to_string());
    set.add("(A,B);", Some(attrs)).unwrap();
    set.add("(A,B);", None).unwrap();

    let tree = set.get(0).unwrap();
    assert_eq!(
        tree.attributes().unwrap().get("posterior").map(String::as_str),
        Some("0.91")
    );
    assert_eq!(set.get(1).unwrap().attributes(), None);
}

// --- ATTRIBUTE SLOTS ---

#[test]
fn test_internal_annotation_survives_expansion() {
    let mut set = new_set();
    set.add("((A,B)[&support=0.93],C);", None).unwrap();

    let tree = set.get(0).unwrap();
    let inner = tree.node(2).unwrap();
    assert!(inner.taxon.is_none());
    assert_eq!(
        inner.attributes.unwrap().as_slice(),
        &[("support".to_string(), "0.93".to_string())]
    );
}

#[test]
fn test_caterpillar_annotations_stay_on_their_nodes() {
    let mut set = new_set();
    set.add("(A,(B,C)[&s=inner])[&s=root];", None).unwrap();

    // nodes: A=0, B=1, C=2, (B,C)=3, root=4
    let tree = set.get(0).unwrap();
    assert_eq!(
        tree.node(3).unwrap().attributes.unwrap().as_slice(),
        &[("s".to_string(), "inner".to_string())]
    );
    assert_eq!(
        tree.node(4).unwrap().attributes.unwrap().as_slice(),
        &[("s".to_string(), "root".to_string())]
    );
}

#[test]
fn test_unary_group_annotation_folds_onto_surviving_node() {
    let mut set = new_set();
    set.add("((A)[&u=1]:1,B)[&r=2];", None).unwrap();

    // the unary (A) group collapses in the reconstruction; its annotation
    // lands on the node covering the same tip range, leaf A. nodes:
    // A=0, B=1, root=2
    let tree = set.get(0).unwrap();
    assert_eq!(tree.n_nodes(), 3);
    let a = tree.node(0).unwrap();
    assert_eq!(a.taxon, Some("A"));
    assert_eq!(
        a.attributes.unwrap().as_slice(),
        &[("u".to_string(), "1".to_string())]
    );
    assert_eq!(tree.node(1).unwrap().attributes, None);
    assert_eq!(
        tree.node(2).unwrap().attributes.unwrap().as_slice(),
        &[("r".to_string(), "2".to_string())]
    );
}

#[test]
fn test_unary_chain_annotations_concatenate() {
    let mut set = new_set();
    set.add("(A[&x=1])[&u=2];", None).unwrap();

    // both the tip's own annotation and the collapsed wrapper's end up on
    // the single reconstructed node, tip first
    let tree = set.get(0).unwrap();
    assert_eq!(tree.n_nodes(), 1);
    assert_eq!(
        tree.node(0).unwrap().attributes.unwrap().as_slice(),
        &[
            ("x".to_string(), "1".to_string()),
            ("u".to_string(), "2".to_string())
        ]
    );
}
