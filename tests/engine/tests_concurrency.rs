//! Languages and trees are shared across threads.

use std::sync::Arc;
use std::thread;

use rayon::prelude::*;

use crate::helpers::calc;
use crate::helpers::fixtures::{SNIPPETS, TOKEN};

#[test]
fn test_language_and_trees_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<huff::Language>();
    assert_send_sync::<huff::SyntaxTree>();
    assert_send_sync::<huff::Parser>();
}

#[test]
fn test_parallel_parses_share_one_language() {
    let handles: Vec<_> = (0..4)
        .map(|index| {
            thread::spawn(move || {
                let text = format!("a{}+b*c", "x".repeat(index));
                let tree = calc::parser().parse(&text);
                assert!(!tree.has_error());
                std::ptr::from_ref(tree.language()) as usize
            })
        })
        .collect();
    let languages: Vec<_> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();
    assert!(languages.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn test_old_tree_stays_valid_while_another_thread_reparses() {
    let parser = calc::parser();
    let old = Arc::new(parser.parse("a+b"));
    let reader = {
        let old = Arc::clone(&old);
        thread::spawn(move || old.to_sexp())
    };
    let new = parser
        .reparse(&old, &[huff::Edit::insert(3, 2)], "a+b*c")
        .unwrap();
    assert_eq!(reader.join().unwrap(), "(expr (identifier) (identifier))");
    assert_eq!(old.text(), "a+b");
    assert_eq!(new.text(), "a+b*c");
}

#[test]
fn test_rayon_parses_share_one_parser() {
    let parser = calc::parser();
    let texts: Vec<String> = (0..32).map(|n| format!("a+{}", "b*".repeat(n) + "c")).collect();
    let trees: Vec<_> = texts.par_iter().map(|text| parser.parse(text)).collect();
    for (tree, text) in trees.iter().zip(&texts) {
        assert_eq!(tree.text(), text);
        assert!(!tree.has_error());
    }
}

#[test]
fn test_parse_all_matches_sequential_parses() {
    let mut texts: Vec<&str> = SNIPPETS.to_vec();
    texts.push(TOKEN);
    let parallel = huff::huff::parse_all(&texts);
    let sequential: Vec<_> = texts.iter().map(|text| huff::huff::parse(text)).collect();
    assert_eq!(parallel.len(), texts.len());
    for (a, b) in parallel.iter().zip(&sequential) {
        assert!(a.root().structurally_eq(b.root()));
    }
}
