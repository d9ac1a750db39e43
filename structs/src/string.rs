use core::cmp::Ordering;
use core::ops::ControlFlow;

use rbtree::{Destructor, RedBlackTree};

/// Lexicographic byte order.
#[allow(clippy::ptr_arg)]
pub fn compare_strings(a: &String, b: &String) -> Ordering {
    a.as_bytes().cmp(b.as_bytes())
}

/// Visitor appending `word` and a newline to `report`.
pub fn concatenate(word: &str, report: &mut String) -> ControlFlow<()> {
    report.push_str(word);
    report.push('\n');
    ControlFlow::Continue(())
}

/// Joins every word of the tree in ascending order, one per line.
pub fn concatenate_all<C, D>(tree: &RedBlackTree<String, C, D>) -> String
where
    D: Destructor<String>,
{
    let mut report = String::new();
    let _ = tree.for_each(|word| concatenate(word, &mut report));
    report
}
