//! Ordering and ancestry for dotted outline positions ("1", "1.2", "1.2.10").

use std::cmp::Ordering;

/// Compare two outline positions segment by segment.
///
/// Segments compare numerically when both parse as integers and lexically
/// otherwise, so "1.10" sorts after "1.9". When one outline is a prefix of
/// the other the shorter sorts first ("2.2" < "2.2.15").
pub fn compare_outline(a: &str, b: &str) -> Ordering {
    let mut left = a.trim().split('.');
    let mut right = b.trim().split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.trim().parse::<u64>(), y.trim().parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// `true` when `child` sits anywhere beneath `parent` in the outline.
pub fn is_descendant(child: &str, parent: &str) -> bool {
    let parent = parent.trim();
    !parent.is_empty()
        && child
            .trim()
            .strip_prefix(parent)
            .is_some_and(|rest| rest.starts_with('.'))
}
