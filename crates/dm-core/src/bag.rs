//! Bipartite assignment for bag operators
//!
//! Sub-patterns may be operators matching several elements, so comparing
//! multisets of values is not enough: we need a maximum matching between
//! sub-patterns and actual elements. Kuhn's augmenting-path algorithm is
//! plenty for the sizes seen in tests.

/// Maximum matching between `rows` sub-patterns and `cols` actual elements.
///
/// `compatible[row][col]` tells whether sub-pattern `row` matches element
/// `col`. Returns, for every element, the sub-pattern assigned to it.
pub(crate) fn max_matching(compatible: &[Vec<bool>], cols: usize) -> Vec<Option<usize>> {
    let mut owner: Vec<Option<usize>> = vec![None; cols];
    for row in 0..compatible.len() {
        let mut seen = vec![false; cols];
        augment(row, compatible, &mut seen, &mut owner);
    }
    owner
}

fn augment(
    row: usize,
    compatible: &[Vec<bool>],
    seen: &mut [bool],
    owner: &mut [Option<usize>],
) -> bool {
    for col in 0..owner.len() {
        if !compatible[row][col] || seen[col] {
            continue;
        }
        seen[col] = true;
        let free = match owner[col] {
            None => true,
            Some(other) => augment(other, compatible, seen, owner),
        };
        if free {
            owner[col] = Some(row);
            return true;
        }
    }
    false
}
