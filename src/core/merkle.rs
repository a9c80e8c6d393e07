// Merkle root over transaction ids

use crate::core::{hash_str, Hash};

/// Calculate the Merkle root of an ordered list of ids.
///
/// Adjacent pairs are combined as `hash(left ∥ right)`, left to right. When a
/// layer has an odd length the last element is paired with itself. A single
/// id is its own root; an empty list yields `Hash::empty()`.
pub fn compute_root(ids: &[Hash]) -> Hash {
    if ids.is_empty() {
        return Hash::empty();
    }

    let mut layer: Vec<Hash> = ids.to_vec();

    while layer.len() > 1 {
        let mut next_layer = Vec::with_capacity(layer.len().div_ceil(2));

        for chunk in layer.chunks(2) {
            let left = &chunk[0];
            let right = chunk.get(1).unwrap_or(left);

            let mut combined = String::with_capacity(left.as_str().len() + right.as_str().len());
            combined.push_str(left.as_str());
            combined.push_str(right.as_str());
            next_layer.push(hash_str(&combined));
        }

        layer = next_layer;
    }

    layer.swap_remove(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(s: &str) -> Hash {
        Hash::from_hex(s)
    }

    fn pair(left: &Hash, right: &Hash) -> Hash {
        hash_str(&format!("{}{}", left, right))
    }

    #[test]
    fn test_empty_root() {
        assert_eq!(compute_root(&[]), Hash::empty());
    }

    #[test]
    fn test_single_leaf_is_root() {
        // No combining round for a single leaf
        assert_eq!(compute_root(&[h("aa")]), h("aa"));
    }

    #[test]
    fn test_two_leaves() {
        assert_eq!(compute_root(&[h("aa"), h("bb")]), pair(&h("aa"), &h("bb")));
    }

    #[test]
    fn test_three_leaves_duplicates_last() {
        let (a, b, c) = (h("aa"), h("bb"), h("cc"));

        let ab = pair(&a, &b);
        let cc = pair(&c, &c);
        let expected = pair(&ab, &cc);

        assert_eq!(compute_root(&[a, b, c]), expected);
    }

    #[test]
    fn test_five_leaves() {
        let leaves: Vec<Hash> = ["a1", "b2", "c3", "d4", "e5"].iter().map(|s| h(s)).collect();

        // Layer 1: ab, cd, ee
        let ab = pair(&leaves[0], &leaves[1]);
        let cd = pair(&leaves[2], &leaves[3]);
        let ee = pair(&leaves[4], &leaves[4]);
        // Layer 2: (ab cd), (ee ee)
        let abcd = pair(&ab, &cd);
        let eeee = pair(&ee, &ee);
        // Root
        let expected = pair(&abcd, &eeee);

        assert_eq!(compute_root(&leaves), expected);
    }

    #[test]
    fn test_order_matters() {
        let forward = compute_root(&[h("aa"), h("bb")]);
        let reversed = compute_root(&[h("bb"), h("aa")]);
        assert_ne!(forward, reversed);
    }
}
