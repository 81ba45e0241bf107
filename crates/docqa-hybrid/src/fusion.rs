// Reciprocal Rank Fusion over position lists

use std::collections::HashMap;

/// Fuse ranked position lists: `score(p) = Σ 1 / (k + rank + 1)` with 0-based
/// ranks. Output is sorted by descending score; ties keep the order in which
/// positions were first seen, walking the lists in the order given.
pub fn reciprocal_rank_fusion(lists: &[&[usize]], k: f32) -> Vec<(usize, f32)> {
    let mut slot: HashMap<usize, usize> = HashMap::new();
    let mut fused: Vec<(usize, f32)> = Vec::new();
    for list in lists {
        for (rank, &position) in list.iter().enumerate() {
            let contribution = 1.0 / (k + rank as f32 + 1.0);
            match slot.get(&position) {
                Some(&i) => fused[i].1 += contribution,
                None => {
                    slot.insert(position, fused.len());
                    fused.push((position, contribution));
                }
            }
        }
    }
    // stable sort keeps discovery order on ties
    fused.sort_by(|a, b| b.1.total_cmp(&a.1));
    fused
}
