/// Cosine similarity with a small epsilon on the norm product.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (na * nb + 1e-8)
}

/// Greedy Maximal Marginal Relevance. Returns indices into `candidates` in
/// pick order, at most `min(top_k, candidates.len())`, never repeating.
///
/// The first pick maximizes similarity to the query; later picks maximize
/// `λ·sim(q, c) − (1 − λ)·max sim(c, selected)`. Ties keep the earlier candidate.
pub fn mmr_select(query: &[f32], candidates: &[Vec<f32>], top_k: usize, lambda: f32) -> Vec<usize> {
    let n = candidates.len();
    let want = top_k.min(n);
    let q_sim: Vec<f32> = candidates.iter().map(|c| cosine(c, query)).collect();
    // max similarity of each candidate to anything selected so far
    let mut redundancy = vec![f32::NEG_INFINITY; n];
    let mut remaining: Vec<usize> = (0..n).collect();
    let mut selected = Vec::with_capacity(want);

    while selected.len() < want {
        let score = |j: usize| {
            if selected.is_empty() { q_sim[j] } else { lambda * q_sim[j] - (1.0 - lambda) * redundancy[j] }
        };
        let mut best = 0;
        for slot in 1..remaining.len() {
            if score(remaining[slot]) > score(remaining[best]) {
                best = slot;
            }
        }
        let pick = remaining.remove(best);
        selected.push(pick);
        for &j in &remaining {
            redundancy[j] = redundancy[j].max(cosine(&candidates[j], &candidates[pick]));
        }
    }
    selected
}
