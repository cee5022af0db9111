use policydb_text::{dot, DenseMatrix};

/// Brute-force top-k by dot product against every row.
///
/// Ties keep ascending row order, so equal scores rank deterministically.
pub fn search(matrix: &DenseMatrix, query: &[f32], k: usize) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = (0..matrix.rows).map(|i| (i, dot(matrix.row(i), query))).collect();
    rank(&mut scored);
    scored.truncate(k);
    scored
}

/// Sort hits by score descending, then row ascending.
pub fn rank(hits: &mut [(usize, f32)]) {
    hits.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
}
