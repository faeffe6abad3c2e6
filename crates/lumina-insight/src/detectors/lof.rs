//! Local Outlier Factor.
//!
//! LOF compares each point's local reachability density with that of its
//! k nearest neighbours. Scores near 1.0 are inliers; larger is more
//! isolated. Pairwise distances make this O(n²).

/// LOF score for every row, with `k` clamped to `n - 1`.
pub fn local_outlier_factor(data: &[Vec<f64>], k: usize) -> Vec<f64> {
    let n = data.len();
    if n < 2 {
        return vec![1.0; n];
    }
    let k = k.clamp(1, n - 1);

    let mut k_distance = vec![0.0; n];
    let mut neighbours: Vec<Vec<(usize, f64)>> = Vec::with_capacity(n);

    for i in 0..n {
        let mut dists: Vec<(usize, f64)> = (0..n)
            .filter(|&j| j != i)
            .map(|j| (j, euclidean(&data[i], &data[j])))
            .collect();
        dists.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        let kd = dists[k - 1].1;
        k_distance[i] = kd;
        // every point tied with the k-th distance is a neighbour
        dists.retain(|&(_, d)| d <= kd);
        neighbours.push(dists);
    }

    // the epsilon keeps densities finite when neighbours are exact duplicates
    let lrd: Vec<f64> = neighbours
        .iter()
        .map(|nbrs| {
            let reach: f64 = nbrs.iter().map(|&(j, d)| k_distance[j].max(d)).sum();
            1.0 / (reach / nbrs.len() as f64 + 1e-10)
        })
        .collect();

    neighbours
        .iter()
        .enumerate()
        .map(|(i, nbrs)| {
            let mean_lrd = nbrs.iter().map(|&(j, _)| lrd[j]).sum::<f64>() / nbrs.len() as f64;
            mean_lrd / lrd[i]
        })
        .collect()
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
