pub struct SearchEngine;

impl SearchEngine {
    /// Zero vectors score 0.0 rather than NaN.
    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }
        dot_product / (norm_a * norm_b)
    }

    /// Rank `candidates` by cosine similarity to `query`, keeping the best
    /// `top_k`. Equal scores are ordered by id.
    pub fn rank<'a, I>(query: &[f32], candidates: I, top_k: usize) -> Vec<(f32, &'a str)>
    where
        I: IntoIterator<Item = (&'a str, &'a [f32])>,
    {
        let mut scored: Vec<(f32, &str)> = candidates
            .into_iter()
            .map(|(id, vector)| (Self::cosine_similarity(query, vector), id))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored.truncate(top_k);
        scored
    }
}
