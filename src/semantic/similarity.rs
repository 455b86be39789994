/// Cosine of the angle between two vectors, 0.0 when either is all zeros.
///
/// Vectors of different length are compared over their common prefix.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0;
    let mut na = 0.0;
    let mut nb = 0.0;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }

    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }

    dot / (na.sqrt() * nb.sqrt())
}

/// Indices where a new group should start.
///
/// A boundary is placed before sentence `i` when the similarity between
/// embeddings `i - 1` and `i` drops below `threshold`, provided the group
/// being closed already holds at least `min_chunk_size` sentences.
pub fn find_semantic_boundaries(
    embeddings: &[Vec<f32>],
    threshold: f32,
    min_chunk_size: usize,
) -> Vec<usize> {
    let mut boundaries = Vec::new();
    let mut last_boundary = 0;

    for i in 1..embeddings.len() {
        if i - last_boundary < min_chunk_size {
            continue;
        }
        if cosine_similarity(&embeddings[i - 1], &embeddings[i]) < threshold {
            boundaries.push(i);
            last_boundary = i;
        }
    }

    boundaries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_boundaries_respect_min_size() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        let embeddings = vec![a.clone(), b.clone(), a.clone(), b.clone(), b.clone()];

        // Every neighbour pair except the last is dissimilar
        assert_eq!(find_semantic_boundaries(&embeddings, 0.5, 1), vec![1, 2, 3]);
        assert_eq!(find_semantic_boundaries(&embeddings, 0.5, 2), vec![2]);
        assert!(find_semantic_boundaries(&embeddings, -1.0, 1).is_empty());
    }

    #[test]
    fn test_boundaries_of_short_input() {
        assert!(find_semantic_boundaries(&[], 0.5, 1).is_empty());
        assert!(find_semantic_boundaries(&[vec![1.0]], 0.5, 1).is_empty());
    }
}
