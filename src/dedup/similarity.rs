//! Text metrics behind the duplicate detector.

/// Lowercases and folds the Portuguese diacritics that show up in names.
pub fn fold_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

/// Levenshtein edit distance over characters.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            current[j + 1] = (prev[j] + cost)
                .min(prev[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[b.len()]
}

/// Similarity in `[0, 1]` between two display names.
///
/// Case and diacritic insensitive. Containment of one folded name in the
/// other scores a flat 0.8 (which also covers identical names); otherwise
/// the score is `1 - lev / len(longer)`.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a = fold_name(a);
    let b = fold_name(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a.contains(&b) || b.contains(&a) {
        return 0.8;
    }
    let longer = a.chars().count().max(b.chars().count());
    1.0 - levenshtein(&a, &b) as f64 / longer as f64
}

/// Hamming distance between equal-length strings; `None` when the
/// lengths differ.
pub fn hamming(a: &str, b: &str) -> Option<usize> {
    if a.chars().count() != b.chars().count() {
        return None;
    }
    Some(a.chars().zip(b.chars()).filter(|(x, y)| x != y).count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_name() {
        assert_eq!(fold_name("João Conceição"), "joao conceicao");
        assert_eq!(fold_name("  MÚSICA  "), "musica");
    }

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("abc", ""), 3);
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("gravação", "gravacao"), 2);
    }

    #[test]
    fn test_name_similarity_containment_scores_point_eight() {
        // identical after folding goes through the containment branch
        assert_eq!(name_similarity("João Silva", "joao silva"), 0.8);
        assert_eq!(name_similarity("Maria", "Maria Clara"), 0.8);
    }

    #[test]
    fn test_name_similarity_edit_distance_branch() {
        // "carlos" vs "carlas": 1 edit over 6 chars
        let s = name_similarity("Carlos", "Carlas");
        assert!((s - (1.0 - 1.0 / 6.0)).abs() < 1e-9);
        assert_eq!(name_similarity("", "Maria"), 0.0);
    }

    #[test]
    fn test_hamming() {
        assert_eq!(hamming("12345678901", "12345678901"), Some(0));
        assert_eq!(hamming("12345678901", "12345678902"), Some(1));
        assert_eq!(hamming("123", "1234"), None);
    }
}
