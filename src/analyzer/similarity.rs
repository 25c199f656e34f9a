use crate::model::{PricePoint, SimilarProductGroup};

/// Fraction of positionally matching characters required for two normalized
/// names to count as similar.
const MATCH_RATIO: f64 = 0.8;

pub struct SimilarityGrouper;

impl SimilarityGrouper {
    /// Groups products by fuzzy name similarity in a single left-to-right
    /// pass. Each unprocessed product seeds a group; every later unprocessed
    /// product is compared to the seed (not to other members) and joins on a
    /// match. Groups that stay at one member are dropped.
    ///
    /// This is deliberately greedy and order-dependent rather than a true
    /// equivalence-class partition: items that are similar only through a
    /// middle element can end up in separate groups.
    pub fn group_similar_products(products: &[PricePoint]) -> Vec<SimilarProductGroup> {
        let mut groups = Vec::new();
        let mut processed = vec![false; products.len()];

        for i in 0..products.len() {
            if processed[i] {
                continue;
            }
            let seed = &products[i];
            let mut members = vec![seed.clone()];

            for j in (i + 1)..products.len() {
                if processed[j] {
                    continue;
                }
                if Self::are_similar_names(&seed.product_name, &products[j].product_name) {
                    members.push(products[j].clone());
                    processed[j] = true;
                }
            }
            processed[i] = true;

            if members.len() > 1 {
                let avg_price =
                    members.iter().map(|p| p.price).sum::<f64>() / members.len() as f64;
                groups.push(SimilarProductGroup {
                    base_name: seed.product_name.clone(),
                    members,
                    avg_price,
                });
            }
        }

        groups
    }

    /// Heuristic name similarity: lowercase, strip whitespace (including
    /// fullwidth spaces), hyphens and middle dots, then accept on equality,
    /// containment either way, or a positional character-match ratio of at
    /// least 0.8. Not an edit distance: reordered tokens miss, and very
    /// short strings can collide.
    pub fn are_similar_names(a: &str, b: &str) -> bool {
        let n1 = Self::normalize(a);
        let n2 = Self::normalize(b);

        if n1 == n2 {
            return true;
        }
        if n1.is_empty() || n2.is_empty() {
            return false;
        }
        if n1.contains(&n2) || n2.contains(&n1) {
            return true;
        }

        let c1: Vec<char> = n1.chars().collect();
        let c2: Vec<char> = n2.chars().collect();
        let max_len = c1.len().max(c2.len());
        let matches = c1
            .iter()
            .zip(c2.iter())
            .filter(|(x, y)| x == y)
            .count();
        matches as f64 / max_len as f64 >= MATCH_RATIO
    }

    fn normalize(name: &str) -> String {
        name.to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '・')
            .collect()
    }
}
