// ============================================================================
// Search Filter
// ============================================================================
// Fonction pure : (catalogue, terme) -> coins dont le NOM contient le terme
//
// - Insensible à la casse
// - Ne regarde que `name` (ni `symbol`, ni `id`)
// - Terme vide -> catalogue complet
// - Ordre conservé (filtre stable, pas de tri)
// ============================================================================

use crate::models::CoinRecord;

/// Vérifie si le nom de `coin` contient `term` (insensible à la casse)
///
/// `term` doit déjà être en minuscules.
fn matches_lowercase(coin: &CoinRecord, term: &str) -> bool {
    term.is_empty() || coin.name.to_lowercase().contains(term)
}

/// Filtre le catalogue et renvoie des copies des coins retenues
pub fn filter(catalog: &[CoinRecord], term: &str) -> Vec<CoinRecord> {
    filter_refs(catalog, term).into_iter().cloned().collect()
}

/// Variante sans copie, utilisée par l'UI à chaque rendu
///
/// CONCEPT RUST : Lifetimes
/// - Les références renvoyées vivent aussi longtemps que `catalog`
pub fn filter_refs<'a>(catalog: &'a [CoinRecord], term: &str) -> Vec<&'a CoinRecord> {
    let term = term.to_lowercase();
    catalog
        .iter()
        .filter(|coin| matches_lowercase(coin, &term))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<CoinRecord> {
        vec![
            CoinRecord::new("coin:1", 1, "Bitcoin", "BTC"),
            CoinRecord::new("coin:2", 2, "Ethereum", "ETH"),
            CoinRecord::new("coin:3", 3, "Ethereum Classic", "ETC"),
            CoinRecord::new("coin:4", 4, "Tether", "USDT"),
        ]
    }

    #[test]
    fn test_filter_by_name_case_insensitive() {
        let result = filter(&catalog()[..2], "eth");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Ethereum");

        let upper = filter(&catalog(), "ETHER");
        let names: Vec<&str> = upper.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ethereum", "Ethereum Classic", "Tether"]);
    }

    #[test]
    fn test_empty_term_returns_full_catalog() {
        assert_eq!(filter(&catalog(), ""), catalog());
    }

    #[test]
    fn test_symbol_is_not_searched() {
        assert!(filter(&catalog(), "usdt").is_empty());
        assert!(filter(&catalog(), "btc").is_empty());
    }

    #[test]
    fn test_order_is_preserved() {
        let ids: Vec<String> = filter(&catalog(), "e")
            .iter()
            .map(|c| c.id.to_string())
            .collect();
        assert_eq!(ids, vec!["2", "3", "4"]);
    }

    #[test]
    fn test_matches_every_substring_of_a_name() {
        let coins = catalog();
        for coin in &coins {
            let lower = coin.name.to_lowercase();
            for start in 0..lower.len() {
                for end in start + 1..=lower.len() {
                    let term = &lower[start..end];
                    assert!(
                        filter_refs(&coins, term).iter().any(|c| c.id == coin.id),
                        "{} should match {:?}",
                        coin.name,
                        term
                    );
                }
            }
        }
    }
}
