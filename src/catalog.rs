// ============================================================================
// Coin Catalog Loader
// ============================================================================
// Charge toutes les coins stockées sous le préfixe "coin:"
//
// Pas de pagination, pas de retry, pas de cache : un appel = un scan.
// ============================================================================

use tracing::{debug, info, instrument};

use crate::api::{StoreClient, COIN_PREFIX};
use crate::error::StoreError;
use crate::models::CoinRecord;

/// Charge le catalogue complet
///
/// CONCEPT RUST : collect() sur un itérateur de Result
/// - Iterator<Item = Result<T, E>> -> Result<Vec<T>, E>
/// - S'arrête à la première erreur (enregistrement mal formé)
///
/// # Retourne
/// * `Ok(vec![])` si aucune coin n'est stockée
/// * `Err(StoreError::MalformedRecord)` si une entrée n'est pas une coin valide
/// * `Err(...)` pour toute panne du service
#[instrument(skip(client))]
pub async fn load_catalog(client: &dyn StoreClient) -> Result<Vec<CoinRecord>, StoreError> {
    let entries = client.get_with_prefix(COIN_PREFIX).await?;
    debug!(entries = entries.len(), "Catalog entries received");

    let coins = entries
        .into_iter()
        .map(CoinRecord::from_entry)
        .collect::<Result<Vec<_>, _>>()?;

    info!(coins = coins.len(), "Catalog loaded");
    Ok(coins)
}
