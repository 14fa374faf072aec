//! Single-card edits and deletions, persisted immediately.

use chrono::Utc;
use guci_core::{
  card::{Card, CardId, CardPatch},
  store::CardStore,
};

use crate::{Error, Result};

/// Apply `patch` to the card `id` and save it. Returns the updated card.
pub async fn edit_card<S: CardStore>(
  store: &S,
  id: &CardId,
  patch: CardPatch,
) -> Result<Card> {
  let mut card = store
    .get_card(id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| guci_core::Error::CardNotFound(id.clone()))?;
  let previous = card.clone();
  card.apply(patch, Utc::now())?;

  if !store.update(&card).await.map_err(Error::store)? {
    return Err(guci_core::Error::CardNotFound(id.clone()).into());
  }
  if let Err(e) = store.persist().await {
    if let Err(undo) = store.update(&previous).await {
      tracing::warn!(%id, "rollback of edit failed: {undo}");
    }
    return Err(Error::store(e));
  }
  tracing::debug!(%id, "card edited");
  Ok(card)
}

/// Delete the card `id` and save. Returns the deleted card.
pub async fn delete_card<S: CardStore>(store: &S, id: &CardId) -> Result<Card> {
  let card = store
    .get_card(id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| guci_core::Error::CardNotFound(id.clone()))?;

  if !store.delete(id).await.map_err(Error::store)? {
    return Err(guci_core::Error::CardNotFound(id.clone()).into());
  }
  if let Err(e) = store.persist().await {
    if let Err(undo) = store.insert(&card).await {
      tracing::warn!(%id, "rollback of delete failed: {undo}");
    }
    return Err(Error::store(e));
  }
  tracing::debug!(%id, "card deleted");
  Ok(card)
}
