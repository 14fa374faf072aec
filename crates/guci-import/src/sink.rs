//! The card sink: turns validated card input into stored cards, merging
//! exact duplicates and assigning identity.

use std::collections::HashSet;

use chrono::{Local, Utc};
use guci_core::{
  card::{Card, CardId, NewCard},
  store::CardStore,
};
use rand_core::{OsRng, RngCore};

use crate::{Error, Result};

/// UUIDs tried before falling back to a time-plus-random id.
const UUID_ATTEMPTS: usize = 10;

/// Whether a submission created a card or folded into an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
  Added,
  Merged,
}

/// Writes cards into a [`CardStore`], one submission at a time.
///
/// Holds the ids known at load time plus every id it has issued since, so
/// generated ids are unique against the whole collection.
pub struct CardSink<'s, S> {
  store:     &'s S,
  known_ids: HashSet<CardId>,
}

impl<'s, S: CardStore> CardSink<'s, S> {
  pub async fn load(store: &'s S) -> Result<Self> {
    let known_ids = store
      .list_cards()
      .await
      .map_err(Error::store)?
      .into_iter()
      .map(|c| c.id)
      .collect();
    Ok(Self { store, known_ids })
  }

  /// Store `input`.
  ///
  /// Unless `allow_duplicates` is set, a card with the same trimmed keyword
  /// and definition absorbs the input instead (see [`Card::merge`]). A failed
  /// save undoes the write before the error is returned.
  pub async fn submit(
    &mut self,
    input: &NewCard,
    allow_duplicates: bool,
  ) -> Result<(CardId, SubmitOutcome)> {
    let input = input.clone().validate()?;

    if !allow_duplicates
      && let Some(existing) = self
        .store
        .find_duplicate(&input.keyword, &input.definition)
        .await
        .map_err(Error::store)?
    {
      let id = self.merge(existing, &input).await?;
      return Ok((id, SubmitOutcome::Merged));
    }

    let id = self.fresh_id();
    let card = Card::from_new(id.clone(), input, Utc::now());
    self.store.insert(&card).await.map_err(Error::store)?;
    if let Err(e) = self.store.persist().await {
      if let Err(undo) = self.store.delete(&card.id).await {
        tracing::warn!(id = %card.id, "rollback of new card failed: {undo}");
      }
      return Err(Error::store(e));
    }

    tracing::debug!(id = %id, keyword = %card.keyword, "card added");
    self.known_ids.insert(id.clone());
    Ok((id, SubmitOutcome::Added))
  }

  async fn merge(&mut self, existing: Card, input: &NewCard) -> Result<CardId> {
    let mut merged = existing.clone();
    merged.merge(input, Utc::now());

    if !self.store.update(&merged).await.map_err(Error::store)? {
      return Err(guci_core::Error::CardNotFound(merged.id).into());
    }
    if let Err(e) = self.store.persist().await {
      if let Err(undo) = self.store.update(&existing).await {
        tracing::warn!(id = %existing.id, "rollback of merge failed: {undo}");
      }
      return Err(Error::store(e));
    }

    tracing::debug!(id = %merged.id, keyword = %merged.keyword, "card merged");
    Ok(merged.id)
  }

  fn fresh_id(&self) -> CardId { self.fresh_id_from(CardId::random) }

  fn fresh_id_from(&self, mut next_uuid: impl FnMut() -> CardId) -> CardId {
    for _ in 0..UUID_ATTEMPTS {
      let id = next_uuid();
      if !self.known_ids.contains(&id) {
        return id;
      }
    }
    tracing::warn!("repeated id collisions, using a composite id");
    loop {
      let id = composite_id();
      if !self.known_ids.contains(&id) {
        return id;
      }
    }
  }
}

/// `YYYYMMDDHHMMSS_NNNN` from local time and four random digits.
fn composite_id() -> CardId {
  let suffix = 1000 + OsRng.next_u32() % 9000;
  CardId::from(format!("{}_{suffix}", Local::now().format("%Y%m%d%H%M%S")))
}

#[cfg(test)]
mod tests {
  use super::*;

  struct NoStore;

  impl CardStore for NoStore {
    type Error = std::io::Error;

    async fn list_cards(&self) -> Result<Vec<Card>, Self::Error> { Ok(vec![]) }

    async fn get_card(&self, _: &CardId) -> Result<Option<Card>, Self::Error> {
      Ok(None)
    }

    async fn find_by(
      &self,
      _: &str,
      _: &str,
    ) -> Result<Option<Card>, Self::Error> {
      Ok(None)
    }

    async fn find_duplicate(
      &self,
      _: &str,
      _: &str,
    ) -> Result<Option<Card>, Self::Error> {
      Ok(None)
    }

    async fn search(
      &self,
      _: &guci_core::store::CardQuery,
    ) -> Result<Vec<Card>, Self::Error> {
      Ok(vec![])
    }

    async fn insert(&self, _: &Card) -> Result<(), Self::Error> { Ok(()) }

    async fn update(&self, _: &Card) -> Result<bool, Self::Error> { Ok(false) }

    async fn delete(&self, _: &CardId) -> Result<bool, Self::Error> {
      Ok(false)
    }

    async fn persist(&self) -> Result<(), Self::Error> { Ok(()) }
  }

  #[test]
  fn colliding_uuids_fall_back_to_composite_id() {
    let taken = CardId::from("taken");
    let sink = CardSink {
      store:     &NoStore,
      known_ids: HashSet::from([taken.clone()]),
    };
    let id = sink.fresh_id_from(|| taken.clone());
    let (stamp, digits) = id.as_str().split_once('_').unwrap();
    assert_eq!(stamp.len(), 14);
    assert!(stamp.chars().all(|c| c.is_ascii_digit()));
    let n: u32 = digits.parse().unwrap();
    assert!((1000..10000).contains(&n));
  }

  #[test]
  fn fresh_uuid_used_when_free() {
    let sink = CardSink { store: &NoStore, known_ids: HashSet::new() };
    let id = sink.fresh_id();
    assert_eq!(id.as_str().len(), 36);
  }
}
