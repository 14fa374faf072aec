//! Import, sink and migration tests against an in-memory SQLite store.

use std::sync::atomic::{AtomicBool, Ordering};

use guci_core::{
  card::{Card, CardId, CardPatch, NewCard},
  store::{CardQuery, CardStore},
};
use guci_store_sqlite::SqliteStore;
use guci_text::{
  CancelFlag, ExportLayout, Resolution, Rosters, ScriptedDisambiguator,
  Strategy, export_text,
};

use crate::{
  CardSink, Error, ImportOptions, ImportStats, SubmitOutcome, delete_card,
  edit_card, import_from_text, migrate_legacy,
};

const YOU_LINE: &str = "黑色：黝。《闲居赋》:“浮梁黝以径度”。";

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn import(store: &SqliteStore, text: &str) -> ImportStats {
  import_from_text(store, text, &ImportOptions::default(), None)
    .await
    .unwrap()
    .stats
}

// ─── A store whose saves can be made to fail or interrupt ────────────────────

#[derive(Debug, thiserror::Error)]
enum FlakyError {
  #[error(transparent)]
  Inner(#[from] guci_store_sqlite::Error),
  #[error("injected persist failure")]
  Injected,
}

struct FlakyStore {
  inner:          SqliteStore,
  fail_persist:   AtomicBool,
  /// Raised by every successful save, as a Ctrl-C mid-import would be.
  cancel_on_save: Option<CancelFlag>,
}

impl FlakyStore {
  async fn new() -> Self {
    Self {
      inner:          store().await,
      fail_persist:   AtomicBool::new(false),
      cancel_on_save: None,
    }
  }

  fn fail_saves(&self, fail: bool) {
    self.fail_persist.store(fail, Ordering::SeqCst);
  }
}

impl CardStore for FlakyStore {
  type Error = FlakyError;

  async fn list_cards(&self) -> Result<Vec<Card>, FlakyError> {
    Ok(self.inner.list_cards().await?)
  }

  async fn get_card(&self, id: &CardId) -> Result<Option<Card>, FlakyError> {
    Ok(self.inner.get_card(id).await?)
  }

  async fn find_by(
    &self,
    keyword: &str,
    source: &str,
  ) -> Result<Option<Card>, FlakyError> {
    Ok(self.inner.find_by(keyword, source).await?)
  }

  async fn find_duplicate(
    &self,
    keyword: &str,
    definition: &str,
  ) -> Result<Option<Card>, FlakyError> {
    Ok(self.inner.find_duplicate(keyword, definition).await?)
  }

  async fn search(&self, query: &CardQuery) -> Result<Vec<Card>, FlakyError> {
    Ok(self.inner.search(query).await?)
  }

  async fn insert(&self, card: &Card) -> Result<(), FlakyError> {
    Ok(self.inner.insert(card).await?)
  }

  async fn update(&self, card: &Card) -> Result<bool, FlakyError> {
    Ok(self.inner.update(card).await?)
  }

  async fn delete(&self, id: &CardId) -> Result<bool, FlakyError> {
    Ok(self.inner.delete(id).await?)
  }

  async fn persist(&self) -> Result<(), FlakyError> {
    if self.fail_persist.load(Ordering::SeqCst) {
      return Err(FlakyError::Injected);
    }
    self.inner.persist().await?;
    if let Some(cancel) = &self.cancel_on_save {
      cancel.cancel();
    }
    Ok(())
  }
}

// ─── Import ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn same_line_twice_adds_then_merges() {
  let s = store().await;

  let first = import(&s, YOU_LINE).await;
  assert_eq!((first.total, first.added, first.merged), (1, 1, 0));

  let second = import(&s, YOU_LINE).await;
  assert_eq!((second.total, second.added, second.merged), (1, 0, 1));

  let cards = s.list_cards().await.unwrap();
  assert_eq!(cards.len(), 1);
  assert_eq!(cards[0].keyword, "黝");
  assert_eq!(cards[0].source, "《闲居赋》");
}

#[tokio::test]
async fn allow_duplicates_adds_a_second_card() {
  let s = store().await;
  import(&s, YOU_LINE).await;
  let options = ImportOptions { allow_duplicates: true, ..Default::default() };
  let stats = import_from_text(&s, YOU_LINE, &options, None)
    .await
    .unwrap()
    .stats;
  assert_eq!(stats.added, 1);
  assert_eq!(s.list_cards().await.unwrap().len(), 2);
}

#[tokio::test]
async fn merge_appends_incoming_notes() {
  let s = store().await;
  import(&s, &format!("{YOU_LINE}\n第一次")).await;
  import(&s, &format!("{YOU_LINE}\n第二次")).await;
  let cards = s.list_cards().await.unwrap();
  assert_eq!(cards.len(), 1);
  assert_eq!(cards[0].notes, "第一次\n\n第二次");
}

#[tokio::test]
async fn header_groups_lines_until_blank() {
  let s = store().await;
  let text = "释\n  解释：出处:“原文”。\n\n乘\n  趁着：《史记》:“乘胜”。";
  let stats = import(&s, text).await;
  assert_eq!(stats.added, 2);
  assert_eq!(stats.failed, 0);

  let cards = s.list_cards().await.unwrap();
  let shi = cards.iter().find(|c| c.definition == "解释").unwrap();
  assert_eq!(shi.keyword, "释");
  assert_eq!(shi.source, "出处");
  assert_eq!(shi.quote, "原文");
  let cheng = cards.iter().find(|c| c.definition == "趁着").unwrap();
  assert_eq!(cheng.keyword, "乘");
}

#[tokio::test]
async fn following_plain_line_becomes_notes() {
  let s = store().await;
  let stats = import(&s, "定义：关键词。出处:“原文”。\n这是注释").await;
  assert_eq!((stats.total, stats.added, stats.failed), (1, 1, 0));
  let cards = s.list_cards().await.unwrap();
  assert_eq!(cards[0].keyword, "关键词");
  assert_eq!(cards[0].notes, "这是注释");
}

#[tokio::test]
async fn export_then_import_reproduces_cards() {
  let s = store().await;
  let text = "黑色：黝。《闲居赋》:“浮梁黝以径度”。\n注一\n\n\
              释\n解释：《论语》:“释之”。\n放下：《庄子》:“释卷”。";
  import(&s, text).await;
  let original = s.list_cards().await.unwrap();
  assert_eq!(original.len(), 3);

  for layout in [ExportLayout::Flat, ExportLayout::Grouped] {
    let exported = export_text(&original, layout);
    let copy = store().await;
    let stats = import(&copy, &exported).await;
    assert_eq!(stats.added, 3, "{exported}");
    assert_eq!(stats.failed, 0, "{exported}");

    let key = |c: &Card| {
      (
        c.keyword.clone(),
        c.definition.clone(),
        c.source.clone(),
        c.quote.clone(),
        c.notes.clone(),
      )
    };
    let mut want: Vec<_> = original.iter().map(key).collect();
    let mut got: Vec<_> = copy.list_cards().await.unwrap().iter().map(key).collect();
    want.sort();
    got.sort();
    assert_eq!(got, want);
  }
}

#[tokio::test]
async fn semantic_strategy_prefers_first_author_fragment() {
  let s = store().await;
  let options = ImportOptions {
    strategy: Strategy::Semantic.build(Rosters::builtin(), None),
    ..Default::default()
  };
  let stats = import_from_text(
    &s,
    "黑色：黝，潘岳作，闲居赋，浮梁黝以径度",
    &options,
    None,
  )
  .await
  .unwrap()
  .stats;
  assert_eq!(stats.added, 1);
  let card = &s.list_cards().await.unwrap()[0];
  assert_eq!(card.keyword, "黝");
  assert_eq!(card.source, "潘岳作");
  assert_eq!(card.quote, "闲居赋浮梁黝以径度");
}

#[tokio::test]
async fn every_unproductive_line_fails_exactly_once() {
  let s = store().await;
  // Lines 2 and 5 have nowhere to go; line 3 is consumed as notes.
  let text = "释\n无卡之注\n黑色：黝。《闲居赋》:“浮梁黝以径度”。\n注\n问：何也？";
  let report = import_from_text(&s, text, &ImportOptions::default(), None)
    .await
    .unwrap();
  let stats = report.stats;
  assert_eq!(stats.failed, 2);
  assert_eq!(stats.added + stats.merged, 1);
  assert_eq!(stats.added + stats.merged + stats.failed, stats.total);
  let lines: Vec<_> = report.failed_lines.iter().map(|f| f.number).collect();
  assert_eq!(lines, vec![2, 5]);
}

#[tokio::test]
async fn empty_input_on_empty_store() {
  let s = store().await;
  assert_eq!(import(&s, "\n \n").await, ImportStats::default());
}

// ─── Rollback ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_save_rolls_back_new_card_and_counts_failed() {
  let s = FlakyStore::new().await;
  s.fail_saves(true);
  let stats = import_from_text(&s, YOU_LINE, &ImportOptions::default(), None)
    .await
    .unwrap()
    .stats;
  assert_eq!((stats.total, stats.added, stats.failed), (1, 0, 1));
  assert!(s.inner.list_cards().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_save_restores_merged_card() {
  let s = FlakyStore::new().await;
  let mut sink = CardSink::load(&s).await.unwrap();
  let mut input = NewCard::new("黝", "黑色");
  input.notes = "原注".into();
  let (id, outcome) = sink.submit(&input, false).await.unwrap();
  assert_eq!(outcome, SubmitOutcome::Added);

  s.fail_saves(true);
  input.notes = "新注".into();
  assert!(matches!(
    sink.submit(&input, false).await,
    Err(Error::Store(_))
  ));
  let card = s.inner.get_card(&id).await.unwrap().unwrap();
  assert_eq!(card.notes, "原注");
}

#[tokio::test]
async fn sink_rejects_blank_definition() {
  let s = store().await;
  let mut sink = CardSink::load(&s).await.unwrap();
  assert!(matches!(
    sink.submit(&NewCard::new("黝", "  "), false).await,
    Err(Error::Core(guci_core::Error::EmptyDefinition))
  ));
}

// ─── Interactive and cancellation ────────────────────────────────────────────

#[tokio::test]
async fn interactive_without_handler_is_rejected() {
  let s = store().await;
  let options = ImportOptions { interactive: true, ..Default::default() };
  assert!(matches!(
    import_from_text(&s, YOU_LINE, &options, None).await,
    Err(Error::MissingDisambiguator)
  ));
}

#[tokio::test]
async fn interactive_answers_become_cards() {
  let s = store().await;
  let mut d = ScriptedDisambiguator::new([Resolution::Definition {
    keyword:    None,
    definition: "解释".into(),
    source:     "《论语》".into(),
    quote:      "".into(),
  }]);
  let options = ImportOptions { interactive: true, ..Default::default() };
  let stats = import_from_text(&s, "释\n奇怪的一行：没有句号", &options, Some(&mut d))
    .await
    .unwrap()
    .stats;
  assert_eq!((stats.added, stats.interactive_fixed), (1, 1));
  let card = &s.list_cards().await.unwrap()[0];
  assert_eq!(card.keyword, "释");
  assert_eq!(card.source, "《论语》");
}

#[tokio::test]
async fn handler_failure_leaves_earlier_imports_intact() {
  let s = store().await;
  import(&s, YOU_LINE).await;

  let mut d = ScriptedDisambiguator::default();
  let options = ImportOptions { interactive: true, ..Default::default() };
  let result =
    import_from_text(&s, "问：何也？", &options, Some(&mut d)).await;
  assert!(matches!(
    result,
    Err(Error::Text(guci_text::Error::Disambiguator(_)))
  ));
  assert_eq!(s.list_cards().await.unwrap().len(), 1);
}

#[tokio::test]
async fn handler_cancel_commits_cards_before_it() {
  let s = store().await;
  let mut d = ScriptedDisambiguator::new([Resolution::Cancel]);
  let options = ImportOptions { interactive: true, ..Default::default() };
  let text = format!("{YOU_LINE}\n\n问：何也？\n放下：释卷。");
  let stats = import_from_text(&s, &text, &options, Some(&mut d))
    .await
    .unwrap()
    .stats;
  assert!(stats.cancelled);
  assert_eq!(stats.added, 1);
  assert_eq!(s.list_cards().await.unwrap().len(), 1);
}

#[tokio::test]
async fn cancel_flag_stops_import() {
  let s = store().await;
  let options = ImportOptions::default();
  options.cancel.cancel();
  let stats = import_from_text(&s, YOU_LINE, &options, None)
    .await
    .unwrap()
    .stats;
  assert!(stats.cancelled);
  assert_eq!(stats.total, 0);
}

#[tokio::test]
async fn cancel_during_storing_stops_before_next_card() {
  let options = ImportOptions::default();
  let s = FlakyStore {
    cancel_on_save: Some(options.cancel.clone()),
    ..FlakyStore::new().await
  };
  let text = "黑色：黝。\n\n放下：释卷。\n\n趁着：乘。";
  let report = import_from_text(&s, text, &options, None).await.unwrap();
  assert!(report.stats.cancelled);
  assert_eq!((report.stats.total, report.stats.added), (1, 1));
  assert_eq!(report.committed.len(), 1);
  let cards = s.inner.list_cards().await.unwrap();
  assert_eq!(cards.len(), 1);
  assert_eq!(cards[0].keyword, "黝");
}

// ─── Card management ─────────────────────────────────────────────────────────

#[tokio::test]
async fn edit_and_delete_cards() {
  let s = store().await;
  import(&s, YOU_LINE).await;
  let id = s.list_cards().await.unwrap()[0].id.clone();

  let patch = CardPatch {
    notes: Some("补注".into()),
    add_tags: vec!["fu".into()],
    ..CardPatch::default()
  };
  let edited = edit_card(&s, &id, patch).await.unwrap();
  assert_eq!(edited.notes, "补注");
  let stored = s.get_card(&id).await.unwrap().unwrap();
  assert!(stored.tags.contains("fu"));

  delete_card(&s, &id).await.unwrap();
  assert!(s.get_card(&id).await.unwrap().is_none());
  assert!(matches!(
    delete_card(&s, &id).await,
    Err(Error::Core(guci_core::Error::CardNotFound(_)))
  ));
}

#[tokio::test]
async fn invalid_edit_leaves_card_unchanged() {
  let s = store().await;
  import(&s, YOU_LINE).await;
  let id = s.list_cards().await.unwrap()[0].id.clone();
  let patch = CardPatch { definition: Some(" ".into()), ..CardPatch::default() };
  assert!(matches!(
    edit_card(&s, &id, patch).await,
    Err(Error::Core(guci_core::Error::EmptyDefinition))
  ));
  assert_eq!(s.get_card(&id).await.unwrap().unwrap().definition, "黑色");
}

// ─── Migration ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn migration_skips_existing_keyword_and_source() {
  let s = store().await;
  import(&s, YOU_LINE).await;

  let json = r#"[
    {"keyword": "黝", "definition": "另一释义", "source": "《闲居赋》"},
    {"keyword": "学而时习之", "definition": "学习了知识然后按时复习它",
     "source": "《论语·学而》", "quote": "子曰", "notes": ""},
    {"keyword": "", "definition": "无关键词"}
  ]"#;
  let stats = migrate_legacy(&s, json).await.unwrap();
  assert_eq!((stats.total, stats.added, stats.skipped, stats.failed), (3, 1, 1, 1));

  let again = migrate_legacy(&s, json).await.unwrap();
  assert_eq!((again.added, again.skipped), (0, 2));
  assert_eq!(s.list_cards().await.unwrap().len(), 2);
}
