//! End-to-end block session scenarios: schema load, editing, auto-save,
//! repeater bounds, gallery ordering, preview toggle, mount lifecycle,
//! and lookup supersession — all driven through the deterministic driver.

use bform_backend::memory::{MemoryAssets, MemoryState};
use bform_backend::{AssetMeta, PreviewError, StateStore};
use bform_render::{
    Action, AssetView, Control, Diagnostic, FieldTarget, Node, ViewMode,
};
use bform_runtime::{
    BlockSession, Cmd, Driver, Effect, EngineConfig, Indicator, MountEvent, Msg, Phase,
    PreviewState, SessionOptions,
};
use bform_schema::registry::AttributeEncoding;
use bform_schema::{
    BlockDef, BlockRegistry, Direction, FieldSchema, FieldType, Row, Value, ValueMap,
};
use bform_store::{Persisted, ValueStore};
use bform_widgets::ViewLookup;

type TestPreview = fn(&str, &ValueMap, u8) -> Result<String, PreviewError>;

fn hero_fields() -> Vec<FieldSchema> {
    vec![
        FieldSchema::new("title", FieldType::Text).with_default("".into()),
        FieldSchema::new("content", FieldType::RichText).with_default("".into()),
        FieldSchema::new("image", FieldType::Media),
        FieldSchema::new("photos", FieldType::Gallery),
        FieldSchema::new("items", FieldType::Repeater)
            .with_row_bounds(1, 3)
            .with_sub_fields([
                FieldSchema::new("caption", FieldType::Text).with_default("untitled".into()),
                FieldSchema::new("body", FieldType::RichText),
            ]),
    ]
}

fn registry() -> BlockRegistry {
    let mut registry = BlockRegistry::new();
    registry
        .register(BlockDef::new("hero", "Hero", hero_fields()))
        .unwrap();
    registry
}

fn preview_ok(block_type: &str, values: &ValueMap, _depth: u8) -> Result<String, PreviewError> {
    let title = values
        .get("title")
        .and_then(Value::as_text)
        .unwrap_or_default();
    Ok(format!("<div class=\"{block_type}\">{title}</div>"))
}

fn preview_empty(_: &str, _: &ValueMap, _: u8) -> Result<String, PreviewError> {
    Ok(String::new())
}

fn preview_fail(_: &str, _: &ValueMap, _: u8) -> Result<String, PreviewError> {
    Err(PreviewError("template exploded".to_owned()))
}

fn driver_with(
    preview: TestPreview,
) -> Driver<BlockRegistry, MemoryAssets, TestPreview, MemoryState> {
    Driver::new(registry(), MemoryAssets::new(), preview, MemoryState::new())
}

fn modal_session(store: ValueStore) -> BlockSession {
    BlockSession::new(
        SessionOptions::new("hero", bform_render::RenderContext::Modal)
            .in_document("doc1", 2)
            .with_id_seed("test"),
        store,
    )
}

fn canvas_session(store: ValueStore) -> BlockSession {
    BlockSession::new(
        SessionOptions::new("hero", bform_render::RenderContext::EditorCanvas)
            .in_document("doc1", 2)
            .with_id_seed("test"),
        store,
    )
}

fn store_with(values: ValueMap) -> ValueStore {
    ValueStore::load(AttributeEncoding::PerField, Persisted::PerField(values))
}

fn one_row_store() -> ValueStore {
    let mut row = Row::new("r1");
    row.set("caption", Value::text("first"));
    store_with(ValueMap::from([(
        "items".to_owned(),
        Value::Rows(vec![row]),
    )]))
}

fn text_input_value(tree: &Node, key: &str) -> String {
    let controls = tree.find_all(|n| {
        matches!(n, Node::Control { target, control: Control::TextInput { .. } } if target.key() == key)
    });
    let Node::Control {
        control: Control::TextInput { value, .. },
        ..
    } = controls[0]
    else {
        unreachable!();
    };
    value.clone()
}

#[test]
fn schema_load_renders_stored_values_over_defaults() {
    // Only title is stored; content falls back to its declared default.
    let mut driver = driver_with(preview_ok);
    let mut session = modal_session(store_with(ValueMap::from([(
        "title".to_owned(),
        Value::text("Hello"),
    )])));
    driver.start(&mut session);

    assert_eq!(*session.phase(), Phase::Ready);
    let tree = session.view();
    assert_eq!(text_input_value(&tree, "title"), "Hello");

    let rich = tree.find_all(|n| {
        matches!(
            n,
            Node::Control {
                control: Control::RichText { .. },
                ..
            }
        )
    });
    assert!(matches!(
        rich[0],
        Node::Control {
            control: Control::RichText { content, .. },
            ..
        } if content.is_empty()
    ));
}

#[test]
fn unknown_block_type_is_an_inline_error() {
    let mut driver = driver_with(preview_ok);
    let mut session = BlockSession::new(
        SessionOptions::new("missing", bform_render::RenderContext::EditorCanvas),
        ValueStore::new(AttributeEncoding::PerField),
    );
    driver.start(&mut session);

    assert!(matches!(session.phase(), Phase::Failed(_)));
    let tree = session.view();
    assert_eq!(
        tree.find_all(|n| matches!(
            n,
            Node::Diagnostic(Diagnostic::SchemaUnavailable { .. })
        ))
        .len(),
        1
    );
    // No form fields rendered.
    assert!(tree.bindings().is_empty());
}

#[test]
fn ten_rapid_edits_produce_one_commit_with_final_values() {
    let mut driver = driver_with(preview_ok);
    let mut session = modal_session(store_with(ValueMap::new()));
    driver.start(&mut session);

    for i in 0..10 {
        driver.set_value(
            &mut session,
            FieldTarget::field("title"),
            Value::text(format!("draft {i}")),
        );
        driver.advance(&mut session, 10);
    }
    assert_eq!(session.indicator(), Indicator::Pending);
    assert!(driver.persisted().is_empty(), "debounce window still open");

    driver.advance(&mut session, 600);
    assert_eq!(driver.persisted().len(), 1, "edits coalesce into one flush");
    let (payload, flushed_at) = &driver.persisted()[0];
    assert_eq!(payload.get("title"), Some(&Value::text("draft 9")));
    assert_eq!(*flushed_at, 590);
    assert!(matches!(session.indicator(), Indicator::Saved { .. }));

    // Saved indicator clears after the display window.
    driver.advance(&mut session, 2_100);
    assert_eq!(session.indicator(), Indicator::Idle);
}

#[test]
fn canvas_edits_do_not_autosave_by_default() {
    let mut driver = driver_with(preview_ok);
    let mut session = canvas_session(store_with(ValueMap::new()));
    driver.start(&mut session);

    driver.set_value(&mut session, FieldTarget::field("title"), Value::text("x"));
    driver.advance(&mut session, 10_000);
    assert!(driver.persisted().is_empty());
    assert_eq!(session.indicator(), Indicator::Idle);
    // The store still took the value immediately.
    assert_eq!(session.store().get("title"), Some(&Value::text("x")));
}

#[test]
fn repeater_add_respects_max_and_remove_respects_min() {
    // min=1, max=3, starting with one row.
    let mut driver = driver_with(preview_ok);
    let mut session = canvas_session(one_row_store());
    driver.start(&mut session);

    let rows = |s: &BlockSession| {
        s.store()
            .get("items")
            .and_then(Value::as_rows)
            .map(<[Row]>::len)
            .unwrap_or(0)
    };
    assert_eq!(rows(&session), 1);

    driver.action(&mut session, Action::AddRow { field: "items".into() });
    driver.action(&mut session, Action::AddRow { field: "items".into() });
    assert_eq!(rows(&session), 3);

    let before = session.store().get("items").cloned();
    driver.action(&mut session, Action::AddRow { field: "items".into() });
    assert_eq!(rows(&session), 3, "add at max is a no-op");
    assert_eq!(session.store().get("items").cloned(), before);

    // Deleting down to min works; deleting past it is rejected.
    driver.action(
        &mut session,
        Action::ConfirmRemoveRow { field: "items".into(), index: 2 },
    );
    driver.action(
        &mut session,
        Action::ConfirmRemoveRow { field: "items".into(), index: 1 },
    );
    assert_eq!(rows(&session), 1);
    driver.action(
        &mut session,
        Action::ConfirmRemoveRow { field: "items".into(), index: 0 },
    );
    assert_eq!(rows(&session), 1, "sole row is protected by min");
}

#[test]
fn row_ids_stay_with_rows_across_moves() {
    let mut driver = driver_with(preview_ok);
    let mut session = canvas_session(one_row_store());
    driver.start(&mut session);
    driver.action(&mut session, Action::AddRow { field: "items".into() });

    let ids_before: Vec<String> = session
        .store()
        .get("items")
        .and_then(Value::as_rows)
        .unwrap()
        .iter()
        .map(|r| r.id.clone())
        .collect();

    driver.action(
        &mut session,
        Action::MoveRow {
            field: "items".into(),
            index: 0,
            direction: Direction::Down,
        },
    );
    let rows = session.store().get("items").and_then(Value::as_rows).unwrap();
    assert_eq!(rows[0].id, ids_before[1]);
    assert_eq!(rows[1].id, ids_before[0]);
    assert_eq!(rows[1].get("caption"), Some(&Value::text("first")));
}

#[test]
fn legacy_rows_get_ids_and_are_resaved_immediately() {
    let blob = r#"{"items": [{"caption": "old"}]}"#;
    let store = ValueStore::load(
        AttributeEncoding::LegacyBlob,
        Persisted::Blob(blob.to_owned()),
    );
    let mut driver = driver_with(preview_ok);
    let mut session = canvas_session(store);
    driver.start(&mut session);

    // The lazy id assignment forced a re-save of the rows.
    assert_eq!(driver.persisted().len(), 1);
    let (payload, _) = &driver.persisted()[0];
    let rows = payload.get("items").and_then(Value::as_rows).unwrap();
    assert!(!rows[0].id.is_empty());
    assert_eq!(rows[0].get("caption"), Some(&Value::text("old")));

    // Write encoding stays blob.
    assert!(matches!(session.store().serialize(), Persisted::Blob(_)));
}

#[test]
fn gallery_remove_preserves_relative_order() {
    // [5, 7, 2] with index 1 (id 7) removed becomes [5, 2].
    let mut driver = driver_with(preview_ok);
    let mut session = canvas_session(store_with(ValueMap::from([(
        "photos".to_owned(),
        Value::List(vec![Value::Number(5.0), Value::Number(7.0), Value::Number(2.0)]),
    )])));
    driver.start(&mut session);

    driver.action(
        &mut session,
        Action::GalleryRemove {
            target: FieldTarget::field("photos"),
            index: 1,
        },
    );
    assert_eq!(
        session.store().get("photos"),
        Some(&Value::List(vec![Value::Number(5.0), Value::Number(2.0)]))
    );

    // Boundary move is a no-op.
    let before = session.store().get("photos").cloned();
    driver.action(
        &mut session,
        Action::GalleryMove {
            target: FieldTarget::field("photos"),
            index: 1,
            direction: Direction::Down,
        },
    );
    assert_eq!(session.store().get("photos").cloned(), before);
}

#[test]
fn preview_toggle_persists_mode_and_never_mutates_values() {
    let mut driver = driver_with(preview_ok);
    let mut session = modal_session(store_with(ValueMap::from([(
        "title".to_owned(),
        Value::text("Hello"),
    )])));
    driver.start(&mut session);
    let values_before = session.store().values().clone();

    driver.action(&mut session, Action::SetMode(ViewMode::Preview));
    assert_eq!(session.mode(), ViewMode::Preview);
    assert_eq!(
        driver.state().get("block_mode_doc1_2"),
        Some("preview".to_owned())
    );
    let tree = session.view();
    let previews = tree.find_all(|n| matches!(n, Node::Preview { .. }));
    assert!(matches!(
        previews[0],
        Node::Preview { markup } if markup.contains("Hello")
    ));

    driver.action(&mut session, Action::SetMode(ViewMode::Edit));
    assert_eq!(
        driver.state().get("block_mode_doc1_2"),
        Some("edit".to_owned())
    );
    assert_eq!(session.store().values(), &values_before);
}

#[test]
fn empty_preview_output_renders_explicit_empty_state() {
    let mut driver = driver_with(preview_empty);
    let mut session = modal_session(store_with(ValueMap::new()));
    driver.start(&mut session);
    driver.action(&mut session, Action::SetMode(ViewMode::Preview));

    assert_eq!(*session.preview_state(), PreviewState::EmptyOutput);
    let tree = session.view();
    assert_eq!(tree.find_all(|n| matches!(n, Node::Empty { .. })).len(), 1);
}

#[test]
fn failed_preview_renders_diagnostic_not_blank() {
    let mut driver = driver_with(preview_fail);
    let mut session = modal_session(store_with(ValueMap::new()));
    driver.start(&mut session);
    driver.action(&mut session, Action::SetMode(ViewMode::Preview));

    let tree = session.view();
    assert_eq!(
        tree.find_all(|n| matches!(n, Node::Diagnostic(Diagnostic::PreviewFailed { .. })))
            .len(),
        1
    );
}

#[test]
fn embed_depth_cap_blocks_recursive_preview() {
    let mut driver = driver_with(preview_fail); // must never be called
    let mut session = BlockSession::new(
        SessionOptions::new("hero", bform_render::RenderContext::EditorCanvas)
            .with_embed_depth(3, true)
            .with_config(EngineConfig::default()),
        ValueStore::new(AttributeEncoding::PerField),
    );
    driver.start(&mut session);
    driver.action(&mut session, Action::SetMode(ViewMode::Preview));

    assert_eq!(*session.preview_state(), PreviewState::DepthCapped);
    let tree = session.view();
    assert_eq!(
        tree.find_all(|n| matches!(
            n,
            Node::Diagnostic(Diagnostic::EmbedDepthExceeded { depth: 3, .. })
        ))
        .len(),
        1
    );
}

#[test]
fn editor_mounts_once_per_slot_and_destroys_on_preview() {
    let mut driver = driver_with(preview_ok);
    let mut session = modal_session(one_row_store());
    driver.start(&mut session);

    let mounted: Vec<String> = driver
        .mount_log()
        .iter()
        .filter_map(|e| match e {
            MountEvent::Mounted(m) => Some(m.0.clone()),
            MountEvent::Destroyed(_) => None,
        })
        .collect();
    // Top-level content plus the row's body, keyed by stable row id.
    assert_eq!(mounted, ["content", "items.r1.body"]);

    driver.action(&mut session, Action::SetMode(ViewMode::Preview));
    let destroyed = driver
        .mount_log()
        .iter()
        .filter(|e| matches!(e, MountEvent::Destroyed(_)))
        .count();
    assert_eq!(destroyed, 2, "each mount is destroyed exactly once");

    driver.action(&mut session, Action::SetMode(ViewMode::Edit));
    let mounted_total = driver
        .mount_log()
        .iter()
        .filter(|e| matches!(e, MountEvent::Mounted(_)))
        .count();
    assert_eq!(mounted_total, 4, "remount after returning to edit");
}

#[test]
fn row_reorder_keeps_editor_mounts_alive() {
    let mut driver = driver_with(preview_ok);
    let mut session = canvas_session(one_row_store());
    driver.start(&mut session);
    driver.action(&mut session, Action::AddRow { field: "items".into() });
    let log_len = driver.mount_log().len();

    driver.action(
        &mut session,
        Action::MoveRow {
            field: "items".into(),
            index: 0,
            direction: Direction::Down,
        },
    );
    assert_eq!(
        driver.mount_log().len(),
        log_len,
        "row-id keyed mounts survive reorders untouched"
    );
}

#[test]
fn unresolvable_asset_shows_raw_id_and_does_not_block_saving() {
    let mut driver = driver_with(preview_ok);
    let mut session = modal_session(store_with(ValueMap::from([(
        "image".to_owned(),
        Value::Number(99.0),
    )])));
    driver.start(&mut session);

    assert_eq!(
        session.asset_view(&FieldTarget::field("image"), 99),
        AssetView::Unresolved(99)
    );
    // The value persists regardless.
    driver.advance(&mut session, 1_000);
    assert_eq!(session.store().get("image"), Some(&Value::Number(99.0)));
}

#[test]
fn resolved_asset_metadata_reaches_the_view() {
    let mut assets = MemoryAssets::new();
    assets.insert_media(AssetMeta {
        id: 5,
        url: "https://assets.test/5.jpg".to_owned(),
        filename: "5.jpg".to_owned(),
        title: "Five".to_owned(),
        mime: Some("image/jpeg".to_owned()),
    });
    let mut driver = Driver::new(
        registry(),
        assets,
        preview_ok as TestPreview,
        MemoryState::new(),
    );
    let mut session = modal_session(store_with(ValueMap::from([(
        "image".to_owned(),
        Value::Number(5.0),
    )])));
    driver.start(&mut session);

    let view = session.asset_view(&FieldTarget::field("image"), 5);
    assert!(matches!(view, AssetView::Resolved(meta) if meta.title == "Five"));
}

#[test]
fn stale_lookup_result_is_ignored() {
    // Drive the session by hand so two requests for the same id overlap.
    let mut session = modal_session(store_with(ValueMap::new()));
    let _ = session.init();
    let _ = session.update(Msg::SchemaLoaded {
        result: Ok(hero_fields()),
        at: 0,
    });

    let target = FieldTarget::field("image");
    let gen_of = |cmd: Cmd| {
        cmd.flatten().into_iter().find_map(|leaf| match leaf {
            Cmd::Effect(Effect::LookupMedia { generation, .. }) => Some(generation),
            _ => None,
        })
    };
    let first = gen_of(session.update(Msg::SetValue {
        target: target.clone(),
        value: Value::Number(5.0),
        at: 0,
    }))
    .expect("first lookup issued");
    let second = gen_of(session.update(Msg::SetValue {
        target: target.clone(),
        value: Value::Number(5.0),
        at: 1,
    }))
    .expect("re-selection issues a fresh lookup");
    assert!(second > first);

    // The stale completion must not win.
    let _ = session.update(Msg::AssetResolved {
        target: target.clone(),
        id: 5,
        generation: first,
        result: Ok(AssetMeta {
            id: 5,
            url: "stale".to_owned(),
            filename: "stale".to_owned(),
            title: "stale".to_owned(),
            mime: None,
        }),
    });
    assert_eq!(session.asset_view(&target, 5), AssetView::Loading(5));

    let _ = session.update(Msg::AssetResolved {
        target: target.clone(),
        id: 5,
        generation: second,
        result: Ok(AssetMeta {
            id: 5,
            url: "fresh".to_owned(),
            filename: "fresh".to_owned(),
            title: "fresh".to_owned(),
            mime: None,
        }),
    });
    assert!(
        matches!(session.asset_view(&target, 5), AssetView::Resolved(meta) if meta.url == "fresh")
    );
}

#[test]
fn flush_skips_fields_that_vanished_and_continues() {
    let mut session = modal_session(store_with(ValueMap::new()));
    let _ = session.init();
    let _ = session.update(Msg::SchemaLoaded {
        result: Ok(hero_fields()),
        at: 0,
    });
    let _ = session.update(Msg::SetValue {
        target: FieldTarget::field("title"),
        value: Value::text("keep"),
        at: 0,
    });
    let _ = session.update(Msg::SetValue {
        target: FieldTarget::field("content"),
        value: Value::text("<p>x</p>"),
        at: 0,
    });

    // A schema refetch dropped the content field before the flush fired.
    let reduced: Vec<FieldSchema> = hero_fields()
        .into_iter()
        .filter(|f| f.id != "content")
        .collect();
    let _ = session.update(Msg::SchemaLoaded {
        result: Ok(reduced),
        at: 100,
    });

    let cmd = session.update(Msg::Tick { now: 600 });
    let payload = cmd.flatten().into_iter().find_map(|leaf| match leaf {
        Cmd::Effect(Effect::PersistAttributes { payload, .. }) => Some(payload),
        _ => None,
    });
    let payload = payload.expect("flush still happens");
    assert_eq!(payload.get("title"), Some(&Value::text("keep")));
    assert!(
        !payload.contains_key("content"),
        "unreadable field is skipped, not fatal"
    );
}

#[test]
fn picker_selection_routes_through_set_value() {
    let mut driver = driver_with(preview_ok);
    let mut session = modal_session(store_with(ValueMap::new()));
    driver.start(&mut session);

    driver.action(
        &mut session,
        Action::OpenAssetPicker {
            target: FieldTarget::field("photos"),
            multiple: true,
        },
    );
    assert_eq!(driver.picker_requests().len(), 1);
    assert!(driver.picker_requests()[0].multiple);

    driver.pick_assets(&mut session, FieldTarget::field("photos"), vec![5, 7]);
    assert_eq!(
        session.store().get("photos"),
        Some(&Value::List(vec![Value::Number(5.0), Value::Number(7.0)]))
    );
}
