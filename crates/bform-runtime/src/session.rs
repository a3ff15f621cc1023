//! The block session model.
//!
//! One [`BlockSession`] owns one block instance's state for one editing
//! surface: the value store, decoded repeater rows, asset resolution
//! caches, embedded-editor mounts, the preview/edit mode, and the
//! auto-save coordinator. All mutation funnels through [`update`]; all
//! output comes from [`view`]. The session never touches a backend —
//! side effects leave as [`Effect`]s and come back as [`Msg`]s.
//!
//! [`update`]: BlockSession::update
//! [`view`]: BlockSession::view

use ahash::{AHashMap, AHashSet};
use bform_render::{
    Action, AssetView, Diagnostic, FieldTarget, MountId, Node, PostView, RenderContext,
    StatusKind, ViewMode,
};
use bform_schema::{Direction, FieldSchema, FieldType, RowIdGen, Value, ValueMap};
use bform_store::{RepeaterState, ValueStore};
use bform_widgets::{PostSearchView, ViewLookup, WidgetSet, render_form};

use crate::autosave::{Autosave, Indicator};
use crate::config::EngineConfig;
use crate::lookup::LookupTable;
use crate::msg::{Cmd, Effect, Msg};

/// Schema lifecycle of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Schema fetch outstanding; the form shows a loading state.
    Loading,
    /// Schema fetch failed; the form is an inline error, no fields.
    Failed(String),
    Ready,
}

/// Preview surface state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewState {
    Idle,
    Loading,
    Ready(String),
    /// The render succeeded but produced nothing.
    EmptyOutput,
    Failed(String),
    /// This block embeds documents and the render chain is at the depth
    /// cap; rendering would recurse.
    DepthCapped,
}

/// Construction parameters for a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub block_type: String,
    pub context: RenderContext,
    /// Document identity for client-side mode persistence.
    pub document: String,
    /// Block position within the document.
    pub position: usize,
    /// Mode loaded from client state before construction.
    pub initial_mode: ViewMode,
    /// Document-embedding depth this session renders at (0 = top level).
    pub embed_depth: u8,
    /// Whether this block type can embed documents containing blocks.
    pub embeds_documents: bool,
    pub config: EngineConfig,
    /// Seed for generated row ids, unique per editing session.
    pub id_seed: String,
}

impl SessionOptions {
    #[must_use]
    pub fn new(block_type: impl Into<String>, context: RenderContext) -> Self {
        Self {
            block_type: block_type.into(),
            context,
            document: "new".to_owned(),
            position: 0,
            initial_mode: ViewMode::Edit,
            embed_depth: 0,
            embeds_documents: false,
            config: EngineConfig::default(),
            id_seed: "s".to_owned(),
        }
    }

    #[must_use]
    pub fn in_document(mut self, document: impl Into<String>, position: usize) -> Self {
        self.document = document.into();
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ViewMode) -> Self {
        self.initial_mode = mode;
        self
    }

    #[must_use]
    pub fn with_embed_depth(mut self, depth: u8, embeds_documents: bool) -> Self {
        self.embed_depth = depth;
        self.embeds_documents = embeds_documents;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_id_seed(mut self, seed: impl Into<String>) -> Self {
        self.id_seed = seed.into();
        self
    }
}

/// The per-instance model.
pub struct BlockSession {
    opts: SessionOptions,
    widgets: WidgetSet,
    phase: Phase,
    fields: Vec<FieldSchema>,
    store: ValueStore,
    repeaters: AHashMap<String, RepeaterState>,
    armed_remove: AHashMap<String, usize>,
    ids: RowIdGen,
    autosave: Autosave,
    lookups: LookupTable,
    assets: AHashMap<(String, u64), AssetView>,
    posts: AHashMap<(String, u64), PostView>,
    searches: AHashMap<String, PostSearchView>,
    mounts: AHashSet<MountId>,
    mode: ViewMode,
    preview: PreviewState,
    preview_gen: u64,
}

impl BlockSession {
    #[must_use]
    pub fn new(opts: SessionOptions, store: ValueStore) -> Self {
        let autosave = Autosave::new(opts.config.debounce_ms, opts.config.saved_display_ms);
        let ids = RowIdGen::new(opts.id_seed.clone());
        let mode = opts.initial_mode;
        Self {
            opts,
            widgets: WidgetSet::standard(),
            phase: Phase::Loading,
            fields: Vec::new(),
            store,
            repeaters: AHashMap::new(),
            armed_remove: AHashMap::new(),
            ids,
            autosave,
            lookups: LookupTable::new(),
            assets: AHashMap::new(),
            posts: AHashMap::new(),
            searches: AHashMap::new(),
            mounts: AHashSet::new(),
            mode,
            preview: PreviewState::Idle,
            preview_gen: 0,
        }
    }

    /// Startup command: fetch this block type's schema.
    #[must_use]
    pub fn init(&mut self) -> Cmd {
        Cmd::effect(Effect::FetchSchema {
            block_type: self.opts.block_type.clone(),
        })
    }

    #[must_use]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    #[must_use]
    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    #[must_use]
    pub fn preview_state(&self) -> &PreviewState {
        &self.preview
    }

    #[must_use]
    pub fn store(&self) -> &ValueStore {
        &self.store
    }

    #[must_use]
    pub fn indicator(&self) -> Indicator {
        self.autosave.indicator()
    }

    // ── Update ──────────────────────────────────────────────────────────

    pub fn update(&mut self, msg: Msg) -> Cmd {
        match msg {
            Msg::SchemaLoaded { result, at } => self.on_schema(result, at),
            Msg::SetValue { target, value, at } => self.on_set_value(target, value, at),
            Msg::Action { action, at } => self.on_action(action, at),
            Msg::AssetPicked { target, ids, at } => self.on_asset_picked(target, ids, at),
            Msg::AssetResolved {
                target,
                id,
                generation,
                result,
            } => {
                let key = lookup_key(&target, id);
                if self.lookups.is_current(&key, generation) {
                    let view = match result {
                        Ok(meta) => AssetView::Resolved(meta),
                        Err(err) => {
                            tracing::debug!(
                                target: "bform.session",
                                id,
                                error = %err,
                                "asset unresolved"
                            );
                            AssetView::Unresolved(id)
                        }
                    };
                    self.assets.insert((target.key(), id), view);
                }
                Cmd::none()
            }
            Msg::PostResolved {
                target,
                id,
                generation,
                result,
            } => {
                let key = lookup_key(&target, id);
                if self.lookups.is_current(&key, generation) {
                    let view = match result {
                        Ok(post) => PostView::Resolved(post),
                        Err(_) => PostView::Unresolved(id),
                    };
                    self.posts.insert((target.key(), id), view);
                }
                Cmd::none()
            }
            Msg::PostSearchDone {
                target,
                generation,
                result,
            } => {
                let key = search_key(&target);
                if self.lookups.is_current(&key, generation) {
                    let entry = self.searches.entry(target.key()).or_default();
                    entry.searching = false;
                    entry.results = result.unwrap_or_default();
                }
                Cmd::none()
            }
            Msg::PreviewRendered { generation, result } => {
                if generation == self.preview_gen && self.mode == ViewMode::Preview {
                    self.preview = match result {
                        Ok(markup) if markup.trim().is_empty() => PreviewState::EmptyOutput,
                        Ok(markup) => PreviewState::Ready(markup),
                        Err(err) => PreviewState::Failed(err.to_string()),
                    };
                }
                Cmd::none()
            }
            Msg::PersistDone { at } => {
                self.autosave.commit_done(at);
                self.wake_cmd(at)
            }
            Msg::Tick { now } => self.on_tick(now),
        }
    }

    fn on_schema(&mut self, result: Result<Vec<FieldSchema>, bform_schema::SchemaFetchError>, at: u64) -> Cmd {
        let fields = match result {
            Ok(fields) => fields,
            Err(err) => {
                self.phase = Phase::Failed(err.to_string());
                return Cmd::none();
            }
        };
        self.phase = Phase::Ready;
        self.fields = fields;

        let mut cmds = Vec::new();
        let mut resave: ValueMap = ValueMap::new();

        for schema in &self.fields {
            if schema.field_type == FieldType::Repeater {
                let value = self.store.value_or_default(schema);
                let (state, changed) = RepeaterState::load(schema, value, &mut self.ids);
                if changed {
                    self.store.set_one(schema.id.clone(), state.to_value());
                    resave.insert(schema.id.clone(), state.to_value());
                }
                self.repeaters.insert(schema.id.clone(), state);
            }
        }
        // Legacy rows were assigned ids: persist them right away so the
        // assignment survives a reload.
        if !resave.is_empty() {
            cmds.push(Cmd::effect(Effect::PersistAttributes {
                payload: resave,
                flushed_at: at,
            }));
        }

        cmds.extend(self.initial_lookup_effects());
        cmds.extend(self.sync_mounts());
        Cmd::batch(cmds)
    }

    fn on_set_value(&mut self, target: FieldTarget, value: Value, at: u64) -> Cmd {
        if self.phase != Phase::Ready {
            return Cmd::none();
        }
        let Some(leaf) = self.leaf_schema(&target).cloned() else {
            tracing::warn!(
                target: "bform.session",
                key = %target.key(),
                "set for unknown field ignored"
            );
            return Cmd::none();
        };
        // Repeater row lists mutate through actions, not raw sets.
        if leaf.field_type == FieldType::Repeater {
            return Cmd::none();
        }

        let mut cmds = Vec::new();
        match &target {
            FieldTarget::Field { field } => {
                self.store.set_one(field.clone(), value.clone());
            }
            FieldTarget::RowField {
                field,
                row,
                sub_field,
            } => {
                let Some(rep) = self.repeaters.get_mut(field) else {
                    return Cmd::none();
                };
                if !rep.update_row_field(*row, sub_field, value.clone()) {
                    return Cmd::none();
                }
                let rows = rep.to_value();
                self.store.set_one(field.clone(), rows);
            }
        }

        cmds.extend(self.refresh_reference(&leaf, &target, &value));
        cmds.push(self.note_change(&leaf, &target, at));
        Cmd::batch(cmds)
    }

    fn on_action(&mut self, action: Action, at: u64) -> Cmd {
        if self.phase != Phase::Ready {
            // Mode toggling is still allowed while loading.
            if let Action::SetMode(mode) = action {
                return self.set_mode(mode);
            }
            return Cmd::none();
        }
        match action {
            Action::SetMode(mode) => self.set_mode(mode),
            Action::AddRow { field } => self.row_op(&field, at, |rep, schema, ids| {
                rep.add_row(schema, ids)
            }),
            Action::InsertRow {
                field,
                index,
                position,
            } => self.row_op(&field, at, move |rep, schema, ids| {
                rep.insert_row(schema, ids, index, position)
            }),
            Action::RequestRemoveRow { field, index } => {
                self.armed_remove.insert(field, index);
                Cmd::none()
            }
            Action::CancelRemoveRow { field } => {
                self.armed_remove.remove(&field);
                Cmd::none()
            }
            Action::ConfirmRemoveRow { field, index } => {
                self.armed_remove.remove(&field);
                self.row_op(&field, at, move |rep, _, _| rep.remove_row(index))
            }
            Action::MoveRow {
                field,
                index,
                direction,
            } => self.row_op(&field, at, move |rep, _, _| rep.move_row(index, direction)),
            Action::SetRowWidth {
                field,
                index,
                width,
            } => self.row_op(&field, at, move |rep, _, _| {
                rep.update_row_width(index, width)
            }),
            Action::ToggleCollapse { field, index } => {
                if let Some(rep) = self.repeaters.get_mut(&field) {
                    rep.toggle_collapse(index);
                }
                Cmd::none()
            }
            Action::GalleryMove {
                target,
                index,
                direction,
            } => self.gallery_op(&target, at, move |ids| {
                let swap_with = match direction {
                    Direction::Up => index.checked_sub(1),
                    Direction::Down => index.checked_add(1).filter(|t| *t < ids.len()),
                };
                match swap_with {
                    Some(other) if index < ids.len() => {
                        ids.swap(index, other);
                        true
                    }
                    _ => false,
                }
            }),
            Action::GalleryRemove { target, index } => self.gallery_op(&target, at, move |ids| {
                if index < ids.len() {
                    ids.remove(index);
                    true
                } else {
                    false
                }
            }),
            Action::OpenAssetPicker { target, multiple } => {
                let allowed = self
                    .leaf_schema(&target)
                    .map(|s| s.allowed_types.clone())
                    .unwrap_or_default();
                Cmd::effect(Effect::OpenAssetPicker {
                    target,
                    multiple,
                    allowed_types: allowed,
                })
            }
            Action::ClearAsset { target } => {
                self.lookups.forget(&search_key(&target));
                self.on_set_value(target, Value::text(""), at)
            }
            Action::SelectPost { target, id } => {
                if let Some(entry) = self.searches.get_mut(&target.key()) {
                    entry.query.clear();
                    entry.results.clear();
                    entry.searching = false;
                }
                self.on_set_value(target, Value::Number(id as f64), at)
            }
            Action::PostSearch { target, query } => self.on_post_search(target, query),
        }
    }

    fn on_post_search(&mut self, target: FieldTarget, query: String) -> Cmd {
        let kinds = self
            .leaf_schema(&target)
            .map(|s| s.post_kinds.clone())
            .unwrap_or_default();
        let entry = self.searches.entry(target.key()).or_default();
        entry.query = query.clone();
        if query.chars().count() < self.opts.config.search_min_chars {
            entry.results.clear();
            entry.searching = false;
            return Cmd::none();
        }
        entry.searching = true;
        let generation = self.lookups.begin(search_key(&target));
        Cmd::effect(Effect::SearchPosts {
            target,
            query,
            kinds,
            limit: self.opts.config.search_limit,
            generation,
        })
    }

    fn on_asset_picked(&mut self, target: FieldTarget, ids: Vec<u64>, at: u64) -> Cmd {
        let Some(leaf) = self.leaf_schema(&target).cloned() else {
            return Cmd::none();
        };
        let value = match leaf.field_type {
            FieldType::Gallery => {
                Value::List(ids.iter().map(|id| Value::Number(*id as f64)).collect())
            }
            _ => match ids.first() {
                Some(id) => Value::Number(*id as f64),
                None => return Cmd::none(),
            },
        };
        self.on_set_value(target, value, at)
    }

    fn on_tick(&mut self, now: u64) -> Cmd {
        self.autosave.tick(now);
        let mut cmds = Vec::new();
        if let Some(dirty) = self.autosave.take_flush(now) {
            let mut payload = ValueMap::new();
            for field in dirty {
                // Read at flush time. A field that disappeared (schema
                // reloaded, row removed) is skipped; the flush continues.
                match self.read_field(&field) {
                    Some(value) => {
                        payload.insert(field, value);
                    }
                    None => {
                        tracing::warn!(
                            target: "bform.session",
                            field = %field,
                            "field unreadable at flush; skipping"
                        );
                    }
                }
            }
            if payload.is_empty() {
                self.autosave.commit_done(now);
            } else {
                cmds.push(Cmd::effect(Effect::PersistAttributes {
                    payload,
                    flushed_at: now,
                }));
            }
        }
        cmds.push(self.wake_cmd(now));
        Cmd::batch(cmds)
    }

    // ── View ────────────────────────────────────────────────────────────

    #[must_use]
    pub fn view(&self) -> Node {
        match &self.phase {
            Phase::Loading => Node::Section {
                title: None,
                children: vec![Node::Status {
                    kind: StatusKind::Loading,
                    text: "Loading block...".to_owned(),
                }],
            },
            Phase::Failed(message) => Node::Section {
                title: None,
                children: vec![Node::Diagnostic(Diagnostic::SchemaUnavailable {
                    message: message.clone(),
                })],
            },
            Phase::Ready => {
                let mut children = vec![self.toolbar()];
                if let Some(status) = self.status_line() {
                    children.push(status);
                }
                children.push(match self.mode {
                    ViewMode::Edit => render_form(
                        &self.fields,
                        &self.store,
                        self.opts.context,
                        &self.widgets,
                        self,
                    ),
                    ViewMode::Preview => self.preview_view(),
                });
                Node::Section {
                    title: None,
                    children,
                }
            }
        }
    }

    fn toolbar(&self) -> Node {
        Node::group(vec![
            Node::Button {
                label: "Edit".to_owned(),
                action: Action::SetMode(ViewMode::Edit),
                enabled: self.mode != ViewMode::Edit,
                destructive: false,
            },
            Node::Button {
                label: "Preview".to_owned(),
                action: Action::SetMode(ViewMode::Preview),
                enabled: self.mode != ViewMode::Preview,
                destructive: false,
            },
        ])
    }

    fn status_line(&self) -> Option<Node> {
        match self.autosave.indicator() {
            Indicator::Idle => None,
            Indicator::Pending => Some(Node::Status {
                kind: StatusKind::SavePending,
                text: "Saving...".to_owned(),
            }),
            Indicator::Saved { .. } => Some(Node::Status {
                kind: StatusKind::Saved,
                text: "Saved".to_owned(),
            }),
        }
    }

    fn preview_view(&self) -> Node {
        match &self.preview {
            PreviewState::Idle | PreviewState::Loading => Node::Status {
                kind: StatusKind::Loading,
                text: "Rendering preview...".to_owned(),
            },
            PreviewState::Ready(markup) => Node::Preview {
                markup: markup.clone(),
            },
            PreviewState::EmptyOutput => Node::Empty {
                message: "No preview available".to_owned(),
            },
            PreviewState::Failed(message) => Node::Diagnostic(Diagnostic::PreviewFailed {
                message: message.clone(),
            }),
            PreviewState::DepthCapped => Node::Diagnostic(Diagnostic::EmbedDepthExceeded {
                block_type: self.opts.block_type.clone(),
                depth: self.opts.embed_depth,
            }),
        }
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn set_mode(&mut self, mode: ViewMode) -> Cmd {
        if mode == self.mode {
            return Cmd::none();
        }
        self.mode = mode;
        let mut cmds = vec![Cmd::effect(Effect::PersistMode {
            key: crate::mode::mode_key(&self.opts.document, self.opts.position),
            mode,
        })];
        match mode {
            ViewMode::Preview => {
                cmds.extend(self.sync_mounts());
                if self.opts.embeds_documents
                    && self.opts.embed_depth >= self.opts.config.max_embed_depth
                {
                    self.preview = PreviewState::DepthCapped;
                } else {
                    self.preview = PreviewState::Loading;
                    self.preview_gen += 1;
                    cmds.push(Cmd::effect(Effect::RenderPreview {
                        block_type: self.opts.block_type.clone(),
                        values: self.store.values().clone(),
                        depth: self.opts.embed_depth,
                        generation: self.preview_gen,
                    }));
                }
            }
            ViewMode::Edit => {
                self.preview = PreviewState::Idle;
                cmds.extend(self.sync_mounts());
            }
        }
        Cmd::batch(cmds)
    }

    /// Run one repeater mutation; on success write rows back to the store
    /// and resync mounts.
    fn row_op(
        &mut self,
        field: &str,
        at: u64,
        op: impl FnOnce(&mut RepeaterState, &FieldSchema, &mut RowIdGen) -> bool,
    ) -> Cmd {
        // Any row operation disarms a pending delete confirmation.
        self.armed_remove.remove(field);
        let Some(schema) = self.fields.iter().find(|f| f.id == field).cloned() else {
            return Cmd::none();
        };
        let Some(rep) = self.repeaters.get_mut(field) else {
            return Cmd::none();
        };
        if !op(rep, &schema, &mut self.ids) {
            return Cmd::none();
        }
        let rows = rep.to_value();
        self.store.set_one(field.to_owned(), rows);

        let mut cmds = self.sync_mounts();
        cmds.push(self.note_change(&schema, &FieldTarget::field(field), at));
        Cmd::batch(cmds)
    }

    /// Run one gallery list mutation on the stored value.
    fn gallery_op(
        &mut self,
        target: &FieldTarget,
        at: u64,
        op: impl FnOnce(&mut Vec<u64>) -> bool,
    ) -> Cmd {
        let Some(leaf) = self.leaf_schema(target).cloned() else {
            return Cmd::none();
        };
        let current = self.read_target(target).unwrap_or_else(|| leaf.effective_default());
        let mut ids: Vec<u64> = current
            .as_list()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_number())
                    .filter(|n| *n >= 1.0)
                    .map(|n| n as u64)
                    .collect()
            })
            .unwrap_or_default();
        if !op(&mut ids) {
            return Cmd::none();
        }
        let value = Value::List(ids.iter().map(|id| Value::Number(*id as f64)).collect());
        self.on_set_value(target.clone(), value, at)
    }

    /// Arm the debounce for an auto-saving field; otherwise no-op.
    fn note_change(&mut self, leaf: &FieldSchema, target: &FieldTarget, at: u64) -> Cmd {
        let autosaves = leaf
            .autosave
            .unwrap_or_else(|| self.opts.context.autosaves_by_default());
        if !autosaves {
            return Cmd::none();
        }
        let delay = self.autosave.note_change(target.root(), at);
        Cmd::Tick(delay)
    }

    fn wake_cmd(&self, now: u64) -> Cmd {
        match self.autosave.next_wake(now) {
            Some(delay) => Cmd::Tick(delay),
            None => Cmd::none(),
        }
    }

    /// Issue a metadata lookup when a reference-holding field's value
    /// changes.
    fn refresh_reference(
        &mut self,
        leaf: &FieldSchema,
        target: &FieldTarget,
        value: &Value,
    ) -> Vec<Cmd> {
        match leaf.field_type {
            FieldType::Media | FieldType::File => match value.as_number().filter(|n| *n >= 1.0) {
                Some(id) => vec![self.media_lookup(leaf, target, id as u64)],
                None => Vec::new(),
            },
            FieldType::PostObject => match value.as_number().filter(|n| *n >= 1.0) {
                Some(id) => {
                    let id = id as u64;
                    let generation = self.lookups.begin(lookup_key(target, id));
                    self.posts
                        .insert((target.key(), id), PostView::Loading(id));
                    vec![Cmd::effect(Effect::LookupPost {
                        target: target.clone(),
                        id,
                        kinds: leaf.post_kinds.clone(),
                        generation,
                    })]
                }
                None => Vec::new(),
            },
            FieldType::Gallery => value
                .as_list()
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|v| v.as_number())
                        .filter(|n| *n >= 1.0)
                        .map(|n| self.media_lookup(leaf, target, n as u64))
                        .collect()
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    fn media_lookup(&mut self, leaf: &FieldSchema, target: &FieldTarget, id: u64) -> Cmd {
        if matches!(
            self.assets.get(&(target.key(), id)),
            Some(AssetView::Resolved(_))
        ) {
            return Cmd::none();
        }
        let generation = self.lookups.begin(lookup_key(target, id));
        self.assets
            .insert((target.key(), id), AssetView::Loading(id));
        let allowed = match leaf.field_type {
            FieldType::Media => vec!["image".to_owned()],
            _ => leaf.allowed_types.clone(),
        };
        Cmd::effect(Effect::LookupMedia {
            target: target.clone(),
            id,
            allowed_types: allowed,
            generation,
        })
    }

    /// Lookups for every referenced asset in the loaded value map.
    fn initial_lookup_effects(&mut self) -> Vec<Cmd> {
        let mut cmds = Vec::new();
        let fields = self.fields.clone();
        for schema in &fields {
            let target = FieldTarget::field(schema.id.clone());
            let value = self.store.value_or_default(schema);
            cmds.extend(self.refresh_reference(schema, &target, &value));
            if schema.field_type == FieldType::Repeater {
                let rows = value.as_rows().map(|r| r.to_vec()).unwrap_or_default();
                for (index, row) in rows.iter().enumerate() {
                    for sub in &schema.fields {
                        if let Some(v) = row.get(&sub.id) {
                            let sub_target =
                                FieldTarget::row_field(schema.id.clone(), index, sub.id.clone());
                            cmds.extend(self.refresh_reference(sub, &sub_target, v));
                        }
                    }
                }
            }
        }
        cmds
    }

    /// Diff desired embedded-editor mounts against live ones; returns the
    /// mount/destroy effects. Each mount id is constructed at most once
    /// and destroyed at most once.
    fn sync_mounts(&mut self) -> Vec<Cmd> {
        let desired = self.desired_mounts();
        let mut cmds = Vec::new();
        let live: Vec<MountId> = self.mounts.iter().cloned().collect();
        for mount in live {
            if !desired.contains_key(&mount) {
                self.mounts.remove(&mount);
                cmds.push(Cmd::effect(Effect::DestroyEditor { mount }));
            }
        }
        let mut ordered: Vec<(&MountId, &String)> = desired.iter().collect();
        ordered.sort_by(|a, b| a.0.0.cmp(&b.0.0));
        for (mount, content) in ordered {
            if !self.mounts.contains(mount) {
                self.mounts.insert(mount.clone());
                cmds.push(Cmd::effect(Effect::MountEditor {
                    mount: mount.clone(),
                    content: content.clone(),
                }));
            }
        }
        cmds
    }

    /// Every formatted-text slot visible in the current mode, with its
    /// current content. Keys row sub-fields by stable row id so reorders
    /// keep mounts alive.
    fn desired_mounts(&self) -> AHashMap<MountId, String> {
        let mut desired = AHashMap::new();
        if self.phase != Phase::Ready || self.mode != ViewMode::Edit {
            return desired;
        }
        for schema in &self.fields {
            match schema.field_type {
                FieldType::RichText => {
                    let value = self.store.value_or_default(schema);
                    desired.insert(
                        MountId(schema.id.clone()),
                        value.as_text().unwrap_or_default().to_owned(),
                    );
                }
                FieldType::Repeater => {
                    if let Some(rep) = self.repeaters.get(&schema.id) {
                        for row in rep.rows() {
                            for sub in &schema.fields {
                                if sub.field_type == FieldType::RichText {
                                    let content = row
                                        .get(&sub.id)
                                        .and_then(Value::as_text)
                                        .unwrap_or_default()
                                        .to_owned();
                                    desired.insert(
                                        MountId(format!("{}.{}.{}", schema.id, row.id, sub.id)),
                                        content,
                                    );
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        desired
    }

    /// Current value of one root field, read at flush time.
    fn read_field(&self, field: &str) -> Option<Value> {
        let schema = self.fields.iter().find(|f| f.id == field)?;
        Some(self.store.value_or_default(schema))
    }

    fn read_target(&self, target: &FieldTarget) -> Option<Value> {
        match target {
            FieldTarget::Field { field } => self.read_field(field),
            FieldTarget::RowField {
                field,
                row,
                sub_field,
            } => self
                .repeaters
                .get(field)?
                .rows()
                .get(*row)?
                .get(sub_field)
                .cloned(),
        }
    }

    /// The schema governing a target's leaf slot.
    fn leaf_schema(&self, target: &FieldTarget) -> Option<&FieldSchema> {
        match target {
            FieldTarget::Field { field } => self.fields.iter().find(|f| f.id == *field),
            FieldTarget::RowField {
                field, sub_field, ..
            } => self
                .fields
                .iter()
                .find(|f| f.id == *field)?
                .fields
                .iter()
                .find(|f| f.id == *sub_field),
        }
    }
}

impl ViewLookup for BlockSession {
    fn asset_view(&self, target: &FieldTarget, id: u64) -> AssetView {
        self.assets
            .get(&(target.key(), id))
            .cloned()
            .unwrap_or(AssetView::Unresolved(id))
    }

    fn post_view(&self, target: &FieldTarget, id: u64) -> PostView {
        self.posts
            .get(&(target.key(), id))
            .cloned()
            .unwrap_or(PostView::Unresolved(id))
    }

    fn post_search(&self, target: &FieldTarget) -> PostSearchView {
        self.searches
            .get(&target.key())
            .cloned()
            .unwrap_or_default()
    }

    fn collapsed(&self, field: &str, index: usize) -> bool {
        self.repeaters
            .get(field)
            .is_some_and(|rep| rep.is_collapsed(index))
    }

    fn remove_armed(&self, field: &str) -> Option<usize> {
        self.armed_remove.get(field).copied()
    }

    fn mount_id(&self, target: &FieldTarget) -> MountId {
        match target {
            FieldTarget::Field { field } => MountId(field.clone()),
            FieldTarget::RowField {
                field,
                row,
                sub_field,
            } => {
                let row_id = self
                    .repeaters
                    .get(field)
                    .and_then(|rep| rep.rows().get(*row))
                    .map(|r| r.id.clone())
                    .unwrap_or_else(|| row.to_string());
                MountId(format!("{field}.{row_id}.{sub_field}"))
            }
        }
    }
}

/// Composite generation key for one (slot, id) lookup.
fn lookup_key(target: &FieldTarget, id: u64) -> String {
    format!("{}#{id}", target.key())
}

fn search_key(target: &FieldTarget) -> String {
    format!("search:{}", target.key())
}
