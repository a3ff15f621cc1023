//! Repeater row engine.
//!
//! One [`RepeaterState`] manages the ordered rows of one repeater field:
//! add/insert/remove/reorder with min/max enforcement, per-row value
//! merges, per-row width, and the client-local collapse set. Row order is
//! the authoritative order; row ids never change once assigned.
//!
//! Every mutator returns `bool`: `false` means the operation was rejected
//! (bounds, invalid index) and state is unchanged. Bounds violations are
//! silent no-ops: they never panic and never propagate an error past the
//! caller.

use std::collections::BTreeSet;

use bform_schema::row::{RowIdGen, ensure_row_ids};
use bform_schema::{Direction, FieldSchema, FieldWidth, InsertPosition, Row, Value};

/// State machine for one repeater instance.
#[derive(Debug, Clone)]
pub struct RepeaterState {
    rows: Vec<Row>,
    min: usize,
    max: Option<usize>,
    /// Collapse flags keyed by row position. UI-only: never persisted,
    /// never affects values.
    collapsed: BTreeSet<usize>,
}

impl RepeaterState {
    /// Decode a repeater's stored value.
    ///
    /// Returns the state plus `true` when legacy rows were assigned ids
    /// and the caller must re-save. Non-row values (malformed storage)
    /// decode as an empty row set.
    pub fn load(schema: &FieldSchema, value: Value, ids: &mut RowIdGen) -> (Self, bool) {
        let mut rows = value.into_rows().unwrap_or_default();
        let changed = ensure_row_ids(&mut rows, ids);
        (
            Self {
                rows,
                min: schema.min_rows(),
                max: schema.max_rows(),
                collapsed: BTreeSet::new(),
            },
            changed,
        )
    }

    /// Current rows, in authoritative order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// The count caption: `"current / max"` when max is finite, bare
    /// `"current"` otherwise.
    #[must_use]
    pub fn count_caption(&self) -> String {
        match self.max {
            Some(max) => format!("{} / {}", self.rows.len(), max),
            None => self.rows.len().to_string(),
        }
    }

    /// Whether the row count has fallen below the configured minimum
    /// (possible when legacy data loaded short).
    #[must_use]
    pub fn below_min(&self) -> bool {
        self.rows.len() < self.min
    }

    /// Append a fresh row seeded with each sub-field's default.
    pub fn add_row(&mut self, schema: &FieldSchema, ids: &mut RowIdGen) -> bool {
        let index = self.rows.len();
        self.insert_at(schema, ids, index)
    }

    /// Insert a fresh row adjacent to `index`.
    pub fn insert_row(
        &mut self,
        schema: &FieldSchema,
        ids: &mut RowIdGen,
        index: usize,
        position: InsertPosition,
    ) -> bool {
        if index >= self.rows.len() {
            return false;
        }
        let at = match position {
            InsertPosition::Before => index,
            InsertPosition::After => index + 1,
        };
        self.insert_at(schema, ids, at)
    }

    fn insert_at(&mut self, schema: &FieldSchema, ids: &mut RowIdGen, at: usize) -> bool {
        if let Some(max) = self.max {
            if self.rows.len() >= max {
                tracing::debug!(
                    target: "bform.repeater",
                    field = %schema.id,
                    max,
                    "add rejected at row cap"
                );
                return false;
            }
        }
        let mut row = Row::new(ids.next_id());
        for sub in &schema.fields {
            row.set(sub.id.clone(), sub.effective_default());
        }
        self.rows.insert(at, row);
        // Positions shifted; collapse flags are positional and reset.
        self.collapsed.clear();
        true
    }

    /// Delete the row at `index`. No-op at or below the minimum count.
    pub fn remove_row(&mut self, index: usize) -> bool {
        if index >= self.rows.len() || self.rows.len() <= self.min {
            return false;
        }
        self.rows.remove(index);
        self.collapsed.clear();
        true
    }

    /// Swap the row at `index` with its neighbor. No-op at the boundary.
    /// Ids and values travel with the row.
    pub fn move_row(&mut self, index: usize, direction: Direction) -> bool {
        let target = match direction {
            Direction::Up => index.checked_sub(1),
            Direction::Down => index.checked_add(1).filter(|t| *t < self.rows.len()),
        };
        let Some(target) = target else {
            return false;
        };
        if index >= self.rows.len() {
            return false;
        }
        self.rows.swap(index, target);
        true
    }

    /// Merge one sub-field value into row `index`. Other rows and other
    /// keys are untouched.
    pub fn update_row_field(&mut self, index: usize, sub_field: &str, value: Value) -> bool {
        let Some(row) = self.rows.get_mut(index) else {
            return false;
        };
        row.set(sub_field.to_owned(), value);
        true
    }

    /// Set row `index`'s display width.
    pub fn update_row_width(&mut self, index: usize, width: FieldWidth) -> bool {
        let Some(row) = self.rows.get_mut(index) else {
            return false;
        };
        row.width = width;
        true
    }

    /// Flip the collapse flag for the row position.
    pub fn toggle_collapse(&mut self, index: usize) {
        if !self.collapsed.remove(&index) {
            self.collapsed.insert(index);
        }
    }

    #[must_use]
    pub fn is_collapsed(&self, index: usize) -> bool {
        self.collapsed.contains(&index)
    }

    /// The rows as a storable value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Rows(self.rows.clone())
    }
}
