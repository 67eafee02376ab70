//! Edit scripts between two versions of a list.
//!
//! [`diff`] compares an old and a new sequence of [`Listable`] items and
//! produces an [`EditScript`]: the operations that turn the old display state
//! into the new one without touching unaffected rows.
//!
//! - Rows are matched by [`Listable::identifier`].
//! - A matched row is marked changed when the two values are not `==`.
//!
//! The script is ordered so that it can be replayed front to back:
//!
//! 1. `Remove` ranges for rows missing from the new list, from the back.
//! 2. `Move`s for surviving rows whose relative order changed. Rows on a
//!    longest increasing run of new positions stay put; every other surviving
//!    row moves exactly once.
//! 3. `Insert` ranges for rows new to the list, in ascending final position.
//! 4. `Change` ranges, in final positions.
//!
//! ```
//! use quicklist::{diff, EditOp, Listable, ListableId};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Row(u64, &'static str);
//!
//! impl Listable for Row {
//!     fn identifier(&self) -> ListableId {
//!         self.0.into()
//!     }
//! }
//!
//! let old = vec![Row(1, "a"), Row(2, "b"), Row(3, "c")];
//! let new = vec![Row(3, "c"), Row(1, "a"), Row(4, "d")];
//!
//! let script = diff(&old, &new).unwrap();
//! assert_eq!(
//!     script.ops(),
//!     &[
//!         EditOp::Remove { position: 1, count: 1 },
//!         EditOp::Move { from: 0, to: 1 },
//!         EditOp::Insert { position: 2, count: 1 },
//!     ]
//! );
//!
//! let mut replay = old.clone();
//! script.apply(&mut replay, &new);
//! assert_eq!(replay, new);
//! ```

use std::collections::{HashMap, HashSet};

use quicklist_core::PerfSpan;
use quicklist_core::logging::targets;

use crate::error::{Error, Result};
use crate::listable::{Listable, ListableId};

/// One step of an edit script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditOp {
    /// `count` rows starting at `position` were removed.
    Remove { position: usize, count: usize },
    /// The row at `from` was taken out and reinserted at `to`.
    ///
    /// `to` is an index into the list after the row has been taken out.
    Move { from: usize, to: usize },
    /// `count` rows were inserted starting at `position`.
    Insert { position: usize, count: usize },
    /// `count` rows starting at `position` have new content.
    Change { position: usize, count: usize },
}

/// An ordered list of [`EditOp`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditScript {
    ops: Vec<EditOp>,
}

impl EditScript {
    /// Creates a script from raw operations.
    pub fn from_ops(ops: Vec<EditOp>) -> Self {
        Self { ops }
    }

    /// The operations in replay order.
    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns `true` when the two compared lists were identical.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterates over the operations.
    pub fn iter(&self) -> std::slice::Iter<'_, EditOp> {
        self.ops.iter()
    }

    /// Replays the script on `target`, taking inserted and changed values
    /// from `source`, the new list the script was computed against.
    ///
    /// # Panics
    ///
    /// Panics if the script does not describe a transformation of `target`
    /// into `source`.
    pub fn apply<T: Clone>(&self, target: &mut Vec<T>, source: &[T]) {
        for op in &self.ops {
            match *op {
                EditOp::Remove { position, count } => {
                    target.drain(position..position + count);
                }
                EditOp::Move { from, to } => {
                    let item = target.remove(from);
                    target.insert(to, item);
                }
                EditOp::Insert { position, count } => {
                    target.splice(
                        position..position,
                        source[position..position + count].iter().cloned(),
                    );
                }
                EditOp::Change { position, count } => {
                    target[position..position + count]
                        .clone_from_slice(&source[position..position + count]);
                }
            }
        }
    }
}

impl<'a> IntoIterator for &'a EditScript {
    type Item = &'a EditOp;
    type IntoIter = std::slice::Iter<'a, EditOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

/// Computes the edit script turning `old` into `new`.
///
/// # Errors
///
/// Returns [`Error::DuplicateIdentifier`] if either list contains two items
/// with the same identifier.
pub fn diff<T: Listable>(old: &[T], new: &[T]) -> Result<EditScript> {
    let _span = PerfSpan::new("diff");

    let old_ids: Vec<ListableId> = old.iter().map(Listable::identifier).collect();
    let new_ids: Vec<ListableId> = new.iter().map(Listable::identifier).collect();
    let old_positions = position_map(&old_ids)?;
    let new_positions = position_map(&new_ids)?;

    let mut ops = Vec::new();

    // Removals, back to front so earlier positions stay valid.
    let mut end = old_ids.len();
    while end > 0 {
        if new_positions.contains_key(&old_ids[end - 1]) {
            end -= 1;
            continue;
        }
        let mut start = end - 1;
        while start > 0 && !new_positions.contains_key(&old_ids[start - 1]) {
            start -= 1;
        }
        ops.push(EditOp::Remove {
            position: start,
            count: end - start,
        });
        end = start;
    }

    // Surviving rows in old order, and the order they must end up in.
    let mut working: Vec<&ListableId> = old_ids
        .iter()
        .filter(|id| new_positions.contains_key(id))
        .collect();
    let target: Vec<&ListableId> = new_ids
        .iter()
        .filter(|id| old_positions.contains_key(id))
        .collect();
    push_moves(&mut working, &target, &mut ops);

    // Insertions at their final positions.
    let mut index = 0;
    while index < new_ids.len() {
        if old_positions.contains_key(&new_ids[index]) {
            index += 1;
            continue;
        }
        let start = index;
        while index < new_ids.len() && !old_positions.contains_key(&new_ids[index]) {
            index += 1;
        }
        ops.push(EditOp::Insert {
            position: start,
            count: index - start,
        });
    }

    // Content changes of matched rows.
    let mut index = 0;
    while index < new.len() {
        if !is_changed(old, &old_positions, &new_ids[index], &new[index]) {
            index += 1;
            continue;
        }
        let start = index;
        while index < new.len() && is_changed(old, &old_positions, &new_ids[index], &new[index]) {
            index += 1;
        }
        ops.push(EditOp::Change {
            position: start,
            count: index - start,
        });
    }

    tracing::trace!(
        target: targets::DIFF,
        old_len = old.len(),
        new_len = new.len(),
        ops = ops.len(),
        "computed edit script"
    );
    Ok(EditScript { ops })
}

fn position_map(ids: &[ListableId]) -> Result<HashMap<&ListableId, usize>> {
    let mut positions = HashMap::with_capacity(ids.len());
    for (position, id) in ids.iter().enumerate() {
        if positions.insert(id, position).is_some() {
            return Err(Error::duplicate(id.clone()));
        }
    }
    Ok(positions)
}

fn is_changed<T: Listable>(
    old: &[T],
    old_positions: &HashMap<&ListableId, usize>,
    id: &ListableId,
    item: &T,
) -> bool {
    old_positions
        .get(id)
        .is_some_and(|&position| old[position] != *item)
}

/// Reorders `working` into `target` (same rows, different order), recording
/// one move per row that is not part of the longest already-ordered run.
fn push_moves<'a>(
    working: &mut Vec<&'a ListableId>,
    target: &[&'a ListableId],
    ops: &mut Vec<EditOp>,
) {
    let target_rank: HashMap<&'a ListableId, usize> = target
        .iter()
        .enumerate()
        .map(|(rank, id)| (*id, rank))
        .collect();
    let ranks: Vec<usize> = working.iter().map(|id| target_rank[*id]).collect();
    let stable: HashSet<&'a ListableId> = longest_increasing_run(&ranks)
        .into_iter()
        .map(|index| working[index])
        .collect();

    // Rows are placed in target order, each right after its predecessor, so
    // the placed rows plus the stable ones are always in target order.
    for (rank, id) in target.iter().enumerate() {
        if stable.contains(id) {
            continue;
        }
        let Some(from) = working.iter().position(|row| row == id) else {
            continue;
        };
        let to = match rank.checked_sub(1) {
            None => 0,
            Some(previous) => match working.iter().position(|row| *row == target[previous]) {
                Some(anchor) if from < anchor => anchor,
                Some(anchor) => anchor + 1,
                None => continue,
            },
        };
        if from == to {
            continue;
        }
        let row = working.remove(from);
        working.insert(to, row);
        ops.push(EditOp::Move { from, to });
    }
}

/// Indices of one longest strictly increasing subsequence of `values`.
fn longest_increasing_run(values: &[usize]) -> Vec<usize> {
    // tails[k] is the index of the smallest value ending a run of length k + 1.
    let mut tails: Vec<usize> = Vec::new();
    let mut previous: Vec<Option<usize>> = vec![None; values.len()];

    for (index, &value) in values.iter().enumerate() {
        let length = tails.partition_point(|&tail| values[tail] < value);
        if length > 0 {
            previous[index] = Some(tails[length - 1]);
        }
        if length == tails.len() {
            tails.push(index);
        } else {
            tails[length] = index;
        }
    }

    let mut run = Vec::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(index) = cursor {
        run.push(index);
        cursor = previous[index];
    }
    run.reverse();
    run
}
