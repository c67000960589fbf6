//! Project store
//!
//! Owns the rule list, the selection and the history. Every structural
//! edit goes through the store so the selection is renumbered and the
//! history stays consistent with the live list.
//!
//! Commands that act on the selection push a history snapshot before they
//! change anything; lookups and selection changes do not.

use log::{info, warn};

use crate::config::ExportSettings;
use crate::engine::Segment;
use crate::error::Result;
use crate::numeric::round_to_i64;
use crate::rules::{format_samples, parse_samples, skipjack, Color, Render, Rule};
use crate::state::history::History;
use crate::state::selection::Selection;

/// Rules, selection, history and clipboard of one editing session.
#[derive(Debug, Clone, Default)]
pub struct ProjectStore {
    rules: Vec<Rule>,
    selection: Selection,
    history: History,
    clipboard: Vec<Rule>,
}

impl ProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session from an existing rule list.
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            ..Default::default()
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rule(&self, index: usize) -> Option<&Rule> {
        self.rules.get(index)
    }

    /// Mutable access to one rule's fields. Structural edits must use the
    /// store's insert/remove methods instead.
    pub fn rule_mut(&mut self, index: usize) -> Option<&mut Rule> {
        self.rules.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn clipboard(&self) -> &[Rule] {
        &self.clipboard
    }

    /// Consume the store, returning its rules.
    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }

    // ========================================================================
    // Structural edits
    // ========================================================================

    /// Insert a copy of `rule` at `pos` (appended when `None` or past the end).
    pub fn add_rule(&mut self, rule: Rule, pos: Option<usize>) -> usize {
        let pos = pos.map_or(self.rules.len(), |p| p.min(self.rules.len()));
        self.rules.insert(pos, rule);
        self.selection.rule_added(pos);
        pos
    }

    /// Insert `rules` in order starting at `pos`.
    pub fn add_rules(&mut self, rules: Vec<Rule>, pos: Option<usize>) {
        let mut pos = pos.map_or(self.rules.len(), |p| p.min(self.rules.len()));
        for rule in rules {
            self.add_rule(rule, Some(pos));
            pos += 1;
        }
    }

    /// Remove the rule at `pos`.
    pub fn del_rule(&mut self, pos: usize) -> Option<Rule> {
        if pos >= self.rules.len() {
            warn!(
                "Cannot delete rule {}; only {} rules exist",
                pos,
                self.rules.len()
            );
            return None;
        }
        let removed = self.rules.remove(pos);
        self.selection.rule_removed(pos);
        Some(removed)
    }

    /// Remove every rule in `indices` (ascending, as produced by a
    /// selection). Returns the removed rules in list order.
    pub fn del_rules(&mut self, indices: &[usize]) -> Vec<Rule> {
        let mut removed = Vec::with_capacity(indices.len());
        for (offset, &index) in indices.iter().enumerate() {
            let Some(pos) = index.checked_sub(offset) else {
                warn!("del_rules() was given unsorted indices {:?}", indices);
                break;
            };
            if let Some(rule) = self.del_rule(pos) {
                removed.push(rule);
            }
        }
        removed
    }

    pub fn del_all_rules(&mut self) {
        self.rules.clear();
        self.selection.clear();
    }

    /// Replace the whole list. The selection is cleared.
    pub fn replace_rules(&mut self, rules: Vec<Rule>) {
        self.del_all_rules();
        self.rules = rules;
    }

    /// Lay rules end to end from sample 0.
    ///
    /// Lengths are clamped to be non-negative, `end` becomes the last
    /// sample of each rule, and auto-labelled rules are named `#index`.
    pub fn bake_positions(&mut self) {
        bake_positions(&mut self.rules);
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Index of the rule covering sample `pos`.
    pub fn rule_index_at(&self, pos: i64) -> Option<usize> {
        self.rules
            .iter()
            .position(|rule| pos >= rule.start && pos <= rule.end)
    }

    pub fn rule_at(&self, pos: i64) -> Option<&Rule> {
        self.rule_index_at(pos).map(|i| &self.rules[i])
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Snapshot the current rule list.
    pub fn push_history(&mut self) {
        self.history.push(&self.rules);
    }

    /// Restore the previous snapshot. Returns `false` at the bottom.
    pub fn undo(&mut self) -> bool {
        if self.history.undo(&mut self.rules) {
            self.selection.clear();
            info!("Undo ({} of {})", self.history.cursor(), self.history.depth());
            true
        } else {
            false
        }
    }

    /// Re-apply the next snapshot. Returns `false` at the top.
    pub fn redo(&mut self) -> bool {
        if self.history.redo(&mut self.rules) {
            self.selection.clear();
            info!("Redo ({} of {})", self.history.cursor(), self.history.depth());
            true
        } else {
            false
        }
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Select rule `index`, returning its position within the selection.
    pub fn select(&mut self, index: usize) -> Option<usize> {
        if index >= self.rules.len() {
            warn!("Cannot select rule {}; only {} rules exist", index, self.rules.len());
            return None;
        }
        self.selection.select(index)
    }

    /// Select the inclusive span between `a` and `b`, in either order,
    /// clamped to existing rules.
    ///
    /// Returns `false` when the span lies entirely outside the list.
    pub fn select_range(&mut self, a: i64, b: i64) -> bool {
        let (start, end) = if a > b { (b, a) } else { (a, b) };
        let count = self.rules.len() as i64;
        if start >= count || end < 0 {
            warn!(
                "select_range() was passed an invalid range ([{},{}] of [0,{}])",
                start,
                end,
                count - 1
            );
            return false;
        }
        let start = start.max(0) as usize;
        let end = end.min(count - 1) as usize;
        self.selection.select_span(start, end);
        true
    }

    pub fn deselect(&mut self, index: usize) -> bool {
        self.selection.deselect(index)
    }

    /// Toggle rule `index`, returning whether it is now selected.
    pub fn flip(&mut self, index: usize) -> bool {
        if self.selection.is_selected(index) {
            self.selection.deselect(index);
            false
        } else {
            self.select(index).is_some()
        }
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(self.rules.len());
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selection.is_selected(index)
    }

    /// Grow the selection so it reaches rule `to` from both of its ends.
    ///
    /// With nothing selected only `to` is selected.
    pub fn extend_selection(&mut self, to: usize) -> bool {
        if to >= self.rules.len() {
            warn!(
                "extend_selection() passed out-of-bounds index ({} of [0,{}))",
                to,
                self.rules.len()
            );
            return false;
        }
        match (self.selection.first(), self.selection.last()) {
            (Some(first), Some(last)) => {
                self.selection.select_span(first.min(to), first.max(to));
                self.selection.select_span(last.min(to), last.max(to));
            }
            _ => {
                self.selection.select(to);
            }
        }
        true
    }

    pub fn is_continuous(&self) -> bool {
        self.selection.is_continuous()
    }

    pub fn selected_rules(&self) -> Vec<&Rule> {
        self.selection
            .indices()
            .iter()
            .filter_map(|&i| self.rules.get(i))
            .collect()
    }

    fn first_selected(&self) -> Option<&Rule> {
        self.selection.first().and_then(|i| self.rules.get(i))
    }

    /// First sample of the first selected rule.
    pub fn selection_start(&self) -> Option<i64> {
        self.first_selected().map(|rule| rule.start)
    }

    /// Last sample of the last selected rule.
    pub fn selection_end(&self) -> Option<i64> {
        self.selection
            .last()
            .and_then(|i| self.rules.get(i))
            .map(|rule| rule.end)
    }

    /// Samples spanned from the selection's start to its end.
    pub fn selection_length(&self) -> Option<i64> {
        Some(
            self.selection_end()?
                .saturating_sub(self.selection_start()?)
                .saturating_add(1),
        )
    }

    /// Multiply every selected rule's length by `|factor|` and re-bake.
    ///
    /// Only a continuous, non-empty selection can be scaled. Returns the
    /// change in the selection's length (negative when it shrank).
    pub fn scale_selection(&mut self, factor: f64) -> Option<i64> {
        if self.selection.is_empty() || !self.selection.is_continuous() {
            return None;
        }
        let before = self.selection_length()?;
        for &index in self.selection.indices() {
            if let Some(rule) = self.rules.get_mut(index) {
                rule.length = round_to_i64(rule.length as f64 * factor.abs());
            }
        }
        self.bake_positions();
        Some(self.selection_length()?.saturating_sub(before))
    }

    /// Render only the selected rules, in list order.
    pub fn skipjack_selected(&self, source: &Segment, settings: &ExportSettings) -> Result<Render> {
        skipjack(source, self.selected_rules(), settings)
    }

    // ========================================================================
    // Editing commands
    // ========================================================================

    /// Insert `count` new rules after the last selected rule (or at the
    /// end) and re-bake.
    pub fn create_rules(
        &mut self,
        samples: &str,
        pattern: &str,
        length: i64,
        factor: f64,
        volume: f64,
        count: usize,
    ) -> usize {
        self.push_history();
        let pos = self.insert_point();
        let template = Rule::with_sample_text(0, length, volume, factor, samples, pattern);
        self.add_rules(vec![template; count], Some(pos));
        self.bake_positions();
        info!("Created {} rules at {}", count, pos);
        count
    }

    /// Insert copies of the selected rules after the last selected one.
    pub fn duplicate_selected(&mut self) -> bool {
        if self.selection.is_empty() {
            warn!("Cannot duplicate selection; nothing selected");
            return false;
        }
        self.push_history();
        let copies = self.selected_rules().into_iter().cloned().collect();
        let pos = self.insert_point();
        self.add_rules(copies, Some(pos));
        self.bake_positions();
        true
    }

    pub fn delete_selected(&mut self) -> bool {
        if self.selection.is_empty() {
            warn!("Cannot delete selection; nothing selected");
            return false;
        }
        self.push_history();
        self.remove_selected();
        true
    }

    /// Copy the selected rules to the clipboard. Not undoable.
    pub fn copy_selected(&mut self) -> bool {
        if self.selection.is_empty() {
            warn!("Cannot copy selection; nothing selected");
            return false;
        }
        self.clipboard = self.selected_rules().into_iter().cloned().collect();
        true
    }

    pub fn cut_selected(&mut self) -> bool {
        if !self.copy_selected() {
            return false;
        }
        self.push_history();
        self.remove_selected();
        true
    }

    /// Insert the clipboard after the last selected rule (or at the end).
    pub fn paste(&mut self) -> bool {
        if self.clipboard.is_empty() {
            warn!("Clipboard is empty");
            return false;
        }
        self.push_history();
        let pos = self.insert_point();
        self.add_rules(self.clipboard.clone(), Some(pos));
        self.bake_positions();
        true
    }

    /// Split rule `index` into two halves with the same settings.
    pub fn split_rule(&mut self, index: usize) -> bool {
        if index >= self.rules.len() {
            warn!(
                "split_rule() attempted to split rule {} of {}",
                index,
                self.rules.len()
            );
            return false;
        }
        self.push_history();
        self.split_at(index);
        self.bake_positions();
        true
    }

    /// Split every selected rule in half.
    pub fn split_selected(&mut self) -> bool {
        if self.selection.is_empty() {
            warn!("Nothing is selected; could not split rules");
            return false;
        }
        self.push_history();
        let indices = self.selection.indices().to_vec();
        for &index in indices.iter().rev() {
            self.split_at(index);
        }
        self.bake_positions();
        true
    }

    /// Merge a continuous selection of at least two rules into the first.
    ///
    /// The first rule keeps its settings and takes the combined length.
    pub fn join_selected(&mut self) -> bool {
        if self.selection.len() < 2 {
            warn!("Not enough rules are selected; could not join");
            return false;
        }
        if !self.selection.is_continuous() {
            warn!("Selection is not continuous; could not join");
            return false;
        }
        self.push_history();

        let indices = self.selection.indices().to_vec();
        let first = indices[0];
        let (factor, pattern) = (self.rules[first].factor, self.rules[first].pattern.clone());
        let mut extra = 0;
        let mut homogenous = true;
        for &index in indices[1..].iter().rev() {
            if let Some(rule) = self.del_rule(index) {
                homogenous &= rule.factor == factor && rule.pattern == pattern;
                extra = rule.length.saturating_add(extra);
            }
        }
        self.rules[first].length = self.rules[first].length.saturating_add(extra);
        self.bake_positions();

        if !homogenous {
            warn!("Joined rules had different factors or patterns; only the first rule's are kept");
        }
        true
    }

    // ========================================================================
    // Selection properties
    // ========================================================================

    /// Apply `edit` to every selected rule after pushing history.
    fn edit_selected<F>(&mut self, rebake: bool, mut edit: F) -> bool
    where
        F: FnMut(usize, &mut Rule),
    {
        if self.selection.is_empty() {
            warn!("Nothing selected");
            return false;
        }
        self.push_history();
        for (n, &index) in self.selection.indices().iter().enumerate() {
            if let Some(rule) = self.rules.get_mut(index) {
                edit(n, rule);
            }
        }
        if rebake {
            self.bake_positions();
        }
        true
    }

    pub fn set_samples(&mut self, text: &str) -> bool {
        let samples = parse_samples(text);
        self.edit_selected(false, |_, rule| rule.samples = samples.clone())
    }

    pub fn set_pattern(&mut self, pattern: &str) -> bool {
        self.edit_selected(false, |_, rule| rule.pattern = pattern.to_string())
    }

    /// Give the first selected rule a fixed label. Any other selected rule,
    /// or every rule when `label` is empty, goes back to auto-labelling.
    pub fn set_label(&mut self, label: &str) -> bool {
        self.edit_selected(true, |n, rule| {
            if label.is_empty() || n > 0 {
                rule.auto_label = true;
            } else {
                rule.auto_label = false;
                rule.label = label.to_string();
            }
        })
    }

    pub fn set_color(&mut self, color: Color) -> bool {
        self.edit_selected(false, |_, rule| rule.color = color)
    }

    /// Set each selected rule's length from seconds at `sample_rate`.
    pub fn set_length_secs(&mut self, secs: f64, sample_rate: u32) -> bool {
        let length = round_to_i64(secs * f64::from(sample_rate));
        self.edit_selected(true, |_, rule| rule.length = length)
    }

    pub fn set_factor(&mut self, factor: f64) -> bool {
        self.edit_selected(false, |_, rule| rule.factor = factor)
    }

    pub fn set_volume(&mut self, volume: f64) -> bool {
        self.edit_selected(false, |_, rule| rule.volume = volume)
    }

    /// Listings of the first selected rule in mini-language form.
    pub fn samples_text(&self) -> Option<String> {
        self.first_selected().map(|rule| format_samples(&rule.samples))
    }

    pub fn pattern(&self) -> Option<&str> {
        self.first_selected().map(|rule| rule.pattern.as_str())
    }

    /// Fixed label of the first selected rule; empty when auto-labelled.
    pub fn label(&self) -> Option<&str> {
        self.first_selected()
            .map(|rule| if rule.auto_label { "" } else { rule.label.as_str() })
    }

    pub fn color(&self) -> Option<Color> {
        self.first_selected().map(|rule| rule.color)
    }

    pub fn length_secs(&self, sample_rate: u32) -> Option<f64> {
        self.first_selected().map(|rule| rule.length_secs(sample_rate))
    }

    pub fn factor(&self) -> Option<f64> {
        self.first_selected().map(|rule| rule.factor)
    }

    pub fn volume(&self) -> Option<f64> {
        self.first_selected().map(|rule| rule.volume)
    }

    fn selected_average<F>(&self, value: F) -> Option<f64>
    where
        F: Fn(&Rule) -> f64,
    {
        let selected = self.selected_rules();
        if selected.is_empty() {
            return None;
        }
        let total: f64 = selected.iter().map(|rule| value(rule)).sum();
        Some(total / selected.len() as f64)
    }

    pub fn average_length_secs(&self, sample_rate: u32) -> Option<f64> {
        self.selected_average(|rule| rule.length_secs(sample_rate))
    }

    pub fn average_factor(&self) -> Option<f64> {
        self.selected_average(|rule| rule.factor)
    }

    pub fn average_volume(&self) -> Option<f64> {
        self.selected_average(|rule| rule.volume)
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn insert_point(&self) -> usize {
        self.selection.last().map_or(self.rules.len(), |last| last + 1)
    }

    fn remove_selected(&mut self) {
        let indices = self.selection.indices().to_vec();
        self.del_rules(&indices);
        self.bake_positions();
    }

    /// Split without history or baking. The copy is inserted before the
    /// original, and both are selected if the original was.
    fn split_at(&mut self, index: usize) {
        let was_selected = self.selection.is_selected(index);
        let total = self.rules[index].length;
        let mut first_half = self.rules[index].clone();
        first_half.length = total / 2;
        self.rules[index].length = total - total / 2;
        self.add_rule(first_half, Some(index));
        if was_selected {
            self.selection.select(index);
        }
    }
}

/// Lay `rules` end to end from sample 0. See [`ProjectStore::bake_positions`].
pub fn bake_positions(rules: &mut [Rule]) {
    let mut pos = 0;
    for (index, rule) in rules.iter_mut().enumerate() {
        rule.length = rule.length.max(0);
        rule.start = pos;
        pos = rule.end_exclusive();
        rule.end = pos.saturating_sub(1);
        if rule.auto_label {
            rule.label = format!("#{}", index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store_with(lengths: &[i64]) -> ProjectStore {
        let rules = lengths
            .iter()
            .map(|&len| Rule::with_sample_text(0, len, 1.0, 1.0, "F,2;G,2", "FG"))
            .collect();
        let mut store = ProjectStore::with_rules(rules);
        store.bake_positions();
        store
    }

    fn lengths(store: &ProjectStore) -> Vec<i64> {
        store.rules().iter().map(|r| r.length).collect()
    }

    fn assert_contiguous(rules: &[Rule]) {
        if let Some(first) = rules.first() {
            assert_eq!(first.start, 0);
        }
        for pair in rules.windows(2) {
            assert_eq!(pair[0].end, pair[1].start - 1);
        }
    }

    #[test]
    fn test_bake_positions() {
        let mut store = store_with(&[10, 0, 25, 5]);
        store.rule_mut(1).unwrap().length = -4;
        store.rule_mut(2).unwrap().auto_label = false;
        store.rule_mut(2).unwrap().label = "verse".to_string();
        store.bake_positions();

        assert_contiguous(store.rules());
        let starts: Vec<i64> = store.rules().iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![0, 10, 10, 35]);
        let labels: Vec<&str> = store.rules().iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["#0", "#1", "verse", "#3"]);

        let before = store.rules().to_vec();
        store.bake_positions();
        assert_eq!(store.rules(), before.as_slice());
    }

    #[test]
    fn test_add_rule_shifts_selection() {
        let mut store = store_with(&[1, 2, 3]);
        store.select(1);
        store.add_rule(Rule::default(), Some(1));
        assert!(store.is_selected(2));
        assert!(!store.is_selected(1));

        store.add_rule(Rule::default(), Some(3));
        assert_eq!(store.selection().indices(), &[2]);
    }

    #[test]
    fn test_del_rules_renumbers_selection() {
        let mut store = store_with(&[1, 2, 3, 4, 5]);
        store.select(1);
        store.select(4);
        let removed = store.del_rules(&[0, 1, 3]);

        assert_eq!(removed.iter().map(|r| r.length).collect::<Vec<_>>(), vec![1, 2, 4]);
        assert_eq!(lengths(&store), vec![3, 5]);
        assert_eq!(store.selection().indices(), &[1]);
    }

    #[test]
    fn test_del_rule_out_of_range() {
        let mut store = store_with(&[1]);
        assert!(store.del_rule(3).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rule_lookup_by_sample() {
        let store = store_with(&[10, 20]);
        assert_eq!(store.rule_index_at(0), Some(0));
        assert_eq!(store.rule_index_at(9), Some(0));
        assert_eq!(store.rule_index_at(10), Some(1));
        assert_eq!(store.rule_index_at(30), None);
        assert_eq!(store.rule_at(15).map(|r| r.length), Some(20));
    }

    #[test]
    fn test_undo_redo_law() {
        let mut store = store_with(&[10, 20]);
        let before = store.rules().to_vec();

        store.push_history();
        store.add_rule(Rule::with_sample_text(0, 5, 1.0, 1.0, "F", "F"), None);
        store.bake_positions();
        let after = store.rules().to_vec();

        assert!(store.undo());
        assert_eq!(store.rules(), before.as_slice());
        assert!(store.redo());
        assert_eq!(store.rules(), after.as_slice());
        assert!(!store.redo());
    }

    #[test]
    fn test_undo_clears_selection() {
        let mut store = store_with(&[10, 20]);
        store.select(1);
        assert!(store.delete_selected());
        store.select(0);
        assert!(store.undo());
        assert!(store.selection().is_empty());
        assert_eq!(lengths(&store), vec![10, 20]);
    }

    #[test]
    fn test_history_bounded() {
        let mut store = store_with(&[1]);
        for _ in 0..50 {
            store.push_history();
        }
        assert_eq!(store.history().depth(), 32);
    }

    #[test]
    fn test_select_range_orders_and_clamps() {
        let mut store = store_with(&[1, 1, 1, 1]);
        assert!(store.select_range(10, 2));
        assert_eq!(store.selection().indices(), &[2, 3]);

        store.clear_selection();
        assert!(store.select_range(-3, 0));
        assert_eq!(store.selection().indices(), &[0]);

        assert!(!store.select_range(4, 9));
        assert!(!store.select_range(-5, -1));
    }

    #[test]
    fn test_select_out_of_range() {
        let mut store = store_with(&[1]);
        assert_eq!(store.select(1), None);
        assert!(!store.flip(4));
        assert!(store.selection().is_empty());
    }

    #[test]
    fn test_extend_selection() {
        let mut store = store_with(&[1; 8]);
        store.select(3);
        store.select(5);
        assert!(store.extend_selection(1));
        assert_eq!(store.selection().indices(), &[1, 2, 3, 4, 5]);
        assert!(store.extend_selection(7));
        assert_eq!(store.selection().indices(), &[1, 2, 3, 4, 5, 6, 7]);
        assert!(!store.extend_selection(8));
    }

    #[test]
    fn test_selection_span() {
        let mut store = store_with(&[10, 20, 30]);
        assert_eq!(store.selection_length(), None);
        store.select_range(1, 2);
        assert_eq!(store.selection_start(), Some(10));
        assert_eq!(store.selection_end(), Some(59));
        assert_eq!(store.selection_length(), Some(50));
    }

    #[test]
    fn test_scale_selection() {
        let mut store = store_with(&[10, 20, 30]);
        store.select_range(0, 1);
        assert_eq!(store.scale_selection(-0.5), Some(-15));
        assert_eq!(lengths(&store), vec![5, 10, 30]);
        assert_contiguous(store.rules());

        store.clear_selection();
        assert_eq!(store.scale_selection(2.0), None);
        store.select(0);
        store.select(2);
        assert_eq!(store.scale_selection(2.0), None);
    }

    #[test]
    fn test_create_rules_after_selection() {
        let mut store = store_with(&[10, 20]);
        store.select(0);
        store.create_rules("F,4;G,4", "FGfg", 7, 2.0, 0.5, 2);

        assert_eq!(lengths(&store), vec![10, 7, 7, 20]);
        assert_eq!(store.rules()[1].factor, 2.0);
        assert_eq!(store.rules()[2].samples.len(), 2);
        assert_contiguous(store.rules());
        assert!(store.undo());
        assert_eq!(lengths(&store), vec![10, 20]);
    }

    #[test]
    fn test_duplicate_selected() {
        let mut store = store_with(&[10, 20, 30]);
        store.select_range(0, 1);
        assert!(store.duplicate_selected());
        assert_eq!(lengths(&store), vec![10, 20, 10, 20, 30]);
        assert_contiguous(store.rules());
    }

    #[test]
    fn test_cut_and_paste() {
        let mut store = store_with(&[10, 20, 30]);
        store.select(0);
        assert!(store.cut_selected());
        assert_eq!(lengths(&store), vec![20, 30]);
        assert!(store.selection().is_empty());

        assert!(store.paste());
        assert_eq!(lengths(&store), vec![20, 30, 10]);

        store.select(0);
        assert!(store.paste());
        assert_eq!(lengths(&store), vec![20, 10, 30, 10]);
        assert_contiguous(store.rules());
    }

    #[test]
    fn test_commands_need_selection() {
        let mut store = store_with(&[10]);
        assert!(!store.duplicate_selected());
        assert!(!store.delete_selected());
        assert!(!store.copy_selected());
        assert!(!store.cut_selected());
        assert!(!store.paste());
        assert!(!store.split_selected());
        assert!(!store.set_factor(3.0));
        assert_eq!(store.history().depth(), 0);
    }

    #[test]
    fn test_split_rule_preserves_total() {
        let mut store = store_with(&[11, 4]);
        store.select(0);
        assert!(store.split_rule(0));
        assert_eq!(lengths(&store), vec![5, 6, 4]);
        assert_eq!(store.selection().indices(), &[0, 1]);
        assert_contiguous(store.rules());
        assert!(!store.split_rule(9));
    }

    #[test]
    fn test_split_selected() {
        let mut store = store_with(&[10, 3, 8]);
        store.select(0);
        store.select(2);
        assert!(store.split_selected());
        assert_eq!(lengths(&store), vec![5, 5, 3, 4, 4]);
        assert_eq!(store.selection().indices(), &[0, 1, 3, 4]);
    }

    #[test]
    fn test_join_selected() {
        let mut store = store_with(&[10, 20, 30, 40]);
        store.rule_mut(2).unwrap().factor = 3.0;
        store.select_range(1, 2);
        assert!(store.join_selected());
        assert_eq!(lengths(&store), vec![10, 50, 40]);
        assert_eq!(store.rules()[1].factor, 1.0);
        assert_eq!(store.selection().indices(), &[1]);
        assert_contiguous(store.rules());
    }

    #[test]
    fn test_join_refuses_bad_selection() {
        let mut store = store_with(&[10, 20, 30]);
        store.select(0);
        assert!(!store.join_selected());
        store.select(2);
        assert!(!store.join_selected());
        assert_eq!(lengths(&store), vec![10, 20, 30]);
    }

    #[test]
    fn test_property_setters() {
        let mut store = store_with(&[10, 20, 30]);
        store.select_range(0, 1);

        assert!(store.set_pattern("GGff"));
        assert!(store.set_samples("F,4;G,4;H,2"));
        assert!(store.set_factor(2.0));
        assert!(store.set_volume(0.25));
        assert!(store.set_color(Color::new(0, 255, 0)));
        assert!(store.set_length_secs(0.5, 100));
        assert!(store.set_label("intro"));

        assert_eq!(store.pattern(), Some("GGff"));
        assert_eq!(store.samples_text().as_deref(), Some("F,4;G,4;H,2"));
        assert_eq!(store.factor(), Some(2.0));
        assert_eq!(store.volume(), Some(0.25));
        assert_eq!(store.color(), Some(Color::new(0, 255, 0)));
        assert_eq!(store.length_secs(100), Some(0.5));
        assert_eq!(store.label(), Some("intro"));
        assert_eq!(store.rules()[1].label, "#1");
        assert_eq!(lengths(&store), vec![50, 50, 30]);
        assert_contiguous(store.rules());
    }

    #[test]
    fn test_skipjack_selected() {
        let source = Segment::new(vec![(0..60).map(f64::from).collect()]);
        let mut store = store_with(&[10, 20, 30]);
        store.select(0);
        store.select(2);
        let settings = ExportSettings {
            blur_length: 0,
            smoothing_rate: 0,
            ..Default::default()
        };
        let render = store.skipjack_selected(&source, &settings).unwrap();
        assert_eq!(render.reports.len(), 2);
        assert_eq!(render.segment.len(), 40);
        assert_eq!(render.segment.channel(0)[10], 30.0);
    }

    #[test]
    fn test_averages() {
        let mut store = store_with(&[100, 300]);
        assert_eq!(store.average_factor(), None);
        store.rule_mut(1).unwrap().factor = 3.0;
        store.rule_mut(1).unwrap().volume = 0.5;
        store.select_all();

        assert_eq!(store.average_length_secs(100), Some(2.0));
        assert_eq!(store.average_factor(), Some(2.0));
        assert_eq!(store.average_volume(), Some(0.75));
    }
}
