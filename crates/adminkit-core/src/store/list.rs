// ── Per-resource list view state ──

use adminkit_api::{GetListParams, Identifier};

/// The list page of a resource: the ids on the current page, the total
/// reported by the provider, and the user's selection/expansion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListState {
    pub ids: Vec<Identifier>,
    pub total: u64,
    pub selected_ids: Vec<Identifier>,
    pub expanded: Vec<Identifier>,
    /// Set after the first successful `GET_LIST`.
    pub loaded_once: bool,
    /// Params of the last `GET_LIST` stored here.
    pub params: GetListParams,
}

impl ListState {
    pub fn select(&mut self, ids: Vec<Identifier>) {
        self.selected_ids = ids;
    }

    pub fn toggle_selected(&mut self, id: &Identifier) {
        toggle(&mut self.selected_ids, id);
    }

    pub fn unselect_all(&mut self) {
        self.selected_ids.clear();
    }

    pub fn toggle_expanded(&mut self, id: &Identifier) {
        toggle(&mut self.expanded, id);
    }

    /// Drop `removed` from every id list. `total` shrinks by the number
    /// of ids that were on the current page.
    pub fn remove_ids(&mut self, removed: &[Identifier]) {
        let before = self.ids.len();
        self.ids.retain(|id| !removed.contains(id));
        let dropped = u64::try_from(before - self.ids.len()).unwrap_or(u64::MAX);
        self.total = self.total.saturating_sub(dropped);
        self.selected_ids.retain(|id| !removed.contains(id));
        self.expanded.retain(|id| !removed.contains(id));
    }
}

fn toggle(ids: &mut Vec<Identifier>, id: &Identifier) {
    if let Some(index) = ids.iter().position(|existing| existing == id) {
        ids.remove(index);
    } else {
        ids.push(id.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[i64]) -> Vec<Identifier> {
        raw.iter().copied().map(Identifier::Num).collect()
    }

    #[test]
    fn toggle_selection_adds_and_removes() {
        let mut list = ListState::default();
        list.toggle_selected(&Identifier::Num(1));
        list.toggle_selected(&Identifier::Num(2));
        list.toggle_selected(&Identifier::Num(1));
        assert_eq!(list.selected_ids, ids(&[2]));
        list.unselect_all();
        assert!(list.selected_ids.is_empty());
    }

    #[test]
    fn remove_ids_adjusts_total_and_selection() {
        let mut list = ListState {
            ids: ids(&[1, 2, 3]),
            total: 30,
            selected_ids: ids(&[2, 3]),
            expanded: ids(&[3]),
            ..ListState::default()
        };
        list.remove_ids(&ids(&[3, 99]));
        assert_eq!(list.ids, ids(&[1, 2]));
        assert_eq!(list.total, 29);
        assert_eq!(list.selected_ids, ids(&[2]));
        assert!(list.expanded.is_empty());
    }
}
