//! Ordered registry of stacked (non-modal) windows.

use desktop_app_contract::WindowId;

#[derive(Debug, Clone, PartialEq, Eq)]
/// One stacked window and its zero-based position (front-most is highest).
pub struct StackedWindow {
    /// Window id.
    pub id: WindowId,
    /// Zero-based stacking position.
    pub position: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Focus signals produced by a stack transition, delivered by the caller.
pub struct StackTransition {
    /// Window that lost the top-most position.
    pub blurred: Option<WindowId>,
    /// Window that should receive focus.
    pub focused: Option<WindowId>,
}

impl StackTransition {
    /// Returns whether the transition carries no signal.
    pub fn is_empty(&self) -> bool {
        self.blurred.is_none() && self.focused.is_none()
    }
}

#[derive(Debug, Clone, Default)]
/// Dense stacking order of non-modal windows.
pub struct WindowStack {
    windows: Vec<StackedWindow>,
}

impl WindowStack {
    /// Appends `window_id` at position `len()` and returns the position.
    ///
    /// Pushing a window that is already stacked keeps its current position.
    pub fn push(&mut self, window_id: WindowId) -> usize {
        if let Some(position) = self.position(&window_id) {
            return position;
        }
        let position = self.windows.len();
        self.windows.push(StackedWindow {
            id: window_id,
            position,
        });
        position
    }

    /// Removes `window_id`, shifting every window above it down by one.
    ///
    /// Returns `false` (and does nothing) for unknown windows or an empty stack.
    pub fn remove(&mut self, window_id: &WindowId) -> bool {
        let Some(index) = self.windows.iter().position(|w| &w.id == window_id) else {
            return false;
        };
        self.windows.remove(index);
        self.normalize();
        true
    }

    /// Moves `window_id` to the top, blurring the previous top window.
    ///
    /// No-op when the window is already top-most or not stacked.
    pub fn focus(&mut self, window_id: &WindowId) -> StackTransition {
        let Some(index) = self.windows.iter().position(|w| &w.id == window_id) else {
            return StackTransition::default();
        };
        if index + 1 == self.windows.len() {
            return StackTransition::default();
        }

        let blurred = self.top().cloned();
        let window = self.windows.remove(index);
        self.windows.push(window);
        self.normalize();
        StackTransition {
            blurred,
            focused: Some(window_id.clone()),
        }
    }

    /// Re-focuses the current top-most window; empty on an empty stack.
    pub fn focus_top(&self) -> StackTransition {
        StackTransition {
            blurred: None,
            focused: self.top().cloned(),
        }
    }

    /// Returns the top-most window.
    pub fn top(&self) -> Option<&WindowId> {
        self.windows.last().map(|w| &w.id)
    }

    /// Returns the position of `window_id`.
    pub fn position(&self, window_id: &WindowId) -> Option<usize> {
        self.windows
            .iter()
            .find(|w| &w.id == window_id)
            .map(|w| w.position)
    }

    /// Returns whether `window_id` is stacked.
    pub fn contains(&self, window_id: &WindowId) -> bool {
        self.windows.iter().any(|w| &w.id == window_id)
    }

    /// Number of stacked windows.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Returns whether no window is stacked.
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Stacked windows from back to front.
    pub fn iter(&self) -> impl Iterator<Item = &StackedWindow> {
        self.windows.iter()
    }

    /// Window ids from back to front.
    pub fn order(&self) -> Vec<WindowId> {
        self.windows.iter().map(|w| w.id.clone()).collect()
    }

    /// Returns the highest-positioned window accepted by `filter`.
    pub fn top_matching(&self, filter: impl Fn(&WindowId) -> bool) -> Option<&WindowId> {
        self.windows.iter().rev().map(|w| &w.id).find(|id| filter(id))
    }

    /// Returns whether positions form the permutation `0..len()` in order.
    pub fn is_dense(&self) -> bool {
        self.windows
            .iter()
            .enumerate()
            .all(|(idx, w)| w.position == idx)
    }

    fn normalize(&mut self) {
        for (idx, window) in self.windows.iter_mut().enumerate() {
            window.position = idx;
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn id(raw: &str) -> WindowId {
        WindowId::new(raw)
    }

    #[test]
    fn push_assigns_current_count() {
        let mut stack = WindowStack::default();
        assert_eq!(stack.push(id("a")), 0);
        assert_eq!(stack.push(id("b")), 1);
        assert_eq!(stack.push(id("a")), 0);
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.top(), Some(&id("b")));
    }

    #[test]
    fn remove_shifts_windows_above_down() {
        let mut stack = WindowStack::default();
        for raw in ["a", "b", "c", "d"] {
            stack.push(id(raw));
        }
        assert!(stack.remove(&id("b")));
        assert_eq!(stack.order(), vec![id("a"), id("c"), id("d")]);
        assert_eq!(stack.position(&id("c")), Some(1));
        assert_eq!(stack.position(&id("d")), Some(2));
        assert!(stack.is_dense());
    }

    #[test]
    fn empty_stack_operations_are_noops() {
        let mut stack = WindowStack::default();
        assert!(!stack.remove(&id("a")));
        assert!(stack.focus_top().is_empty());
        assert!(stack.focus(&id("a")).is_empty());
    }

    #[test]
    fn focus_moves_window_to_top_and_reports_blur() {
        let mut stack = WindowStack::default();
        for raw in ["a", "b", "c"] {
            stack.push(id(raw));
        }

        let transition = stack.focus(&id("a"));
        assert_eq!(
            transition,
            StackTransition {
                blurred: Some(id("c")),
                focused: Some(id("a")),
            }
        );
        assert_eq!(stack.order(), vec![id("b"), id("c"), id("a")]);
        assert!(stack.is_dense());

        assert!(stack.focus(&id("a")).is_empty());
        assert_eq!(stack.focus_top().focused, Some(id("a")));
    }

    #[test]
    fn top_matching_skips_filtered_windows() {
        let mut stack = WindowStack::default();
        for raw in ["a1", "b1", "a2", "b2"] {
            stack.push(id(raw));
        }
        assert_eq!(
            stack.top_matching(|w| w.as_str().starts_with('a')),
            Some(&id("a2"))
        );
        assert_eq!(stack.top_matching(|w| w.as_str().starts_with('z')), None);
    }

    #[test]
    fn positions_stay_dense_across_mixed_operations() {
        let mut stack = WindowStack::default();
        let mut seed: u64 = 0x2545_f491;
        for step in 0..2_000u64 {
            seed = seed
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            let target = id(&format!("w{}", (seed >> 33) % 12));
            match (seed >> 20) % 3 {
                0 => {
                    stack.push(target);
                }
                1 => {
                    stack.remove(&target);
                }
                _ => {
                    stack.focus(&target);
                }
            }
            assert!(stack.is_dense(), "stack not dense after step {step}");
            let mut ids = stack.order();
            ids.sort();
            ids.dedup();
            assert_eq!(ids.len(), stack.len());
        }
    }
}
