use thiserror::Error;

use super::action::ActionKind;
use super::action::PendingAction;
use super::action::RecordedAction;
use super::geometry::ImageSize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AppendRejected {
    #[error("recording is not active")]
    NotRecording,
    #[error("action list is frozen")]
    Frozen,
}

/// Ordered capture output of one session.
///
/// Step numbers are assigned here, at the moment an entry is applied, as `len + 1`. Captures
/// need an open recording segment; waits only need the list to be unfrozen.
#[derive(Debug, Clone, Default)]
pub struct ActionList {
    actions: Vec<RecordedAction>,
    segment_open: bool,
    frozen: bool,
    screen: Option<ImageSize>,
}

impl ActionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn actions(&self) -> &[RecordedAction] {
        &self.actions
    }

    pub fn is_recording(&self) -> bool {
        self.segment_open
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn screen(&self) -> Option<ImageSize> {
        self.screen
    }

    /// Native screen size used to keep stored coordinates on screen.
    pub fn set_screen(&mut self, size: Option<ImageSize>) {
        self.screen = size.filter(|s| !s.is_empty());
    }

    pub fn open_segment(&mut self) -> Result<(), AppendRejected> {
        if self.frozen {
            return Err(AppendRejected::Frozen);
        }
        self.segment_open = true;
        Ok(())
    }

    /// Closes the current segment and returns the list length at the barrier.
    pub fn close_segment(&mut self) -> usize {
        self.segment_open = false;
        self.actions.len()
    }

    pub fn append(&mut self, pending: PendingAction) -> Result<&RecordedAction, AppendRejected> {
        if self.frozen {
            return Err(AppendRejected::Frozen);
        }
        if !self.segment_open {
            return Err(AppendRejected::NotRecording);
        }
        Ok(self.push(pending))
    }

    pub fn insert_wait(
        &mut self,
        pending: PendingAction,
    ) -> Result<&RecordedAction, AppendRejected> {
        if self.frozen {
            return Err(AppendRejected::Frozen);
        }
        debug_assert!(matches!(pending.kind, ActionKind::Wait { .. }));
        Ok(self.push(pending))
    }

    pub fn freeze(&mut self) {
        self.segment_open = false;
        self.frozen = true;
    }

    /// Drops every entry and returns to the initial, unfrozen state.
    pub fn clear(&mut self) {
        self.actions.clear();
        self.segment_open = false;
        self.frozen = false;
    }

    fn push(&mut self, pending: PendingAction) -> &RecordedAction {
        let pending = match self.screen {
            Some(size) => pending.with_clamped_points(|p| p.clamp_to(size)),
            None => pending,
        };
        let step = u32::try_from(self.actions.len())
            .unwrap_or(u32::MAX)
            .saturating_add(1);
        self.actions.push(RecordedAction::from_pending(step, pending));
        &self.actions[self.actions.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ActionSource;
    use crate::domain::DevicePoint;
    use crate::domain::WaitSeconds;

    fn tap(x: u32, y: u32) -> PendingAction {
        PendingAction::tap(DevicePoint::new(x, y), ActionSource::LocalDesktop, 0)
    }

    #[test]
    fn test_append_requires_open_segment() {
        let mut list = ActionList::new();
        assert_eq!(list.append(tap(1, 1)), Err(AppendRejected::NotRecording));
        list.open_segment().unwrap();
        assert_eq!(list.append(tap(1, 1)).unwrap().step, 1);
    }

    #[test]
    fn test_steps_are_contiguous_across_segments() {
        let mut list = ActionList::new();
        list.open_segment().unwrap();
        list.append(tap(1, 1)).unwrap();
        list.close_segment();
        list.insert_wait(PendingAction::wait(WaitSeconds::Two, 0))
            .unwrap();
        list.open_segment().unwrap();
        list.append(tap(2, 2)).unwrap();

        let steps: Vec<u32> = list.actions().iter().map(|a| a.step).collect();
        assert_eq!(steps, vec![1, 2, 3]);
    }

    #[test]
    fn test_close_segment_is_a_barrier() {
        let mut list = ActionList::new();
        list.open_segment().unwrap();
        list.append(tap(1, 1)).unwrap();
        assert_eq!(list.close_segment(), 1);
        assert_eq!(list.append(tap(2, 2)), Err(AppendRejected::NotRecording));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_frozen_list_rejects_everything() {
        let mut list = ActionList::new();
        list.open_segment().unwrap();
        list.append(tap(1, 1)).unwrap();
        list.freeze();
        assert_eq!(list.append(tap(2, 2)), Err(AppendRejected::Frozen));
        assert_eq!(
            list.insert_wait(PendingAction::wait(WaitSeconds::One, 0)),
            Err(AppendRejected::Frozen)
        );
        assert_eq!(list.open_segment(), Err(AppendRejected::Frozen));
    }

    #[test]
    fn test_clear_unfreezes() {
        let mut list = ActionList::new();
        list.open_segment().unwrap();
        list.append(tap(1, 1)).unwrap();
        list.freeze();
        list.clear();
        assert!(list.is_empty());
        assert!(!list.is_frozen());
        assert!(!list.is_recording());
    }

    #[test]
    fn test_points_are_clamped_to_screen() {
        let mut list = ActionList::new();
        list.set_screen(Some(ImageSize::new(100, 200)));
        list.open_segment().unwrap();
        let recorded = list.append(tap(150, 250)).unwrap();
        assert_eq!(
            recorded.kind,
            ActionKind::Tap {
                x: 99,
                y: 199,
                element: None
            }
        );
    }
}
