use shared::PartId;

use super::hit_test::{HitTestRouter, PointerEvent, Propagation, RouterError};
use crate::state::customization::CustomizationStore;

/// Turns raw per-frame picks into enter/move/leave/down/missed events.
///
/// Events are delivered to hit parts nearest first and stop at the first
/// handler that returns [`Propagation::Stop`]. A part counts as entered
/// once it has received `Enter` and until it receives `Leave`.
#[derive(Debug, Default)]
pub struct PointerTracker {
    entered: Vec<PartId>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entered(&self) -> &[PartId] {
        &self.entered
    }

    /// Pointer moved; `hits` are the parts under it, nearest first
    pub fn pointer_moved(
        &mut self,
        hits: &[PartId],
        router: &mut HitTestRouter,
        store: &mut CustomizationStore,
    ) -> Result<(), RouterError> {
        let mut reached = Vec::new();
        // Leaves still go out when the walk fails; the first error wins
        let mut failure = None;
        for part in hits {
            let entered = self.entered.contains(part);
            let event = if entered {
                PointerEvent::moved(part.clone(), hits.to_vec())
            } else {
                PointerEvent::enter(part.clone(), hits.to_vec())
            };
            let propagation = match router.handle(&event, store) {
                Ok(propagation) => propagation,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            };
            if !entered {
                self.entered.push(part.clone());
            }
            reached.push(part);
            if propagation == Propagation::Stop {
                break;
            }
        }

        let (stay, left): (Vec<PartId>, Vec<PartId>) = std::mem::take(&mut self.entered)
            .into_iter()
            .partition(|p| reached.contains(&p));
        self.entered = stay;

        for part in left {
            if let Err(e) = router.handle(&PointerEvent::leave(part, hits.to_vec()), store) {
                failure.get_or_insert(e);
            }
        }
        failure.map_or(Ok(()), Err)
    }

    /// Pointer left the viewport
    pub fn pointer_left(
        &mut self,
        router: &mut HitTestRouter,
        store: &mut CustomizationStore,
    ) -> Result<(), RouterError> {
        self.pointer_moved(&[], router, store)
    }

    /// Primary button pressed with `hits` under the pointer
    pub fn pointer_down(
        &mut self,
        hits: &[PartId],
        router: &mut HitTestRouter,
        store: &mut CustomizationStore,
    ) -> Result<(), RouterError> {
        if hits.is_empty() {
            router.handle(&PointerEvent::missed(), store)?;
            return Ok(());
        }
        for part in hits {
            let event = PointerEvent::down(part.clone(), hits.to_vec());
            if router.handle(&event, store)? == Propagation::Stop {
                break;
            }
        }
        Ok(())
    }
}
