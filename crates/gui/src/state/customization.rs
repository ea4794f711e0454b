//! Color assignment and selection for the model's parts.
//!
//! The store is the only mutable state shared between the viewport, the
//! picker panel and the capture renderer. It is created once per session
//! from the model's part list and mutated only through
//! [`CustomizationStore::set_color`] and
//! [`CustomizationStore::set_current_part`] (plus the bulk reset).
//! Observers run synchronously after each mutation has been applied.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use shared::{Color, ColorError, ModelDescription, ModelError, PartId};

use super::observers::{Observers, Subscription};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("unknown part '{0}'")]
    InvalidPart(String),
    #[error(transparent)]
    InvalidColor(#[from] ColorError),
}

/// Notification sent to store observers after a committed mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    ColorChanged {
        part: PartId,
        color: Color,
    },
    SelectionChanged {
        previous: Option<PartId>,
        current: Option<PartId>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartColor {
    pub part: PartId,
    pub color: Color,
}

/// Serializable copy of the store contents, in model part order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub current: Option<PartId>,
    pub colors: Vec<PartColor>,
}

pub struct CustomizationStore {
    /// Part order as declared by the model
    parts: Vec<PartId>,
    colors: HashMap<PartId, Color>,
    defaults: HashMap<PartId, Color>,
    current: Option<PartId>,
    observers: Observers<StoreChange>,
}

impl CustomizationStore {
    pub fn new(model: &ModelDescription) -> Result<Self, ModelError> {
        model.validate()?;

        let parts: Vec<PartId> = model.part_ids().cloned().collect();
        let defaults: HashMap<PartId, Color> = model
            .parts
            .iter()
            .map(|p| (p.name.clone(), p.default_color.clone()))
            .collect();

        tracing::debug!("Store created for model '{}' ({} parts)", model.name, parts.len());

        Ok(Self {
            parts,
            colors: defaults.clone(),
            defaults,
            current: None,
            observers: Observers::new(),
        })
    }

    /// All parts, in model order
    pub fn parts(&self) -> &[PartId] {
        &self.parts
    }

    /// Resolve a part name to the store's own identifier
    pub fn part(&self, name: &str) -> Result<&PartId, StoreError> {
        self.colors
            .get_key_value(name)
            .map(|(id, _)| id)
            .ok_or_else(|| StoreError::InvalidPart(name.to_string()))
    }

    pub fn get_color(&self, part: &str) -> Result<&Color, StoreError> {
        self.colors
            .get(part)
            .ok_or_else(|| StoreError::InvalidPart(part.to_string()))
    }

    pub fn default_color(&self, part: &str) -> Result<&Color, StoreError> {
        self.defaults
            .get(part)
            .ok_or_else(|| StoreError::InvalidPart(part.to_string()))
    }

    /// Parse `color` and assign it to `part`.
    ///
    /// Nothing changes if either argument is rejected. Every accepted call
    /// produces exactly one [`StoreChange::ColorChanged`].
    pub fn set_color(&mut self, part: &str, color: &str) -> Result<(), StoreError> {
        self.part(part)?;
        let color = Color::parse(color)?;
        self.set_color_value(part, color)
    }

    pub fn set_color_value(&mut self, part: &str, color: Color) -> Result<(), StoreError> {
        let id = self.part(part)?.clone();
        self.colors.insert(id.clone(), color.clone());
        tracing::debug!("Color of '{id}' set to {color}");

        self.observers
            .notify(&StoreChange::ColorChanged { part: id, color });
        Ok(())
    }

    pub fn current_part(&self) -> Option<&PartId> {
        self.current.as_ref()
    }

    /// Color of the selected part, if any
    pub fn current_color(&self) -> Option<&Color> {
        self.current.as_ref().and_then(|p| self.colors.get(p))
    }

    /// Select a part, or clear the selection with `None`.
    ///
    /// Observers are only notified when the selection actually changes.
    pub fn set_current_part(&mut self, part: Option<&str>) -> Result<(), StoreError> {
        let next = part.map(|name| self.part(name).cloned()).transpose()?;
        if next == self.current {
            return Ok(());
        }

        let previous = std::mem::replace(&mut self.current, next.clone());
        tracing::debug!(
            "Selection {} -> {}",
            previous.as_ref().map_or("none", |p| p.as_str()),
            next.as_ref().map_or("none", |p| p.as_str()),
        );

        self.observers.notify(&StoreChange::SelectionChanged {
            previous,
            current: next,
        });
        Ok(())
    }

    /// Restore every part to its default color.
    pub fn reset_colors(&mut self) {
        for part in &self.parts {
            let default = &self.defaults[part];
            if self.colors.get(part) == Some(default) {
                continue;
            }
            self.colors.insert(part.clone(), default.clone());
            self.observers.notify(&StoreChange::ColorChanged {
                part: part.clone(),
                color: default.clone(),
            });
        }
        tracing::debug!("Colors reset to defaults");
    }

    pub fn subscribe(&self, callback: impl FnMut(&StoreChange) + 'static) -> Subscription {
        self.observers.subscribe(callback)
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            current: self.current.clone(),
            colors: self
                .parts
                .iter()
                .map(|p| PartColor {
                    part: p.clone(),
                    color: self.colors[p].clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn store() -> CustomizationStore {
        CustomizationStore::new(&ModelDescription::sneaker()).unwrap()
    }

    fn record(store: &CustomizationStore) -> (Rc<RefCell<Vec<StoreChange>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        let sub = store.subscribe(move |c| l.borrow_mut().push(c.clone()));
        (log, sub)
    }

    #[test]
    fn test_every_part_has_a_color() {
        let s = store();
        assert_eq!(s.parts().len(), 8);
        for part in s.parts() {
            assert_eq!(s.get_color(part.as_str()).unwrap().as_str(), "#ffffff");
        }
    }

    #[test]
    fn test_unknown_part_is_rejected() {
        let s = store();
        assert_eq!(
            s.get_color("heel"),
            Err(StoreError::InvalidPart("heel".to_string()))
        );
    }

    #[test]
    fn test_set_color_round_trip() {
        let mut s = store();
        s.set_color("sole", "#1a2b3c").unwrap();
        assert_eq!(s.get_color("sole").unwrap().as_str(), "#1a2b3c");

        s.set_color("sole", "#ABCDEF").unwrap();
        assert_eq!(s.get_color("sole").unwrap().as_str(), "#abcdef");
    }

    #[test]
    fn test_set_color_only_touches_one_part() {
        let mut s = store();
        s.set_current_part(Some("sole")).unwrap();
        s.set_color("sole", "#ff0000").unwrap();
        assert_eq!(s.get_color("sole").unwrap().as_str(), "#ff0000");
        assert_eq!(s.get_color("mesh").unwrap().as_str(), "#ffffff");
    }

    #[test]
    fn test_invalid_color_leaves_store_unchanged() {
        let mut s = store();
        let (log, _sub) = record(&s);
        let err = s.set_color("laces", "not-a-color").unwrap_err();
        assert!(matches!(err, StoreError::InvalidColor(_)));
        assert_eq!(s.get_color("laces").unwrap().as_str(), "#ffffff");
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_invalid_part_checked_before_color() {
        let mut s = store();
        assert!(matches!(
            s.set_color("heel", "bogus"),
            Err(StoreError::InvalidPart(_))
        ));
    }

    #[test]
    fn test_one_notification_per_set_color() {
        let mut s = store();
        let (log, _sub) = record(&s);
        s.set_color("band", "#00ff00").unwrap();
        s.set_color("band", "#00ff00").unwrap();
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(
            log.borrow()[0],
            StoreChange::ColorChanged {
                part: PartId::new("band"),
                color: Color::parse("#00ff00").unwrap(),
            }
        );
    }

    #[test]
    fn test_observer_sees_committed_state() {
        let mut s = store();
        let seen = Rc::new(RefCell::new(None));
        let sn = seen.clone();
        let _sub = s.subscribe(move |c| {
            if let StoreChange::ColorChanged { color, .. } = c {
                *sn.borrow_mut() = Some(color.clone());
            }
        });
        s.set_color("caps", "#123456").unwrap();
        assert_eq!(seen.borrow().as_ref().unwrap(), s.get_color("caps").unwrap());
    }

    #[test]
    fn test_clear_selection_when_none_is_silent() {
        let mut s = store();
        let (log, _sub) = record(&s);
        s.set_current_part(None).unwrap();
        s.set_current_part(None).unwrap();
        assert!(log.borrow().is_empty());
        assert!(s.current_part().is_none());
    }

    #[test]
    fn test_selection_change_notifies_once() {
        let mut s = store();
        let (log, _sub) = record(&s);
        s.set_current_part(Some("band")).unwrap();
        s.set_current_part(Some("band")).unwrap();
        s.set_current_part(None).unwrap();
        assert_eq!(
            *log.borrow(),
            vec![
                StoreChange::SelectionChanged {
                    previous: None,
                    current: Some(PartId::new("band")),
                },
                StoreChange::SelectionChanged {
                    previous: Some(PartId::new("band")),
                    current: None,
                },
            ]
        );
    }

    #[test]
    fn test_select_unknown_part_keeps_selection() {
        let mut s = store();
        s.set_current_part(Some("mesh")).unwrap();
        assert!(s.set_current_part(Some("tongue")).is_err());
        assert_eq!(s.current_part().unwrap(), "mesh");
    }

    #[test]
    fn test_current_color_follows_selection() {
        let mut s = store();
        assert!(s.current_color().is_none());
        s.set_color("patch", "#0000ff").unwrap();
        s.set_current_part(Some("patch")).unwrap();
        assert_eq!(s.current_color().unwrap().as_str(), "#0000ff");
    }

    #[test]
    fn test_unsubscribed_observer_not_called() {
        let mut s = store();
        let (log, sub) = record(&s);
        sub.unsubscribe();
        sub.unsubscribe();
        s.set_color("sole", "#000").unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_reset_colors_notifies_changed_parts_only() {
        let mut s = store();
        s.set_color("sole", "#000").unwrap();
        s.set_color("laces", "#f00").unwrap();
        let (log, _sub) = record(&s);

        s.reset_colors();
        assert_eq!(log.borrow().len(), 2);
        assert_eq!(s.get_color("sole").unwrap(), s.default_color("sole").unwrap());
    }

    #[test]
    fn test_snapshot_in_model_order() {
        let mut s = store();
        s.set_current_part(Some("caps")).unwrap();
        let snap = s.snapshot();
        assert_eq!(snap.current, Some(PartId::new("caps")));
        assert_eq!(snap.colors.len(), 8);
        assert_eq!(snap.colors[0].part, "laces");
    }
}
