//! Positional enable/disable mask over a parsed action chain.
//!
//! Every entry starts enabled. The pre-process pass may disable individual
//! entries (or all of them) based on source properties discovered after
//! decode; execution then only runs the entries that survived. `disable_all`
//! is irreversible for the lifetime of the request.

use pictor_core::{AppError, AppResult};

#[derive(Debug, Clone)]
pub struct ActionMask {
    actions: Vec<String>,
    enabled: Vec<bool>,
    locked: bool,
}

impl ActionMask {
    pub fn new(actions: &[String]) -> Self {
        Self {
            actions: actions.to_vec(),
            enabled: vec![true; actions.len()],
            locked: false,
        }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn get(&self, index: usize) -> AppResult<&str> {
        self.check(index)?;
        Ok(&self.actions[index])
    }

    pub fn is_enabled(&self, index: usize) -> AppResult<bool> {
        self.check(index)?;
        Ok(self.enabled[index])
    }

    pub fn is_disabled(&self, index: usize) -> AppResult<bool> {
        Ok(!self.is_enabled(index)?)
    }

    pub fn enable(&mut self, index: usize) -> AppResult<()> {
        self.check(index)?;
        if !self.locked {
            self.enabled[index] = true;
        }
        Ok(())
    }

    pub fn disable(&mut self, index: usize) -> AppResult<()> {
        self.check(index)?;
        self.enabled[index] = false;
        Ok(())
    }

    /// Disable every entry. Cannot be undone within the request.
    pub fn disable_all(&mut self) {
        self.enabled.fill(false);
        self.locked = true;
    }

    /// The enabled entries, in chain order.
    pub fn filter_enabled(&self) -> Vec<String> {
        self.actions
            .iter()
            .zip(&self.enabled)
            .filter(|(_, &enabled)| enabled)
            .map(|(action, _)| action.clone())
            .collect()
    }

    /// Visit every entry in chain order, enabled or not.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&str, bool, usize),
    {
        for (index, (action, &enabled)) in self.actions.iter().zip(&self.enabled).enumerate() {
            f(action, enabled, index);
        }
    }

    fn check(&self, index: usize) -> AppResult<()> {
        if index >= self.actions.len() {
            return Err(AppError::invalid_argument(format!(
                "action index out of range: {index}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(s: &str) -> Vec<String> {
        s.split('/').map(str::to_string).collect()
    }

    #[test]
    fn test_all_enabled_at_construction() {
        let mask = ActionMask::new(&chain("image/resize,w_10/format,png"));
        assert_eq!(mask.len(), 3);
        for i in 0..3 {
            assert!(mask.is_enabled(i).unwrap());
        }
        assert_eq!(mask.get(1).unwrap(), "resize,w_10");
    }

    #[test]
    fn test_out_of_range_fails() {
        let mut mask = ActionMask::new(&chain("image/resize,w_10"));
        assert!(mask.get(2).is_err());
        assert!(mask.is_enabled(2).is_err());
        assert!(mask.disable(2).is_err());
    }

    #[test]
    fn test_disable_and_filter_preserves_order() {
        let mut mask = ActionMask::new(&chain("image/resize,w_10/quality,q_80/format,png"));
        mask.disable(2).unwrap();
        assert_eq!(
            mask.filter_enabled(),
            vec!["image", "resize,w_10", "format,png"]
        );
    }

    #[test]
    fn test_disable_all_is_irreversible() {
        let mut mask = ActionMask::new(&chain("image/resize,w_10"));
        mask.disable_all();
        mask.enable(1).unwrap();
        assert!(mask.is_disabled(1).unwrap());
        assert!(mask.filter_enabled().is_empty());
    }

    #[test]
    fn test_for_each_exposes_mask_state() {
        let mut mask = ActionMask::new(&chain("image/resize,w_10/format,png"));
        mask.disable(1).unwrap();
        let mut seen = Vec::new();
        mask.for_each(|action, enabled, index| seen.push((action.to_string(), enabled, index)));
        assert_eq!(
            seen,
            vec![
                ("image".to_string(), true, 0),
                ("resize,w_10".to_string(), false, 1),
                ("format,png".to_string(), true, 2),
            ]
        );
    }
}
