use crate::geometry::{PixelPoint, Rect};

/// On-screen buttons the pointer can dwell on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum Control {
    Reset,
    ModeToggle,
}

impl Control {
    /// Hit-test order: earlier controls win where rects overlap.
    pub const ALL: [Control; 2] = [Control::Reset, Control::ModeToggle];

    pub fn label(&self) -> &'static str {
        match self {
            Control::Reset => "RESET",
            Control::ModeToggle => "MODE",
        }
    }
}

/// Game mutation a control stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ResetGame,
    SwitchMode,
}

/// Which action each control triggers. Built once at start-up so a button's
/// label and its effect cannot drift apart.
#[derive(Debug, Clone)]
pub struct ControlBindings {
    reset: Action,
    mode_toggle: Action,
}

impl Default for ControlBindings {
    fn default() -> Self {
        Self {
            reset: Action::ResetGame,
            mode_toggle: Action::SwitchMode,
        }
    }
}

impl ControlBindings {
    pub fn action(&self, control: Control) -> Action {
        match control {
            Control::Reset => self.reset,
            Control::ModeToggle => self.mode_toggle,
        }
    }
}

/// Surface-space bounds of every control, rebuilt each frame from the
/// current screen layout
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlLayout {
    bounds: Vec<(Control, Rect)>,
}

impl ControlLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, control: Control, rect: Rect) -> Self {
        self.set(control, rect);
        self
    }

    pub fn set(&mut self, control: Control, rect: Rect) {
        match self.bounds.iter_mut().find(|(c, _)| *c == control) {
            Some(entry) => entry.1 = rect,
            None => self.bounds.push((control, rect)),
        }
    }

    pub fn bounds(&self, control: Control) -> Option<Rect> {
        self.bounds
            .iter()
            .find(|(c, _)| *c == control)
            .map(|(_, r)| *r)
    }

    pub fn hit_test(&self, point: PixelPoint) -> Option<Control> {
        Control::ALL
            .into_iter()
            .find(|c| self.bounds(*c).is_some_and(|r| r.contains(point)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings_match_labels() {
        let b = ControlBindings::default();
        assert_eq!(b.action(Control::Reset), Action::ResetGame);
        assert_eq!(b.action(Control::ModeToggle), Action::SwitchMode);
    }

    #[test]
    fn test_hit_test_finds_control() {
        let layout = ControlLayout::new()
            .with(Control::Reset, Rect::new(0.0, 0.0, 100.0, 50.0))
            .with(Control::ModeToggle, Rect::new(700.0, 0.0, 100.0, 50.0));

        assert_eq!(layout.hit_test(PixelPoint::new(50.0, 25.0)), Some(Control::Reset));
        assert_eq!(
            layout.hit_test(PixelPoint::new(750.0, 10.0)),
            Some(Control::ModeToggle)
        );
        assert_eq!(layout.hit_test(PixelPoint::new(400.0, 25.0)), None);
    }

    #[test]
    fn test_overlap_prefers_reset() {
        let layout = ControlLayout::new()
            .with(Control::ModeToggle, Rect::new(0.0, 0.0, 100.0, 100.0))
            .with(Control::Reset, Rect::new(50.0, 50.0, 100.0, 100.0));
        assert_eq!(layout.hit_test(PixelPoint::new(75.0, 75.0)), Some(Control::Reset));
    }

    #[test]
    fn test_set_replaces_bounds() {
        let mut layout = ControlLayout::new().with(Control::Reset, Rect::new(0.0, 0.0, 10.0, 10.0));
        layout.set(Control::Reset, Rect::new(100.0, 100.0, 10.0, 10.0));
        assert_eq!(layout.hit_test(PixelPoint::new(5.0, 5.0)), None);
        assert_eq!(
            layout.bounds(Control::Reset),
            Some(Rect::new(100.0, 100.0, 10.0, 10.0))
        );
    }

    #[test]
    fn test_empty_layout_hits_nothing() {
        assert_eq!(ControlLayout::new().hit_test(PixelPoint::new(0.0, 0.0)), None);
    }
}
