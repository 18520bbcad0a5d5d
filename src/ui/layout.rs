use ratatui::layout::{Constraint, Direction, Layout, Rect};
use unicode_width::UnicodeWidthStr;

use crate::controls::{Control, ControlLayout};
use crate::geometry::{self, project_control_bounds, Size};

const HEADER_HEIGHT: u16 = 3;
const FOOTER_HEIGHT: u16 = 1;
const BUTTON_HEIGHT: u16 = 3;
const BUTTON_PADDING: u16 = 4;

/// Where everything sits on screen for the current terminal size.
///
/// Recomputed every frame; terminal resizes move the controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenLayout {
    pub header: Rect,
    /// On-screen rect the render surface is stretched over
    pub display: Rect,
    pub footer: Rect,
    pub controls: Vec<(Control, Rect)>,
}

pub fn to_geometry(r: Rect) -> geometry::Rect {
    geometry::Rect::new(r.x as f64, r.y as f64, r.width as f64, r.height as f64)
}

pub fn button_width(control: Control) -> u16 {
    control.label().width() as u16 + BUTTON_PADDING
}

impl ScreenLayout {
    pub fn compute(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);
        let main = chunks[1];

        // terminal cells are about twice as tall as they are wide
        let height = main.height.min(main.width / 2);
        let width = (height * 2).min(main.width);
        let display = Rect {
            x: main.x + (main.width - width) / 2,
            y: main.y + (main.height - height) / 2,
            width,
            height,
        };

        let controls = Control::ALL
            .into_iter()
            .map(|control| {
                let w = button_width(control).min(display.width);
                let h = BUTTON_HEIGHT.min(display.height);
                let x = match control {
                    Control::Reset => display.x,
                    Control::ModeToggle => display.x + display.width - w,
                };
                (control, Rect::new(x, display.y, w, h))
            })
            .collect();

        Self {
            header: chunks[0],
            display,
            footer: chunks[2],
            controls,
        }
    }

    pub fn control_rect(&self, control: Control) -> Option<Rect> {
        self.controls
            .iter()
            .find(|(c, _)| *c == control)
            .map(|(_, r)| *r)
    }

    /// Control under a terminal cell, for mouse clicks.
    pub fn control_at(&self, column: u16, row: u16) -> Option<Control> {
        self.controls
            .iter()
            .find(|(_, r)| {
                column >= r.x && column < r.x + r.width && row >= r.y && row < r.y + r.height
            })
            .map(|(c, _)| *c)
    }

    /// Control bounds moved into surface pixels.
    pub fn control_layout(&self, surface: Size) -> ControlLayout {
        let display = to_geometry(self.display);
        let mut layout = ControlLayout::new();
        for (control, rect) in &self.controls {
            if let Some(bounds) = project_control_bounds(to_geometry(*rect), display, surface) {
                layout.set(*control, bounds);
            }
        }
        layout
    }
}
