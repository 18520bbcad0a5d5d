pub mod layout;
pub mod surface;

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::controls::Control;
use crate::game::Mark;
use crate::status::{Pill, Tone};

use self::layout::ScreenLayout;
use self::surface::SurfaceView;

const X_COLOR: Color = Color::Rgb(96, 165, 250);
const O_COLOR: Color = Color::Rgb(52, 211, 153);
const HIGHLIGHT: Color = Color::Yellow;

pub fn mark_color(mark: Mark) -> Color {
    match mark {
        Mark::X => X_COLOR,
        Mark::O => O_COLOR,
    }
}

fn tone_style(tone: Tone) -> Style {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    match tone {
        Tone::Player(mark) => bold_style.fg(mark_color(mark)),
        Tone::Neutral => bold_style.add_modifier(Modifier::DIM),
        Tone::Highlight => bold_style.fg(HIGHLIGHT),
    }
}

fn pill(p: &Pill) -> Span<'static> {
    Span::styled(
        format!(" {} ", p.text),
        tone_style(p.tone).add_modifier(Modifier::REVERSED),
    )
}

/// Draws one frame: status header, the game surface, controls laid over its
/// top corners and a key hint footer.
pub fn draw(f: &mut Frame, app: &App, layout: &ScreenLayout) {
    let status = app.status();

    let mut spans = vec![pill(&status.turn), Span::raw("  "), pill(&status.status)];
    spans.push(Span::raw("    "));
    for (mode, active) in status.modes {
        let style = if active {
            tone_style(Tone::Highlight).add_modifier(Modifier::REVERSED)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        spans.push(Span::styled(format!(" {mode} "), style));
        spans.push(Span::raw(" "));
    }
    let header = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(header, layout.header);

    f.render_widget(
        SurfaceView {
            scene: app.scene(),
            image: app.frame_image(),
        },
        layout.display,
    );

    let active = app.active_control();
    for (control, rect) in &layout.controls {
        render_control(f, *control, *rect, active == Some(*control));
    }

    let hint = Paragraph::new(Span::styled(
        "hover to select · click a button · (r)eset · (m)ode · (q)uit",
        Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
    ))
    .alignment(Alignment::Center);
    f.render_widget(hint, layout.footer);
}

fn render_control(f: &mut Frame, control: Control, rect: Rect, active: bool) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let style = if active {
        Style::default().fg(HIGHLIGHT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let button = Paragraph::new(Span::styled(control.label(), style))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(style),
        );
    f.render_widget(Clear, rect);
    f.render_widget(button, rect);
}
