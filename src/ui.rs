use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::{
    app::App,
    difficulty::Difficulty,
    effects::{Anchor, Effects},
    session::{Phase, SlotView, Snapshot},
};

const HORIZONTAL_MARGIN: u16 = 2;
/// Remaining seconds at which the timer turns red
const LOW_TIME_SECS: u32 = 10;

const PARTICLE_COLORS: [Color; 7] = [
    Color::Yellow,
    Color::Magenta,
    Color::Cyan,
    Color::Green,
    Color::Red,
    Color::Blue,
    Color::LightYellow,
];

fn screen_layout(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(3), // score / time / best
            Constraint::Min(3),    // board
            Constraint::Length(1), // difficulty selector
            Constraint::Length(1), // legend
        ])
        .split(area)
}

/// Region of the screen holding the holes
pub fn board_area(area: Rect) -> Rect {
    screen_layout(area)[1]
}

/// Near-square grid of `count` holes filling `board`, row by row
pub fn hole_areas(board: Rect, count: usize) -> Vec<Rect> {
    if count == 0 {
        return Vec::new();
    }
    let cols = (count as f64).sqrt().ceil() as usize;
    let rows = count.div_ceil(cols);

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
        .split(board);

    row_areas
        .iter()
        .flat_map(|row| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![Constraint::Ratio(1, cols as u32); cols])
                .split(*row)
                .to_vec()
        })
        .take(count)
        .collect()
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

fn shifted(rect: Rect, dx: i16, bounds: Rect) -> Rect {
    let x = match dx {
        d if d > 0 && rect.right() < bounds.right() => rect.x + 1,
        d if d < 0 && rect.x > bounds.x => rect.x - 1,
        _ => rect.x,
    };
    Rect { x, ..rect }
}

fn center_of(rect: Rect) -> (u16, u16) {
    (rect.x + rect.width / 2, rect.y + rect.height / 2)
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let snapshot = self.game.snapshot();
        let sink = self.sink();
        let chunks = screen_layout(area);

        render_header(&snapshot, chunks[0], buf);

        let board = shifted(chunks[1], sink.effects.shake_offset(), area);
        let holes = hole_areas(board, snapshot.slots.len());
        for (slot, hole) in holes.iter().enumerate() {
            render_hole(
                slot,
                snapshot.slots[slot],
                sink.effects.is_flashing(slot),
                *hole,
                buf,
            );
        }

        render_difficulty(snapshot.difficulty, sink.controls_enabled, chunks[2], buf);
        render_legend(snapshot.phase, chunks[3], buf);

        render_particles(&sink.effects, &holes, area, buf, |a| a != Anchor::Screen);
        render_popups(&sink.effects, &holes, area, buf);

        if snapshot.phase == Phase::Paused {
            let banner = centered(chunks[1], 30, 3);
            Clear.render(banner, buf);
            Paragraph::new(Span::styled(
                "PAUSED",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::ITALIC),
            ))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL))
            .render(banner, buf);
        }

        if let Some(summary) = sink.summary {
            let modal = centered(area, 36, 8);
            Clear.render(modal, buf);

            let bold = Style::default().add_modifier(Modifier::BOLD);
            let mut lines = vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("Final score: {}", summary.final_score),
                    bold,
                )),
            ];
            if summary.is_new_record {
                lines.push(Line::from(Span::styled(
                    "NEW RECORD!",
                    bold.fg(Color::Yellow).add_modifier(Modifier::SLOW_BLINK),
                )));
            } else {
                lines.push(Line::from(format!("Best: {}", snapshot.high_score)));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "(enter) play again / (esc)ape",
                Style::default().add_modifier(Modifier::ITALIC),
            )));

            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Double)
                        .title(" Game Over "),
                )
                .render(modal, buf);
        }

        render_particles(&sink.effects, &holes, area, buf, |a| a == Anchor::Screen);
    }
}

fn render_header(snapshot: &Snapshot, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let time_style = if snapshot.time_remaining <= LOW_TIME_SECS {
        bold.fg(Color::Red)
    } else {
        bold
    };

    let line = Line::from(vec![
        Span::styled("SCORE ", Style::default().fg(Color::Gray)),
        Span::styled(snapshot.score.to_string(), bold.fg(Color::Green)),
        Span::raw("    "),
        Span::styled("TIME ", Style::default().fg(Color::Gray)),
        Span::styled(snapshot.time_remaining.to_string(), time_style),
        Span::raw("    "),
        Span::styled("BEST ", Style::default().fg(Color::Gray)),
        Span::styled(snapshot.high_score.to_string(), bold.fg(Color::Cyan)),
    ]);

    Paragraph::new(line)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" whack "))
        .render(area, buf);
}

fn render_hole(slot: usize, view: SlotView, flashing: bool, area: Rect, buf: &mut Buffer) {
    let border_style = if flashing {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else if view == SlotView::Up {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border_style)
        .title(format!(" {} ", slot + 1));
    let inner = block.inner(area);
    block.render(area, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let (text, style) = match view {
        SlotView::Up => (
            "(o_o)",
            Style::default()
                .fg(Color::LightYellow)
                .add_modifier(Modifier::BOLD),
        ),
        SlotView::Whacked => (
            "(x_x)",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
        SlotView::Empty => ("_____", Style::default().add_modifier(Modifier::DIM)),
    };
    let row = Rect {
        y: inner.y + inner.height / 2,
        height: 1,
        ..inner
    };
    Paragraph::new(Span::styled(text, style))
        .alignment(Alignment::Center)
        .render(row, buf);
}

fn render_difficulty(selected: Difficulty, enabled: bool, area: Rect, buf: &mut Buffer) {
    let base = if enabled {
        Style::default()
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };

    let mut spans = vec![Span::styled("difficulty: ", base.fg(Color::Gray))];
    for d in Difficulty::ALL {
        let style = if d == selected {
            base.add_modifier(Modifier::BOLD | Modifier::REVERSED)
        } else {
            base
        };
        spans.push(Span::styled(format!(" {d} "), style));
    }
    if !enabled {
        spans.push(Span::styled(" (locked)", base.add_modifier(Modifier::ITALIC)));
    }

    Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_legend(phase: Phase, area: Rect, buf: &mut Buffer) {
    let entries: &[&str] = match phase {
        Phase::Idle => &["(space) start", "(e/m/h/d) difficulty", "(esc)ape"],
        Phase::Running => &["(1-9/click) whack", "(space) pause", "(r)eset", "(esc)ape"],
        Phase::Paused => &["(space) resume", "(r)eset", "(esc)ape"],
        Phase::Ended => &["(enter) play again", "(r)eset", "(e/m/h/d) difficulty", "(esc)ape"],
    };

    Paragraph::new(Span::styled(
        entries.iter().join(" / "),
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(area, buf);
}

fn render_particles(
    effects: &Effects,
    holes: &[Rect],
    area: Rect,
    buf: &mut Buffer,
    layer: impl Fn(Anchor) -> bool,
) {
    for particle in effects.particles.iter().filter(|p| layer(p.anchor)) {
        let origin = match particle.anchor {
            Anchor::Hole(slot) => match holes.get(slot) {
                Some(hole) => center_of(*hole),
                None => continue,
            },
            Anchor::Screen => center_of(area),
        };
        let x = origin.0 as f64 + particle.x;
        let y = origin.1 as f64 + particle.y;
        if x < area.x as f64 || y < area.y as f64 {
            continue;
        }
        let (x, y) = (x as u16, y as u16);
        if x >= area.right() || y >= area.bottom() {
            continue;
        }

        let color = PARTICLE_COLORS[particle.color_index % PARTICLE_COLORS.len()];
        let alpha = particle.alpha();
        let style = if alpha > 0.7 {
            Style::default().fg(color).add_modifier(Modifier::BOLD)
        } else if alpha > 0.3 {
            Style::default().fg(color)
        } else {
            Style::default().fg(color).add_modifier(Modifier::DIM)
        };

        if let Some(cell) = buf.cell_mut((x, y)) {
            cell.set_symbol(&particle.symbol.to_string());
            cell.set_style(style);
        }
    }
}

fn render_popups(effects: &Effects, holes: &[Rect], area: Rect, buf: &mut Buffer) {
    for popup in &effects.popups {
        let Some(hole) = holes.get(popup.slot) else {
            continue;
        };
        let (cx, cy) = center_of(*hole);
        let width = popup.text.width() as u16;
        let x = cx.saturating_sub(width / 2).max(area.x);
        let y = cy.saturating_sub(popup.rise()).max(area.y);
        if x + width <= area.right() && y < area.bottom() {
            buf.set_string(
                x,
                y,
                &popup.text,
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::high_score::MemoryHighScoreStore;
    use crate::input::Command;
    use crate::presentation::PresentationSink;
    use crate::random::StdRandom;
    use std::time::Duration;

    fn create_test_app(best: u32) -> App {
        App::new(
            Config::default(),
            Box::new(MemoryHighScoreStore::with_score(best)),
            StdRandom::seeded(21),
        )
    }

    fn render_to_string(app: &App, area: Rect) -> String {
        let mut buffer = Buffer::empty(area);
        app.render(area, &mut buffer);
        buffer
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_idle_screen_shows_counters_and_holes() {
        let app = create_test_app(70);
        let rendered = render_to_string(&app, Rect::new(0, 0, 80, 24));

        assert!(rendered.contains("SCORE"));
        assert!(rendered.contains("TIME"));
        assert!(rendered.contains("BEST 70"));
        assert!(rendered.contains(" 9 "));
        assert!(rendered.contains("(space) start"));
        assert!(!rendered.contains("(o_o)"));
    }

    #[test]
    fn test_running_screen_shows_mole() {
        let mut app = create_test_app(0);
        app.handle_command(Command::Start);
        let rendered = render_to_string(&app, Rect::new(0, 0, 80, 24));

        assert!(rendered.contains("(o_o)"));
        assert!(rendered.contains("(locked)"));
    }

    #[test]
    fn test_hit_renders_whacked_mole_and_popup() {
        let mut app = create_test_app(0);
        app.handle_command(Command::Start);
        let slot = app.game.active_target().unwrap();
        app.handle_command(Command::Hit(slot));
        // the burst starts on top of the mole
        app.game.sink_mut().effects.particles.clear();
        let rendered = render_to_string(&app, Rect::new(0, 0, 80, 24));

        assert!(rendered.contains("(x_x)"));
        assert!(rendered.contains("+10"));
    }

    #[test]
    fn test_paused_banner() {
        let mut app = create_test_app(0);
        app.handle_command(Command::Start);
        app.handle_command(Command::TogglePause);
        let rendered = render_to_string(&app, Rect::new(0, 0, 80, 24));
        assert!(rendered.contains("PAUSED"));
        assert!(!rendered.contains("(o_o)"));
    }

    #[test]
    fn test_game_over_modal() {
        let mut app = create_test_app(50);
        app.handle_command(Command::Start);
        app.on_tick(Duration::from_secs(30));
        let rendered = render_to_string(&app, Rect::new(0, 0, 80, 24));

        assert!(rendered.contains("Game Over"));
        assert!(rendered.contains("Final score: 0"));
        assert!(rendered.contains("Best: 50"));
    }

    #[test]
    fn test_new_record_modal() {
        let mut app = create_test_app(0);
        app.game.sink_mut().play_end_feedback(60, true);
        let rendered = render_to_string(&app, Rect::new(0, 0, 80, 24));
        assert!(rendered.contains("NEW RECORD!"));
    }

    #[test]
    fn test_hole_areas_tile_the_board() {
        let board = Rect::new(2, 3, 60, 18);
        let holes = hole_areas(board, 9);
        assert_eq!(holes.len(), 9);
        for (i, a) in holes.iter().enumerate() {
            assert!(board.contains(a.as_position()), "hole {i} outside board");
            for b in holes.iter().skip(i + 1) {
                assert!(!a.intersects(*b), "{a:?} overlaps {b:?}");
            }
        }
        // row-major: first three share a row
        assert_eq!(holes[0].y, holes[2].y);
        assert!(holes[3].y > holes[0].y);
    }

    #[test]
    fn test_hole_areas_uneven_counts() {
        let board = Rect::new(0, 0, 40, 20);
        assert_eq!(hole_areas(board, 1), vec![board]);
        assert_eq!(hole_areas(board, 5).len(), 5);
        assert!(hole_areas(board, 0).is_empty());
    }

    #[test]
    fn test_tiny_and_odd_sizes_do_not_panic() {
        let mut app = create_test_app(0);
        app.handle_command(Command::Start);
        let slot = app.game.active_target().unwrap();
        app.handle_command(Command::Hit(slot));
        app.game.sink_mut().play_end_feedback(10, true);

        for (w, h) in [(1, 1), (10, 5), (20, 8), (200, 60), (80, 3)] {
            let area = Rect::new(0, 0, w, h);
            let mut buffer = Buffer::empty(area);
            app.render(area, &mut buffer);
        }
    }

    #[test]
    fn test_centered_clamps_to_area() {
        let area = Rect::new(5, 5, 10, 4);
        let r = centered(area, 30, 8);
        assert_eq!(r, area);
        let r = centered(Rect::new(0, 0, 20, 10), 10, 4);
        assert_eq!(r, Rect::new(5, 3, 10, 4));
    }

    #[test]
    fn test_shifted_stays_in_bounds() {
        let bounds = Rect::new(0, 0, 20, 10);
        let full = Rect::new(0, 0, 20, 10);
        assert_eq!(shifted(full, 1, bounds), full);
        assert_eq!(shifted(full, -1, bounds), full);
        let inner = Rect::new(2, 0, 10, 10);
        assert_eq!(shifted(inner, 1, bounds).x, 3);
        assert_eq!(shifted(inner, -1, bounds).x, 1);
    }
}
