use crate::model::{Vec2, CELL_H_PX, CELL_W_PX, HUD_ROWS};
use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use std::time::Duration;

/// One decoded player intent per terminal event. Pointer intents carry a
/// simulation-space position; clicks on the HUD rows never reach the tank.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Intent {
    PointerDown(Vec2),
    PointerMove(Vec2),
    PointerUp,
    TogglePlay,
    Clean,
    Lights,
    ToggleMute,
    Resize(u16, u16),
    Redraw,
    Quit,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<Intent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        match event::read()? {
            Event::Key(k) => {
                if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat {
                    if let Some(intent) = map_key(k.code, k.modifiers) {
                        out.push(intent);
                    }
                }
            }
            Event::Mouse(m) => {
                if let Some(intent) = map_mouse(m) {
                    out.push(intent);
                }
            }
            Event::Resize(cols, rows) => out.push(Intent::Resize(cols, rows)),
            _ => {}
        }
        if out.len() >= 64 {
            break;
        }
    }
    Ok(out)
}

fn map_key(key: KeyCode, mods: KeyModifiers) -> Option<Intent> {
    if matches!(key, KeyCode::Char('c') | KeyCode::Char('C'))
        && mods.contains(KeyModifiers::CONTROL)
    {
        return Some(Intent::Quit);
    }
    match key {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Intent::Quit),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(Intent::TogglePlay),
        KeyCode::Char('c') | KeyCode::Char('C') => Some(Intent::Clean),
        KeyCode::Char('l') | KeyCode::Char('L') => Some(Intent::Lights),
        KeyCode::Char('m') | KeyCode::Char('M') => Some(Intent::ToggleMute),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Intent::Redraw),
        _ => None,
    }
}

fn map_mouse(m: MouseEvent) -> Option<Intent> {
    match m.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            cell_to_sim(m.column, m.row).map(Intent::PointerDown)
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            cell_to_sim(m.column, m.row).map(Intent::PointerMove)
        }
        MouseEventKind::Up(MouseButton::Left) => Some(Intent::PointerUp),
        _ => None,
    }
}

/// Map a terminal cell to the middle of its simulation-space footprint.
/// Returns None on the HUD rows.
fn cell_to_sim(col: u16, row: u16) -> Option<Vec2> {
    let tank_row = row.checked_sub(HUD_ROWS)?;
    Some(Vec2::new(
        (col as f32 + 0.5) * CELL_W_PX,
        (tank_row as f32 + 0.5) * CELL_H_PX,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hud_rows_swallow_clicks() {
        assert!(cell_to_sim(10, 0).is_none());
        assert!(cell_to_sim(10, 1).is_none());
        assert!(cell_to_sim(10, 2).is_some());
    }

    #[test]
    fn cell_maps_to_its_center() {
        let p = cell_to_sim(0, HUD_ROWS).unwrap();
        assert_eq!(p, Vec2::new(CELL_W_PX / 2.0, CELL_H_PX / 2.0));
        let p = cell_to_sim(9, HUD_ROWS + 3).unwrap();
        assert_eq!(p, Vec2::new(9.5 * CELL_W_PX, 3.5 * CELL_H_PX));
    }

    #[test]
    fn quit_keys() {
        assert_eq!(map_key(KeyCode::Char('q'), KeyModifiers::NONE), Some(Intent::Quit));
        assert_eq!(map_key(KeyCode::Esc, KeyModifiers::NONE), Some(Intent::Quit));
        assert_eq!(
            map_key(KeyCode::Char('c'), KeyModifiers::CONTROL),
            Some(Intent::Quit)
        );
        assert_eq!(
            map_key(KeyCode::Char('c'), KeyModifiers::NONE),
            Some(Intent::Clean)
        );
    }
}
