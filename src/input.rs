use crate::app::Screen;
use crate::model::Vec2;
use crate::render::FieldView;
use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum InputEvent {
    Key { key: KeyCode, mods: KeyModifiers },
    Mouse { kind: MouseEventKind, col: u16, row: u16 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Action {
    Quit,
    Back,
    Start,
    Slot(usize),
    PlaceInFront,
    PointerDown(Vec2),
    PointerDrag(Vec2),
    PointerUp,
}

pub(crate) fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat => {
                out.push(InputEvent::Key {
                    key: k.code,
                    mods: k.modifiers,
                });
            }
            Event::Mouse(m) => out.push(InputEvent::Mouse {
                kind: m.kind,
                col: m.column,
                row: m.row,
            }),
            _ => {}
        }
        if out.len() >= 64 {
            break;
        }
    }
    Ok(out)
}

pub(crate) fn map_event_to_action(
    screen: &Screen,
    view: &FieldView,
    ev: InputEvent,
) -> Option<Action> {
    match ev {
        InputEvent::Key { key, mods } => map_key(screen, key, mods),
        InputEvent::Mouse { kind, col, row } => {
            let p = view.to_world(col, row);
            match (screen, kind) {
                (Screen::Home, MouseEventKind::Down(_)) => Some(Action::Start),
                (Screen::Game(_), MouseEventKind::Down(MouseButton::Left)) => {
                    Some(Action::PointerDown(p))
                }
                (Screen::Game(_), MouseEventKind::Drag(MouseButton::Left)) => {
                    Some(Action::PointerDrag(p))
                }
                (Screen::Game(_), MouseEventKind::Up(MouseButton::Left)) => Some(Action::PointerUp),
                _ => None,
            }
        }
    }
}

fn map_key(screen: &Screen, key: KeyCode, mods: KeyModifiers) -> Option<Action> {
    // raw mode swallows SIGINT
    if key == KeyCode::Char('c') && mods.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }
    match key {
        KeyCode::Char('q') | KeyCode::Char('Q') => return Some(Action::Quit),
        KeyCode::Esc => return Some(Action::Back),
        _ => {}
    }

    match screen {
        Screen::Home => Some(Action::Start),
        Screen::Game(_) => match key {
            KeyCode::Char(d @ '1'..='4') => Some(Action::Slot(d as usize - '1' as usize)),
            KeyCode::Char('f') | KeyCode::Char('F') | KeyCode::Enter => Some(Action::PlaceInFront),
            _ => None,
        },
    }
}
