//! Keyboard shortcut registry.

use crate::input::{Key, KeyEvent};

/// Arrow-key nudge direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeDirection {
    Up,
    Down,
    Left,
    Right,
}

impl NudgeDirection {
    /// Unit step in canvas axes.
    pub fn unit(self) -> (f64, f64) {
        match self {
            NudgeDirection::Up => (0.0, -1.0),
            NudgeDirection::Down => (0.0, 1.0),
            NudgeDirection::Left => (-1.0, 0.0),
            NudgeDirection::Right => (1.0, 0.0),
        }
    }
}

/// Canvas command triggered from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    SelectAll,
    DeleteSelected,
    DuplicateSelected,
    Group,
    Ungroup,
    /// Abort the current gesture, or clear the selection when idle.
    Cancel,
    Nudge { direction: NudgeDirection, large: bool },
    ZoomIn,
    ZoomOut,
    ResetZoom,
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: Key,
    /// Ctrl, or Cmd on macOS.
    pub command: bool,
    pub shift: bool,
    pub action: Command,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(
        key: Key,
        command: bool,
        shift: bool,
        action: Command,
        description: &'static str,
    ) -> Self {
        Self {
            key,
            command,
            shift,
            action,
            description,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+Shift+G").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.command {
            parts.push("Ctrl".to_string());
        }
        if self.shift {
            parts.push("Shift".to_string());
        }
        parts.push(match self.key {
            Key::Char(c) => c.to_ascii_uppercase().to_string(),
            other => format!("{other:?}"),
        });
        parts.join("+")
    }

    fn matches(&self, event: &KeyEvent) -> bool {
        self.key == event.key
            && self.command == event.modifiers.command()
            && self.shift == event.modifiers.shift
    }
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    pub fn all() -> Vec<Shortcut> {
        use Command::*;
        use NudgeDirection::*;

        let mut shortcuts = vec![
            Shortcut::new(Key::Char('a'), true, false, SelectAll, "Select all items"),
            Shortcut::new(Key::Char('d'), true, false, DuplicateSelected, "Duplicate selection"),
            Shortcut::new(Key::Char('g'), true, false, Group, "Group selected items"),
            Shortcut::new(Key::Char('g'), true, true, Ungroup, "Ungroup selected items"),
            Shortcut::new(Key::Delete, false, false, DeleteSelected, "Delete selection"),
            Shortcut::new(Key::Backspace, false, false, DeleteSelected, "Delete selection"),
            Shortcut::new(Key::Escape, false, false, Cancel, "Cancel current action"),
            Shortcut::new(Key::Char('0'), true, false, ResetZoom, "Reset zoom"),
            Shortcut::new(Key::Char('='), true, false, ZoomIn, "Zoom in"),
            Shortcut::new(Key::Char('+'), true, false, ZoomIn, "Zoom in"),
            Shortcut::new(Key::Char('-'), true, false, ZoomOut, "Zoom out"),
        ];
        for (key, direction) in [
            (Key::ArrowUp, Up),
            (Key::ArrowDown, Down),
            (Key::ArrowLeft, Left),
            (Key::ArrowRight, Right),
        ] {
            shortcuts.push(Shortcut::new(
                key,
                false,
                false,
                Nudge { direction, large: false },
                "Nudge selection",
            ));
            shortcuts.push(Shortcut::new(
                key,
                false,
                true,
                Nudge { direction, large: true },
                "Nudge selection further",
            ));
        }
        shortcuts
    }

    /// Command bound to a key press, if any.
    pub fn lookup(event: &KeyEvent) -> Option<Command> {
        Self::all()
            .into_iter()
            .find(|shortcut| shortcut.matches(event))
            .map(|shortcut| shortcut.action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Modifiers;

    #[test]
    fn test_lookup() {
        let ctrl_shift = Modifiers {
            ctrl: true,
            shift: true,
            ..Modifiers::NONE
        };
        assert_eq!(
            ShortcutRegistry::lookup(&KeyEvent::new(Key::Char('g'), Modifiers::CTRL)),
            Some(Command::Group)
        );
        assert_eq!(
            ShortcutRegistry::lookup(&KeyEvent::new(Key::Char('g'), ctrl_shift)),
            Some(Command::Ungroup)
        );
        assert_eq!(
            ShortcutRegistry::lookup(&KeyEvent::new(Key::ArrowLeft, Modifiers::SHIFT)),
            Some(Command::Nudge {
                direction: NudgeDirection::Left,
                large: true
            })
        );
        assert_eq!(
            ShortcutRegistry::lookup(&KeyEvent::new(Key::Char('g'), Modifiers::NONE)),
            None
        );
    }

    #[test]
    fn test_meta_acts_as_command() {
        let meta = Modifiers {
            meta: true,
            ..Modifiers::NONE
        };
        assert_eq!(
            ShortcutRegistry::lookup(&KeyEvent::new(Key::Char('a'), meta)),
            Some(Command::SelectAll)
        );
    }

    #[test]
    fn test_format() {
        let shortcut = Shortcut::new(Key::Char('g'), true, true, Command::Ungroup, "");
        assert_eq!(shortcut.format(), "Ctrl+Shift+G");
        let shortcut = Shortcut::new(Key::Escape, false, false, Command::Cancel, "");
        assert_eq!(shortcut.format(), "Escape");
    }
}
