use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::editor::{Editor, Mode, Request};

/// Apply a terminal event to the editor. Returns a request when the event asks
/// for something only the playground can do.
pub fn handle_event(editor: &mut Editor, event: Event) -> Option<Request> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => {
            // Clear any message on keypress
            editor.clear_message();
            handle_key(editor, key)
        }
        Event::Paste(text) if editor.mode == Mode::Insert => {
            editor.insert_text(&text);
            None
        }
        // Resize is handled by the renderer
        _ => None,
    }
}

fn handle_key(editor: &mut Editor, key: KeyEvent) -> Option<Request> {
    // F5 and Ctrl-R run the buffer from any mode
    if key.code == KeyCode::F(5)
        || (key.code == KeyCode::Char('r') && key.modifiers.contains(KeyModifiers::CONTROL))
    {
        return Some(Request::Run);
    }

    match editor.mode {
        Mode::Normal => handle_normal_mode(editor, key),
        Mode::Insert => handle_insert_mode(editor, key),
        Mode::Command => return handle_command_mode(editor, key),
    }
    None
}

fn handle_normal_mode(editor: &mut Editor, key: KeyEvent) {
    match key.code {
        // Quick quit with Ctrl-C
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            editor.quit();
        }

        // Basic movement
        KeyCode::Char('h') | KeyCode::Left => editor.move_left(),
        KeyCode::Char('j') | KeyCode::Down => editor.move_down(),
        KeyCode::Char('k') | KeyCode::Up => editor.move_up(),
        KeyCode::Char('l') | KeyCode::Right => editor.move_right(),

        // Line motions
        KeyCode::Char('0') | KeyCode::Home => editor.move_to_line_start(),
        KeyCode::Char('$') | KeyCode::End => editor.move_to_line_end(),
        KeyCode::Char('g') => editor.move_to_first_line(),
        KeyCode::Char('G') => editor.move_to_last_line(),

        // Word motions
        KeyCode::Char('w') => editor.move_word_forward(),
        KeyCode::Char('b') => editor.move_word_backward(),

        // Jump to the syntax error
        KeyCode::Char('E') => {
            if let Some(annotation) = editor.annotations().first().cloned() {
                editor.jump_to(&annotation);
            }
        }

        // Deletion
        KeyCode::Char('x') => editor.delete_char_under_cursor(),
        KeyCode::Char('D') => editor.delete_line(),

        // Insert mode entry
        KeyCode::Char('i') => editor.enter_insert_mode(),
        KeyCode::Char('a') => editor.append(),
        KeyCode::Char('A') => editor.append_end_of_line(),
        KeyCode::Char('o') => editor.open_line_below(),
        KeyCode::Char('O') => editor.open_line_above(),

        // Command mode
        KeyCode::Char(':') => editor.enter_command_mode(),

        _ => {}
    }
}

fn handle_insert_mode(editor: &mut Editor, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => editor.enter_normal_mode(),
        KeyCode::Char(c) => editor.insert_char(c),
        KeyCode::Tab => editor.insert_tab(),
        KeyCode::Backspace => editor.delete_char_backward(),
        KeyCode::Enter => editor.insert_newline(),

        KeyCode::Left => editor.move_left(),
        KeyCode::Right => editor.move_right(),
        KeyCode::Up => editor.move_up(),
        KeyCode::Down => editor.move_down(),

        _ => {}
    }
}

fn handle_command_mode(editor: &mut Editor, key: KeyEvent) -> Option<Request> {
    match key.code {
        KeyCode::Esc => {
            editor.command_buffer.clear();
            editor.enter_normal_mode();
        }

        KeyCode::Enter => return editor.execute_command(),

        KeyCode::Backspace => {
            editor.command_buffer.pop();
            if editor.command_buffer.is_empty() {
                editor.enter_normal_mode();
            }
        }

        KeyCode::Char(c) => editor.command_buffer.push(c),

        _ => {}
    }
    None
}
