use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use engine::Message;
use tracing::{error, info, warn};

use super::bootstrap::AppWiring;
use super::console::{ConsoleCommandRegistry, GameCommand};
use super::locale::{available_languages, Locale, LocaleError};
use super::session::ui_keys;

const PROMPT: &str = "> ";

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(err) = run_console(app, stdin.lock(), stdout.lock()) {
        error!(error = %err, "console_io_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Reads commands line by line until `quit` or end of input.
pub(crate) fn run_console<R: BufRead, W: Write>(
    mut app: AppWiring,
    input: R,
    mut output: W,
) -> io::Result<()> {
    let registry = ConsoleCommandRegistry::with_game_commands();
    write_messages(&mut output, &app.locale, &app.session.describe_scene())?;
    write!(output, "{PROMPT}")?;
    output.flush()?;

    let mut commands_run = 0usize;
    for line in input.lines() {
        let line = line?;
        match registry.parse_line(&line) {
            Ok(None) => {}
            Ok(Some(GameCommand::Help)) => {
                for help in registry.help_lines() {
                    writeln!(output, "{help}")?;
                }
            }
            Ok(Some(GameCommand::Language { code })) => {
                let reply = switch_language(&mut app.locale, &code);
                write_messages(&mut output, &app.locale, &[reply])?;
            }
            Ok(Some(command)) => {
                commands_run += 1;
                let turn = app.session.execute(command);
                write_messages(&mut output, &app.locale, &turn.messages)?;
                if turn.quit {
                    break;
                }
            }
            Err(error) => {
                writeln!(output, "error: {}. usage: {}", error.reason, error.usage)?;
            }
        }
        write!(output, "{PROMPT}")?;
        output.flush()?;
    }

    info!(commands_run, "console_closed");
    output.flush()
}

/// Swaps in the embedded table for `code`; the current table stays on failure.
fn switch_language(locale: &mut Locale, code: &str) -> Message {
    match Locale::embedded(code) {
        Ok(next) => {
            *locale = next;
            info!(language = code, "language_switched");
            Message::new(ui_keys::LANGUAGE_CHANGED)
        }
        Err(error) => {
            if !matches!(error, LocaleError::UnknownLanguage { .. }) {
                warn!(error = %error, "language_switch_failed");
            }
            Message::new(ui_keys::LANGUAGE_UNKNOWN)
                .with_param(code)
                .with_params(available_languages())
        }
    }
}

fn write_messages<W: Write>(output: &mut W, locale: &Locale, messages: &[Message]) -> io::Result<()> {
    for message in messages {
        writeln!(output, "{}", locale.render(message))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use engine::{default_script, Rules};
    use tempfile::TempDir;

    use crate::app::session::Session;
    use super::*;

    fn transcript(input: &str) -> String {
        let temp = TempDir::new().expect("temp");
        let script = default_script();
        let fingerprint = script.fingerprint.clone();
        let app = AppWiring {
            session: Session::new(
                script.into_scene_manager().expect("scenes"),
                Rules::default(),
                fingerprint,
                temp.path().join("slot.json"),
            ),
            locale: Locale::embedded("en").expect("locale"),
        };
        let mut output = Vec::new();
        run_console(app, Cursor::new(input.to_string()), &mut output).expect("run");
        String::from_utf8(output).expect("utf8")
    }

    #[test]
    fn plays_default_hall_from_text_commands() {
        let out = transcript(
            "open door_001\nlook table_001\npush table_001\ntake key_001\nunlock door_001 key_001\nopen door_001\nquit\nlook\n",
        );
        assert!(out.starts_with("== Hall =="), "{out}");
        assert!(out.contains("the oak door is locked."), "{out}");
        assert!(out.contains("Something seems wedged underneath."), "{out}");
        assert!(out.contains("revealing the brass key."), "{out}");
        assert!(out.contains("You pick up the brass key."), "{out}");
        assert!(out.contains("You unlock the oak door."), "{out}");
        assert!(out.contains("You open the oak door."), "{out}");
        assert!(out.contains("Goodbye."), "{out}");
        // Nothing after quit is executed.
        assert_eq!(out.matches("== Hall ==").count(), 1, "{out}");
    }

    #[test]
    fn parse_errors_and_help_are_printed() {
        let out = transcript("fly away\nhelp\ntake\n");
        assert!(out.contains("error: unknown command 'fly'. usage: help"), "{out}");
        assert!(out.contains("help - List commands"), "{out}");
        assert!(out.contains("usage: take <id>"), "{out}");
    }

    #[test]
    fn lang_switches_rendering_mid_session() {
        let out = transcript("lang fr\ninventory\nlang de\nlang en\ninventory\n");
        assert!(out.contains("Langue réglée sur le français."), "{out}");
        assert!(out.contains("Vous ne portez rien."), "{out}");
        assert!(
            out.contains("Aucune langue nommée de. Disponibles : en, fr."),
            "{out}"
        );
        assert!(out.contains("Language set to English."), "{out}");
        assert!(out.contains("You are carrying nothing."), "{out}");
    }

    #[test]
    fn end_of_input_stops_cleanly() {
        let out = transcript("inventory");
        assert!(out.contains("You are carrying nothing."), "{out}");
    }
}
