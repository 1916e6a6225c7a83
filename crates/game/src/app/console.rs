use std::collections::HashMap;

use engine::Verb;

/// A fully parsed console line, ready for the session.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GameCommand {
    Help,
    /// `look` with no target describes the current scene.
    Describe,
    Act {
        verb: Verb,
        target: String,
    },
    ActWith {
        verb: Verb,
        target: String,
        item: String,
    },
    Click {
        x: f32,
        y: f32,
        verb: Verb,
        item: Option<String>,
    },
    Inventory,
    Scroll {
        delta: isize,
    },
    Scene {
        id: String,
    },
    /// Handled by the console loop, which owns the locale.
    Language {
        code: String,
    },
    Debug,
    Save,
    Load,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CommandParseError {
    pub(crate) reason: String,
    pub(crate) usage: String,
}

impl CommandParseError {
    fn new(reason: impl Into<String>, usage: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            usage: usage.into(),
        }
    }
}

type ParseFn = dyn Fn(&[String]) -> Result<GameCommand, CommandParseError> + Send + Sync;

pub(crate) struct CommandSpec {
    name: String,
    help: String,
    arg_schema: String,
    parse: Box<ParseFn>,
}

pub(crate) struct ConsoleCommandRegistry {
    specs: Vec<CommandSpec>,
    lookup_by_lower_name: HashMap<String, usize>,
}

impl ConsoleCommandRegistry {
    pub(crate) fn new() -> Self {
        Self {
            specs: Vec::new(),
            lookup_by_lower_name: HashMap::new(),
        }
    }

    pub(crate) fn with_game_commands() -> Self {
        let mut registry = Self::new();
        registry.push_spec("help", "List commands", "", |args| {
            require_no_args(args, "help")?;
            Ok(GameCommand::Help)
        });
        registry.push_spec(
            "look",
            "Describe the scene, or look at something",
            "[id]",
            parse_look_command,
        );
        for verb in [
            Verb::Take,
            Verb::Open,
            Verb::Close,
            Verb::Push,
            Verb::Pull,
            Verb::TalkTo,
            Verb::Give,
            Verb::Enter,
        ] {
            registry.push_spec(
                verb.token(),
                format!("{} something", verb.token()),
                "<id>",
                move |args| parse_target_command(verb, args),
            );
        }
        registry.push_spec(
            "unlock",
            "Unlock a door with a held key",
            "<door> <key>",
            |args| parse_target_with_item(Verb::Unlock, args, "unlock <door> <key>"),
        );
        registry.push_spec("lock", "Lock a closed door", "<door>", |args| {
            parse_target_command(Verb::Lock, args)
        });
        registry.push_spec(
            "use",
            "Use a held item on something",
            "<item> <target>",
            parse_use_command,
        );
        registry.push_spec(
            "click",
            "Act on whatever is at a scene position",
            "<x:f32> <y:f32> <verb> [item]",
            parse_click_command,
        );
        registry.push_spec("inventory", "List held items", "", |args| {
            require_no_args(args, "inventory")?;
            Ok(GameCommand::Inventory)
        });
        registry.push_spec(
            "scroll",
            "Scroll the inventory window",
            "<delta:isize>",
            parse_scroll_command,
        );
        registry.push_spec("scene", "Jump to a scene", "<scene_id>", |args| {
            let [id] = args else {
                return Err(CommandParseError::new(
                    "expected exactly one argument <scene_id>",
                    "scene <scene_id>",
                ));
            };
            Ok(GameCommand::Scene { id: id.clone() })
        });
        registry.push_spec("lang", "Switch the message language", "<code>", |args| {
            let [code] = args else {
                return Err(CommandParseError::new(
                    "expected exactly one argument <code>",
                    "lang <code>",
                ));
            };
            Ok(GameCommand::Language {
                code: code.to_ascii_lowercase(),
            })
        });
        registry.push_spec("debug", "Dump entity boxes and draw order", "", |args| {
            require_no_args(args, "debug")?;
            Ok(GameCommand::Debug)
        });
        registry.push_spec("save", "Save progress", "", |args| {
            require_no_args(args, "save")?;
            Ok(GameCommand::Save)
        });
        registry.push_spec("load", "Load saved progress", "", |args| {
            require_no_args(args, "load")?;
            Ok(GameCommand::Load)
        });
        registry.push_spec("quit", "Quit the game", "", |args| {
            require_no_args(args, "quit")?;
            Ok(GameCommand::Quit)
        });
        registry
    }

    fn push_spec<F>(
        &mut self,
        name: impl Into<String>,
        help: impl Into<String>,
        arg_schema: impl Into<String>,
        parse: F,
    ) where
        F: Fn(&[String]) -> Result<GameCommand, CommandParseError> + Send + Sync + 'static,
    {
        let name = name.into();
        self.lookup_by_lower_name
            .insert(name.to_ascii_lowercase(), self.specs.len());
        self.specs.push(CommandSpec {
            name,
            help: help.into(),
            arg_schema: arg_schema.into(),
            parse: Box::new(parse),
        });
    }

    pub(crate) fn lookup(&self, input_name: &str) -> Option<&CommandSpec> {
        let index = self
            .lookup_by_lower_name
            .get(&input_name.to_ascii_lowercase())?;
        self.specs.get(*index)
    }

    /// Help lines in registration order.
    pub(crate) fn help_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.specs.iter().map(|spec| {
            if spec.arg_schema.is_empty() {
                format!("{} - {}", spec.name, spec.help)
            } else {
                format!("{} {} - {}", spec.name, spec.arg_schema, spec.help)
            }
        })
    }

    /// Parses one raw line. `Ok(None)` for blank input.
    pub(crate) fn parse_line(&self, raw_line: &str) -> Result<Option<GameCommand>, CommandParseError> {
        let tokens = tokenize_line(raw_line.trim())
            .map_err(|reason| CommandParseError::new(reason, "help"))?;
        let Some((command_name, args)) = tokens.split_first() else {
            return Ok(None);
        };
        let Some(spec) = self.lookup(command_name) else {
            return Err(CommandParseError::new(
                format!("unknown command '{command_name}'"),
                "help",
            ));
        };
        (spec.parse)(args).map(Some)
    }
}

fn tokenize_line(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut pending = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                pending = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if pending {
                    tokens.push(std::mem::take(&mut current));
                    pending = false;
                }
            }
            _ => {
                current.push(ch);
                pending = true;
            }
        }
    }

    if in_quotes {
        return Err("unterminated quoted string".to_string());
    }
    if pending {
        tokens.push(current);
    }
    Ok(tokens)
}

fn require_no_args(args: &[String], usage: &str) -> Result<(), CommandParseError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CommandParseError::new("this command takes no arguments", usage))
    }
}

fn parse_look_command(args: &[String]) -> Result<GameCommand, CommandParseError> {
    match args {
        [] => Ok(GameCommand::Describe),
        [target] => Ok(GameCommand::Act {
            verb: Verb::Look,
            target: target.clone(),
        }),
        _ => Err(CommandParseError::new(
            "expected at most one argument [id]",
            "look [id]",
        )),
    }
}

fn parse_target_command(verb: Verb, args: &[String]) -> Result<GameCommand, CommandParseError> {
    let [target] = args else {
        return Err(CommandParseError::new(
            "expected exactly one argument <id>",
            format!("{} <id>", verb.token()),
        ));
    };
    Ok(GameCommand::Act {
        verb,
        target: target.clone(),
    })
}

fn parse_target_with_item(
    verb: Verb,
    args: &[String],
    usage: &str,
) -> Result<GameCommand, CommandParseError> {
    let [target, item] = args else {
        return Err(CommandParseError::new("expected exactly two arguments", usage));
    };
    Ok(GameCommand::ActWith {
        verb,
        target: target.clone(),
        item: item.clone(),
    })
}

/// `use <item> <target>` names the item first, unlike unlock.
fn parse_use_command(args: &[String]) -> Result<GameCommand, CommandParseError> {
    let [item, target] = args else {
        return Err(CommandParseError::new(
            "expected exactly two arguments",
            "use <item> <target>",
        ));
    };
    Ok(GameCommand::ActWith {
        verb: Verb::Use,
        target: target.clone(),
        item: item.clone(),
    })
}

fn parse_click_command(args: &[String]) -> Result<GameCommand, CommandParseError> {
    const USAGE: &str = "click <x:f32> <y:f32> <verb> [item]";
    let (x, y, verb, item) = match args {
        [x, y, verb] => (x, y, verb, None),
        [x, y, verb, item] => (x, y, verb, Some(item.clone())),
        _ => {
            return Err(CommandParseError::new(
                "expected three or four arguments",
                USAGE,
            ))
        }
    };
    let x = parse_coordinate(x, "x", USAGE)?;
    let y = parse_coordinate(y, "y", USAGE)?;
    let Some(verb) = Verb::from_token(verb) else {
        return Err(CommandParseError::new(format!("unknown verb '{verb}'"), USAGE));
    };
    if verb.needs_item() != item.is_some() {
        let reason = if verb.needs_item() {
            format!("'{}' needs an item", verb.token())
        } else {
            format!("'{}' does not take an item", verb.token())
        };
        return Err(CommandParseError::new(reason, USAGE));
    }
    Ok(GameCommand::Click { x, y, verb, item })
}

fn parse_coordinate(raw: &str, name: &str, usage: &str) -> Result<f32, CommandParseError> {
    match raw.parse::<f32>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(CommandParseError::new(
            format!("invalid {name} '{raw}': expected a finite number"),
            usage,
        )),
    }
}

fn parse_scroll_command(args: &[String]) -> Result<GameCommand, CommandParseError> {
    let [delta] = args else {
        return Err(CommandParseError::new(
            "expected exactly one argument <delta>",
            "scroll <delta:isize>",
        ));
    };
    let delta = delta.parse::<isize>().map_err(|_| {
        CommandParseError::new(
            format!("invalid delta '{delta}': expected an integer"),
            "scroll <delta:isize>",
        )
    })?;
    Ok(GameCommand::Scroll { delta })
}
