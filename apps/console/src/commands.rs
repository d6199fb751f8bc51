//! Line grammar for the console host.
//!
//! ```text
//! <control> [down|up|leave] [mouse|touch]
//! <control>                 press and let go right away
//! status | help | quit
//! ```

use shared::{
    domain::{Control, InputSource, PointerEvent},
    error::DomainError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Pointer {
        control: Control,
        source: InputSource,
        events: Vec<PointerEvent>,
    },
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  power|short|long                 tap the control
  <control> down|up|leave [touch]  single pointer event (mouse by default)
  status                           show the last status report
  help                             this text
  quit                             stop polling and exit";

/// `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, DomainError> {
    let mut words = line.split_whitespace();
    let Some(first) = words.next() else {
        return Ok(None);
    };

    match first.to_ascii_lowercase().as_str() {
        "status" => return Ok(Some(ConsoleCommand::Status)),
        "help" | "?" => return Ok(Some(ConsoleCommand::Help)),
        "quit" | "exit" => return Ok(Some(ConsoleCommand::Quit)),
        _ => {}
    }

    let control: Control = first.parse()?;
    let events = match words.next() {
        Some(event) => vec![event.parse::<PointerEvent>()?],
        None => vec![PointerEvent::Down, PointerEvent::Up],
    };
    let source = match words.next() {
        Some(source) => source.parse::<InputSource>()?,
        None => InputSource::Mouse,
    };

    Ok(Some(ConsoleCommand::Pointer {
        control,
        source,
        events,
    }))
}
