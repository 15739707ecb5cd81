use coach_widget::Mode;

/// One line of user input: either a slash command or a chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Say(String),
    Command(Command),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Domain,
    Counterpart,
    Mode(Option<Mode>),
    Scoring(Option<bool>),
    Brief,
    Reset,
    Quit,
    Unknown(String),
}

pub const HELP: &str = "\
/domain              pick a therapeutic area
/counterpart         pick who you are talking to
/mode [roleplay|coach]
/scoring [on|off]    toggle turn scoring
/brief               show the scenario brief
/reset               start the conversation over
/quit                leave";

pub fn parse(line: &str) -> Input {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Input::Say(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default().to_ascii_lowercase();
    let arg = parts.next();

    let command = match name.as_str() {
        "help" | "?" => Command::Help,
        "domain" | "area" => Command::Domain,
        "counterpart" | "persona" => Command::Counterpart,
        "mode" => match arg.map(str::parse::<Mode>) {
            None => Command::Mode(None),
            Some(Ok(mode)) => Command::Mode(Some(mode)),
            Some(Err(_)) => Command::Unknown(line.to_string()),
        },
        "scoring" | "score" => match arg.map(|a| a.to_ascii_lowercase()) {
            None => Command::Scoring(None),
            Some(a) if a == "on" => Command::Scoring(Some(true)),
            Some(a) if a == "off" => Command::Scoring(Some(false)),
            Some(_) => Command::Unknown(line.to_string()),
        },
        "brief" => Command::Brief,
        "reset" | "clear" => Command::Reset,
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    };
    Input::Command(command)
}
