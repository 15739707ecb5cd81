use coach_widget::{Dimension, Session, TurnScore, WidgetMessage};
use console::style;

pub fn message(speaker: &str, msg: &WidgetMessage) -> String {
    match msg {
        WidgetMessage::Assistant(text) if text.trim().is_empty() => {
            format!("{} {}", style(format!("{speaker}:")).cyan().bold(), style("(no reply)").dim())
        }
        WidgetMessage::Assistant(text) => {
            format!("{} {}", style(format!("{speaker}:")).cyan().bold(), text.trim())
        }
        WidgetMessage::UpstreamError(notice) => style(notice).red().to_string(),
        WidgetMessage::Score(score) => turn_score(score),
        WidgetMessage::ComplianceRisk(notice) => {
            style(format!(" {notice} ")).white().on_red().bold().to_string()
        }
        WidgetMessage::Unscored(notice) => style(notice).dim().italic().to_string(),
    }
}

fn turn_score(score: &TurnScore) -> String {
    let mut lines = vec![style(format!(
        "Score {:.1}/10  ·  average {:.1} over {} turn{}",
        score.score,
        score.average,
        score.turns,
        if score.turns == 1 { "" } else { "s" }
    ))
    .yellow()
    .bold()
    .to_string()];

    let breakdown = Dimension::ALL
        .iter()
        .map(|d| format!("{} {}", d.name(), score.rubric.get(*d)))
        .collect::<Vec<_>>()
        .join("  ");
    lines.push(style(breakdown).dim().to_string());

    if let Some(ref feedback) = score.feedback {
        lines.push(style(feedback).italic().to_string());
    }
    lines.join("\n")
}

pub fn status(session: &Session, counterpart: Option<&str>) -> String {
    let selection = session.selection();
    format!(
        "{} · {} · {} · scoring {}",
        style(&selection.domain).bold(),
        counterpart.unwrap_or("no counterpart"),
        session.mode(),
        if session.scoring_enabled() { "on" } else { "off" }
    )
}
