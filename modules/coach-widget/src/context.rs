use ai_client::Message;

use crate::catalog::CatalogEntry;
use crate::content::SiteContent;
use crate::session::Session;
use crate::types::Mode;

/// Catalog entry for the session's current selection, if any.
pub fn active_counterpart<'a>(content: &'a SiteContent, session: &Session) -> Option<&'a CatalogEntry> {
    let selection = session.selection();
    let id = selection.counterpart.as_deref()?;
    content.catalog.entry(&selection.domain, id)
}

/// Scenario brief for the current selection. `None` when nothing is selected
/// or the brief is blank.
pub fn active_brief<'a>(content: &'a SiteContent, session: &Session) -> Option<&'a str> {
    active_counterpart(content, session)
        .map(|e| e.brief.trim())
        .filter(|b| !b.is_empty())
}

/// Baseline prompt, persona, mode instructions and the scenario brief.
pub fn system_prompt(content: &SiteContent, session: &Session) -> String {
    let mut sections = vec![content.system_prompt.clone(), content.persona.clone()];

    let counterpart = active_counterpart(content, session);
    let domain_label = content
        .catalog
        .domain(&session.selection().domain)
        .map(|d| d.label.as_str());

    sections.push(match (session.mode(), counterpart) {
        (Mode::Roleplay, Some(entry)) => format!(
            "Role-play as {}. Stay in character for the whole conversation, answer as this \
             person would, and never coach or grade the user.",
            entry.label
        ),
        (Mode::Roleplay, None) => "Role-play as a realistic, busy customer. Stay in character \
             for the whole conversation."
            .to_string(),
        (Mode::Coach, _) => "Act as a sales coach. Give concrete, compliant advice the user can \
             apply in their next conversation."
            .to_string(),
    });

    if let Some(label) = domain_label {
        sections.push(format!("Therapeutic area: {label}."));
    }

    if let Some(brief) = active_brief(content, session) {
        sections.push(format!("Scenario brief:\n{brief}"));
    }

    sections
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// System message followed by the session history.
pub fn outgoing_messages(content: &SiteContent, session: &Session) -> Vec<Message> {
    std::iter::once(Message::system(system_prompt(content, session)))
        .chain(session.messages().iter().cloned())
        .collect()
}
