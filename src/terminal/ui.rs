use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem as ListRow, Paragraph, Tabs, Wrap},
};

use crate::domain::format_epoch;
use crate::domain::item::{ListItem, RecordRef};
use crate::domain::records::{AttachmentRef, SendStatus};
use crate::mailbox::composer::{Composer, ComposerField};
use crate::mailbox::folder::Folder;
use crate::mailbox::state::{Notice, View};
use crate::terminal::state::{AppState, Focus};

pub fn render(f: &mut Frame, state: &mut AppState) {
    let [tabs_area, search_area, main, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(f.area());

    render_tabs(f, state, tabs_area);
    render_search(f, state, search_area);

    let [left, right] =
        Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(main);
    render_list(f, state, left);

    match state.mailbox.view() {
        View::Composing(c) => render_composer(f, c, right),
        _ => render_detail(f, state, right),
    }

    render_footer(f, state, footer);
}

fn render_tabs(f: &mut Frame, state: &AppState, area: Rect) {
    let p = state.mailbox.partitions();
    let titles: Vec<Line> = Folder::ALL
        .iter()
        .map(|folder| {
            let n = match folder {
                Folder::Inbox => p.unread_inbox(),
                other => p.len(*other),
            };
            Line::from(format!(" {} ({n}) ", folder.label()))
        })
        .collect();
    let tabs = Tabs::new(titles)
        .select(state.mailbox.folder().index())
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(tabs, area);
}

fn render_search(f: &mut Frame, state: &AppState, area: Rect) {
    let focused = state.focus() == Focus::Search;
    let style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let cursor = if focused { "▏" } else { "" };
    let line = Line::from(vec![
        Span::styled(" / ", style),
        Span::raw(state.mailbox.query().to_string()),
        Span::styled(cursor, style),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_list(f: &mut Frame, state: &mut AppState, area: Rect) {
    let border = if state.focus() == Focus::List {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    let visible = state.mailbox.visible();
    let rows: Vec<ListRow> = visible.iter().map(|item| list_row(state, item)).collect();
    let block = Block::default()
        .title(format!(
            " {} · {} ",
            state.mailbox.folder().label(),
            visible.len()
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));

    let list = List::new(rows)
        .block(block)
        .highlight_symbol("➜ ")
        .highlight_style(Style::default().fg(Color::Green));

    f.render_stateful_widget(list, area, &mut state.list_state);
}

fn list_row<'a>(state: &AppState, item: &ListItem<'_>) -> ListRow<'a> {
    let check = if state.mailbox.is_checked(&item.key) {
        "[x] "
    } else {
        "[ ] "
    };
    let title_style = if item.read {
        Style::default()
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let mut head = vec![
        Span::raw(check),
        Span::styled(item.title.clone(), title_style),
    ];
    if item.replied {
        head.push(Span::styled(" ↩", Style::default().fg(Color::Cyan)));
    }
    if item.status == Some(SendStatus::Failed) {
        head.push(Span::styled(" failed", Style::default().fg(Color::Red)));
    }
    if state.mailbox.is_in_flight(&item.key) {
        head.push(Span::styled(" …", Style::default().fg(Color::DarkGray)));
    }

    let sub = Line::from(vec![
        Span::raw("    "),
        Span::styled(item.subtitle.clone(), Style::default().fg(Color::Gray)),
        Span::styled(
            format!("  {}", item.display_date),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    ListRow::new(Text::from(vec![Line::from(head), sub]))
}

fn header<'a>(label: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(value),
    ])
}

fn attachment_lines(items: &[AttachmentRef]) -> Vec<Line<'static>> {
    items
        .iter()
        .map(|a| Line::from(format!("  📎 {} ({})", a.filename, a.path)))
        .collect()
}

fn render_detail(f: &mut Frame, state: &AppState, area: Rect) {
    let block = Block::default()
        .title(" Message ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let width = area.width.saturating_sub(2).max(20) as usize;
    let mut lines: Vec<Line> = Vec::new();

    match state.mailbox.selected_item() {
        None => {
            let p = state.mailbox.partitions();
            lines.push(Line::from("No message selected."));
            lines.push(Line::from(""));
            lines.push(Line::from(format!(
                "{} unread in inbox, {} in trash.",
                p.unread_inbox(),
                p.len(Folder::Trash)
            )));
        }
        Some(item) => match item.record {
            RecordRef::Message(m) => {
                lines.push(header(
                    "From: ",
                    format!("{} <{}>", m.sender_name, m.sender_email),
                ));
                lines.push(header("Date: ", format_epoch(m.received_at)));
                lines.push(header("Subject: ", m.subject.clone()));
                if m.replied {
                    lines.push(Line::from(Span::styled(
                        "Replied",
                        Style::default().fg(Color::Cyan),
                    )));
                }
                lines.extend(attachment_lines(&m.attachments));
                lines.push(Line::from(""));
                lines.extend(m.body.lines().map(|l| Line::from(l.to_string())));
            }
            RecordRef::Sent(s) => {
                lines.push(header("To: ", s.recipient.clone()));
                lines.push(header("Date: ", format_epoch(s.sent_at)));
                lines.push(header("Status: ", s.status.as_str().to_string()));
                if let Some(id) = &s.provider_id {
                    lines.push(header("Provider id: ", id.clone()));
                }
                lines.push(header("Subject: ", s.subject.clone()));
                lines.extend(attachment_lines(&s.attachments));
                lines.push(Line::from(""));
                let text = match html2text::from_read(s.body.as_bytes(), width) {
                    Ok(t) => t,
                    Err(e) => {
                        log::debug!("html2text failed: {e}");
                        s.body.clone()
                    }
                };
                lines.extend(text.lines().map(|l| Line::from(l.to_string())));
            }
            RecordRef::Draft(d) => {
                lines.push(header("To: ", d.recipient.clone()));
                lines.push(header("Updated: ", format_epoch(d.updated_at)));
                lines.push(header("Subject: ", d.subject.clone()));
                lines.push(Line::from(""));
                lines.extend(d.body.lines().map(|l| Line::from(l.to_string())));
            }
        },
    }

    let p = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((state.detail_scroll, 0));
    f.render_widget(p, area);
}

fn render_composer(f: &mut Frame, c: &Composer, area: Rect) {
    let title = match (&c.draft_id, c.sending) {
        (_, true) => " Compose · sending… ",
        (Some(_), false) => " Compose · draft ",
        (None, false) => " Compose ",
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [to, subject, body, attach] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(4),
    ])
    .areas(inner);

    let field_block = |label: &'static str, field: ComposerField| {
        let color = if c.field == field {
            Color::Yellow
        } else {
            Color::DarkGray
        };
        Block::default()
            .title(label)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
    };

    f.render_widget(
        Paragraph::new(c.recipient.as_str()).block(field_block(" To ", ComposerField::To)),
        to,
    );
    f.render_widget(
        Paragraph::new(c.subject.as_str())
            .block(field_block(" Subject ", ComposerField::Subject)),
        subject,
    );
    f.render_widget(
        Paragraph::new(c.body.as_str())
            .wrap(Wrap { trim: false })
            .block(field_block(" Body ", ComposerField::Body)),
        body,
    );

    let mut attach_lines: Vec<Line> = attachment_lines(&c.attachments);
    attach_lines.push(Line::from(format!("+ {}", c.attachment_input)));
    f.render_widget(
        Paragraph::new(attach_lines)
            .block(field_block(" Attachments ", ComposerField::Attachments)),
        attach,
    );
}

fn render_footer(f: &mut Frame, state: &AppState, area: Rect) {
    let line = match state.mailbox.notice() {
        Some(Notice::Error(e)) => Line::from(Span::styled(
            format!(" {e}"),
            Style::default().fg(Color::Red),
        )),
        Some(Notice::Info(msg)) => Line::from(Span::styled(
            format!(" {msg}"),
            Style::default().fg(Color::Green),
        )),
        None => hints(state.focus()),
    };
    f.render_widget(Paragraph::new(line), area);
}

fn hints(focus: Focus) -> Line<'static> {
    let pairs: &[(&str, &str)] = match focus {
        Focus::List => &[
            ("↑/↓", "move"),
            ("c", "compose"),
            ("r", "reply"),
            ("space", "check"),
            ("^a", "all"),
            ("del", "delete"),
            ("m/u", "read/unread"),
            ("z", "restore"),
            ("/", "search"),
            ("tab", "folder"),
            ("q", "quit"),
        ],
        Focus::Search => &[("enter", "keep"), ("esc", "clear")],
        Focus::Composer => &[
            ("tab", "field"),
            ("^s", "save draft"),
            ("^e", "send"),
            ("esc", "close"),
        ],
    };
    let mut spans = Vec::new();
    for (k, label) in pairs {
        spans.push(Span::styled(
            format!(" {k}"),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(" {label} ")));
    }
    Line::from(spans)
}
