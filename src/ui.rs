use crate::cache::EntryCache;
use crate::calendar::{readable, CalendarState, DayCell, GridCell, MonthGrid, DAY_NAMES};
use crate::models::{ActivityKind, DateEntry, DrinkingDetails, GamblingDetails};
use std::fmt::Write;

const SLOT_OPEN: &str = "{{slot:";
const SLOT_CLOSE: &str = "}}";
const NOT_PROVIDED: &str = "Not provided";

const DRINKING_LABELS: [&str; 3] = ["Drinks", "Money Spent", "Trigger"];
const GAMBLING_LABELS: [&str; 9] = [
    "Type",
    "Time Spent",
    "Intended to Wager",
    "Actually Wagered",
    "Won/Lost",
    "Drinks While Gambling",
    "Feeling Before",
    "Feeling During",
    "Feeling After",
];

const DRINKING_HINTS: [&str; 3] = [
    "How many drinks you had.",
    "What the drinks cost.",
    "What set it off: people, places, moods.",
];
const GAMBLING_HINTS: [&str; 9] = [
    "Slots, cards, sports betting and so on.",
    "How long you played.",
    "What you planned to spend going in.",
    "What you actually put in.",
    "Net result. Use a negative number for a loss.",
    "Drinks you had while gambling.",
    "How you felt before starting.",
    "How you felt while playing.",
    "How you felt once you stopped.",
];

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Fills every `{{slot:name}}` in `layout` with the matching page fragment.
///
/// Slots without a fragment render empty. Fragments are inserted verbatim and
/// are not scanned for further slots.
pub fn mount(layout: &str, slots: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(layout.len() + slots.iter().map(|(_, s)| s.len()).sum::<usize>());
    let mut rest = layout;
    while let Some(start) = rest.find(SLOT_OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + SLOT_OPEN.len()..];
        let Some(end) = after.find(SLOT_CLOSE) else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let name = after[..end].trim();
        if let Some((_, fragment)) = slots.iter().find(|(slot, _)| *slot == name) {
            out.push_str(fragment);
        }
        rest = &after[end + SLOT_CLOSE.len()..];
    }
    out.push_str(rest);
    out
}

pub fn render_calendar_page(state: &CalendarState, cache: &EntryCache) -> String {
    let grid = state.month_grid(cache);
    let slots = [
        ("title", escape_html(&grid.label)),
        ("nav", render_nav(state, &grid)),
        ("grid", render_grid(state, &grid)),
        ("sidebar", render_sidebar(state, cache)),
        ("modal", render_modal(state, cache)),
        ("script", CALENDAR_SCRIPT.to_string()),
        ("guides", render_guide_links()),
    ];
    mount(BASE_LAYOUT, &slots)
}

fn instructions_href(kind: ActivityKind) -> &'static str {
    match kind {
        ActivityKind::Drinking => "/alcohol_instructions.html",
        ActivityKind::Gambling => "/gambling_instructions.html",
    }
}

fn render_guide_links() -> String {
    let mut html = String::from("<h3>How to log</h3><ul>");
    for kind in ActivityKind::ALL {
        let _ = write!(
            html,
            r#"<li><a href="{}">{} instructions</a></li>"#,
            instructions_href(kind),
            kind.title()
        );
    }
    html.push_str("</ul>");
    html
}

/// Static how-to page for logging one kind of activity.
pub fn render_instructions_page(kind: ActivityKind) -> String {
    let (labels, hints) = match kind {
        ActivityKind::Drinking => (DRINKING_LABELS.as_slice(), DRINKING_HINTS.as_slice()),
        ActivityKind::Gambling => (GAMBLING_LABELS.as_slice(), GAMBLING_HINTS.as_slice()),
    };
    let title = format!("{} Instructions", kind.title());

    let mut body = String::from(r#"<article class="guide"><ol>"#);
    body.push_str("<li>Pick a date on or before today in the calendar.</li>");
    let _ = write!(
        body,
        "<li>Tick <strong>{}</strong> in the editor and fill in what you remember. Every field is optional.</li>",
        kind.title()
    );
    body.push_str("<li>Save. Days with activity are marked on the calendar.</li></ol><dl>");
    for (label, hint) in labels.iter().zip(hints) {
        let _ = write!(body, "<dt>{label}</dt><dd>{hint}</dd>");
    }
    body.push_str("</dl></article>");

    let slots = [
        ("title", escape_html(&title)),
        (
            "nav",
            format!(
                r#"<a class="nav-btn" href="/calendar" aria-label="Back to calendar">&lsaquo;</a><h1 id="monthLabel">{}</h1>"#,
                escape_html(&title)
            ),
        ),
        ("grid", body),
        ("guides", render_guide_links()),
    ];
    mount(BASE_LAYOUT, &slots)
}

fn calendar_href(month: &str, date: Option<&str>) -> String {
    match date {
        Some(date) => format!("/calendar?month={month}&amp;date={date}"),
        None => format!("/calendar?month={month}"),
    }
}

fn render_nav(state: &CalendarState, grid: &MonthGrid) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        r#"<a class="nav-btn" id="prevMonth" href="{}" aria-label="Previous month">&lsaquo;</a>"#,
        calendar_href(&state.month_key(-1), None)
    );
    let _ = write!(html, r#"<h1 id="monthLabel">{}</h1>"#, escape_html(&grid.label));
    if state.can_go_next() {
        let _ = write!(
            html,
            r#"<a class="nav-btn" id="nextMonth" href="{}" aria-label="Next month">&rsaquo;</a>"#,
            calendar_href(&state.month_key(1), None)
        );
    } else {
        html.push_str(
            r#"<span class="nav-btn is-disabled" id="nextMonth" aria-disabled="true">&rsaquo;</span>"#,
        );
    }
    html
}

fn render_grid(state: &CalendarState, grid: &MonthGrid) -> String {
    let mut html = String::from(r#"<div class="weekdays">"#);
    for name in DAY_NAMES {
        let _ = write!(html, "<span>{name}</span>");
    }
    html.push_str(r#"</div><div class="grid" id="calendarGrid">"#);

    let month = state.month_key(0);
    for cell in grid.weeks.iter().flatten() {
        match cell {
            GridCell::Placeholder => html.push_str(r#"<div class="day day--empty"></div>"#),
            GridCell::Day(day) => render_day(&mut html, &month, day),
        }
    }
    html.push_str("</div>");
    html
}

fn render_day(html: &mut String, month: &str, day: &DayCell) {
    let iso = day.date.to_string();
    let mut classes = String::from("day");
    if day.holiday.is_some() {
        classes.push_str(" day--holiday");
    }
    if day.is_today {
        classes.push_str(" day--today");
    }
    if day.is_future {
        classes.push_str(" day--future");
    }
    if day.is_selected {
        classes.push_str(" day--selected");
    }

    let label = readable(day.date);
    if day.is_future {
        let _ = write!(
            html,
            r#"<button type="button" class="{classes}" data-iso="{iso}" aria-label="{label}" disabled>"#
        );
    } else {
        let _ = write!(
            html,
            r#"<a class="{classes}" data-iso="{iso}" aria-label="{label}" href="{}">"#,
            calendar_href(month, Some(&iso))
        );
    }

    let _ = write!(html, r#"<span class="day-number">{}</span>"#, day.day);
    if let Some(holiday) = day.holiday {
        let _ = write!(html, r#"<span class="holiday-label">{}</span>"#, escape_html(holiday));
    }
    if day.drinking || day.gambling {
        html.push_str(r#"<span class="day-marker-row">"#);
        if day.drinking {
            html.push_str(
                r#"<span class="calendar-marker marker-drinking" title="Drinking logged"></span>"#,
            );
        }
        if day.gambling {
            html.push_str(
                r#"<span class="calendar-marker marker-gambling" title="Gambling logged"></span>"#,
            );
        }
        html.push_str("</span>");
    }

    html.push_str(if day.is_future { "</button>" } else { "</a>" });
}

/// The side panel describing the selected day.
pub fn render_sidebar(state: &CalendarState, cache: &EntryCache) -> String {
    let Some(selected) = state.selected else {
        return concat!(
            r#"<h2 id="selectedDateLabel">No date selected</h2>"#,
            r#"<div id="entrySummary"><p class="entry-empty">Select a date to view its entry.</p></div>"#
        )
        .to_string();
    };

    let mut html = format!(
        r#"<h2 id="selectedDateLabel">{}</h2><div id="entrySummary">"#,
        escape_html(&readable(selected))
    );
    let entry = cache.get(selected);
    if !entry.has_any_activity() {
        html.push_str(
            r#"<p class="entry-empty">No activity logged for this date. Click a date on the calendar to add one.</p>"#,
        );
    }
    if let Some(drinking) = &entry.drinking {
        summary_section(&mut html, "Drinking", &DRINKING_LABELS, &drinking.details.values());
    }
    if let Some(gambling) = &entry.gambling {
        summary_section(&mut html, "Gambling", &GAMBLING_LABELS, &gambling.details.values());
    }
    html.push_str("</div>");
    html
}

fn summary_section(html: &mut String, title: &str, labels: &[&str], values: &[Option<&str>]) {
    let _ = write!(
        html,
        r#"<div class="entry-section"><div class="entry-section-title">{title}</div>"#
    );
    for (label, value) in labels.iter().zip(values) {
        let _ = write!(
            html,
            r#"<div class="entry-row"><span class="entry-label">{label}:</span> {}</div>"#,
            escape_html(value.unwrap_or(NOT_PROVIDED))
        );
    }
    html.push_str("</div>");
}

/// The editor for the selected day, pre-filled from its entry. Empty when nothing is selected.
pub fn render_modal(state: &CalendarState, cache: &EntryCache) -> String {
    let Some(selected) = state.selected else {
        return String::new();
    };
    let entry = cache.get(selected);
    let iso = selected.to_string();

    let mut html = String::new();
    let _ = write!(
        html,
        r#"<div id="eventModal" class="modal" style="display: flex"><div class="modal-content">
<button type="button" id="closeModal" class="modal-close" aria-label="Close">&times;</button>
<h2 id="modalDateTitle">Edit Activity for {iso}</h2>
<form id="activityForm" data-date="{iso}">
<div class="activity-toggles">"#
    );
    for kind in ActivityKind::ALL {
        let _ = write!(
            html,
            r#"<label><input type="checkbox" id="activity{title}Toggle" value="{name}"{checked}> {title}</label>"#,
            title = kind.title(),
            name = kind.as_str(),
            checked = if entry.has(kind) { " checked" } else { "" },
        );
    }
    html.push_str("</div>");

    let drinking = entry.drinking.as_ref().map(|d| d.details.clone()).unwrap_or_default();
    let gambling = entry.gambling.as_ref().map(|g| g.details.clone()).unwrap_or_default();
    form_section(
        &mut html,
        ActivityKind::Drinking,
        entry.has(ActivityKind::Drinking),
        &DrinkingDetails::FIELDS,
        &DRINKING_LABELS,
        &drinking.values(),
    );
    form_section(
        &mut html,
        ActivityKind::Gambling,
        entry.has(ActivityKind::Gambling),
        &GamblingDetails::FIELDS,
        &GAMBLING_LABELS,
        &gambling.values(),
    );

    html.push_str(r#"<div class="modal-actions"><button type="submit" class="btn-save">Save</button>"#);
    for kind in ActivityKind::ALL {
        let _ = write!(
            html,
            r#"<button type="button" id="delete{title}Btn" class="btn-delete" data-type="{name}"{disabled}>Delete {name} entry</button>"#,
            title = kind.title(),
            name = kind.as_str(),
            disabled = if entry.has(kind) { "" } else { " disabled" },
        );
    }
    html.push_str("</div></form></div></div>");
    html
}

fn form_section(
    html: &mut String,
    kind: ActivityKind,
    visible: bool,
    fields: &[&str],
    labels: &[&str],
    values: &[Option<&str>],
) {
    let state = if visible { "" } else { " section-hidden section-disabled" };
    let _ = write!(
        html,
        r#"<fieldset id="{name}Section" class="activity-section{state}" data-activity="{name}"{disabled}><legend>{title}</legend>"#,
        name = kind.as_str(),
        title = kind.title(),
        disabled = if visible { "" } else { " disabled" },
    );
    for ((field, label), value) in fields.iter().zip(labels).zip(values) {
        let _ = write!(
            html,
            r#"<label for="{name}-{field}">{label}</label><input id="{name}-{field}" name="{field}" type="text" value="{value}">"#,
            name = kind.as_str(),
            value = escape_html(value.unwrap_or_default()),
        );
    }
    html.push_str("</fieldset>");
}

/// Summary line for an entry, used in logs.
pub fn describe_entry(entry: &DateEntry) -> String {
    match (&entry.drinking, &entry.gambling) {
        (Some(_), Some(_)) => format!("{}: drinking and gambling", entry.date),
        (Some(_), None) => format!("{}: drinking", entry.date),
        (None, Some(_)) => format!("{}: gambling", entry.date),
        (None, None) => format!("{}: nothing logged", entry.date),
    }
}

const BASE_LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Habit Calendar · {{slot:title}}</title>
  <style>
    :root {
      --bg: #f4f1ea;
      --ink: #2b2a28;
      --card: #ffffff;
      --muted: #8b857d;
      --drinking: #c0563b;
      --gambling: #2f6f8f;
      --today: #f2b544;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
    }

    .layout {
      display: grid;
      grid-template-columns: minmax(0, 3fr) minmax(240px, 1fr);
      gap: 24px;
      padding: 24px;
      max-width: 1100px;
      margin: 0 auto;
    }

    .calendar-header {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 12px;
    }

    .nav-btn {
      font-size: 1.6rem;
      text-decoration: none;
      color: var(--ink);
      padding: 4px 14px;
    }

    .nav-btn.is-disabled {
      color: var(--muted);
      opacity: 0.4;
    }

    .weekdays,
    .grid {
      display: grid;
      grid-template-columns: repeat(7, 1fr);
      gap: 6px;
    }

    .weekdays span {
      text-align: center;
      color: var(--muted);
      font-size: 0.85rem;
    }

    .day {
      min-height: 84px;
      background: var(--card);
      border: 1px solid rgba(0, 0, 0, 0.06);
      border-radius: 10px;
      padding: 6px;
      display: flex;
      flex-direction: column;
      gap: 4px;
      color: inherit;
      text-decoration: none;
      font: inherit;
      text-align: left;
    }

    .day--empty {
      background: transparent;
      border: none;
    }

    .day--today {
      border-color: var(--today);
      border-width: 2px;
    }

    .day--selected {
      box-shadow: 0 0 0 3px rgba(47, 111, 143, 0.35);
    }

    .day--future {
      opacity: 0.45;
      cursor: not-allowed;
    }

    .holiday-label {
      font-size: 0.7rem;
      color: var(--muted);
    }

    .day-marker-row {
      display: flex;
      gap: 4px;
      margin-top: auto;
    }

    .calendar-marker {
      width: 10px;
      height: 10px;
      border-radius: 50%;
    }

    .marker-drinking {
      background: var(--drinking);
    }

    .marker-gambling {
      background: var(--gambling);
    }

    .sidebar {
      background: var(--card);
      border-radius: 14px;
      padding: 18px;
    }

    .entry-empty {
      color: var(--muted);
    }

    .entry-section-title {
      font-weight: 600;
      margin: 12px 0 6px;
    }

    .entry-label {
      color: var(--muted);
    }

    .modal {
      position: fixed;
      inset: 0;
      background: rgba(0, 0, 0, 0.4);
      align-items: center;
      justify-content: center;
    }

    .modal-content {
      background: var(--card);
      border-radius: 14px;
      padding: 22px;
      width: min(520px, 94vw);
      max-height: 90vh;
      overflow-y: auto;
      position: relative;
    }

    .modal-close {
      position: absolute;
      top: 10px;
      right: 12px;
      border: none;
      background: none;
      font-size: 1.4rem;
      cursor: pointer;
    }

    .activity-section {
      display: grid;
      gap: 6px;
      margin: 14px 0;
      border: 1px solid rgba(0, 0, 0, 0.08);
      border-radius: 10px;
    }

    .guide dt {
      font-weight: 600;
      margin-top: 10px;
    }

    .guide dd {
      margin: 2px 0 0;
      color: var(--muted);
    }

    .guides {
      margin-top: 24px;
    }

    .section-hidden {
      display: none;
    }

    .modal-actions {
      display: flex;
      flex-wrap: wrap;
      gap: 8px;
    }

    @media (max-width: 760px) {
      .layout {
        grid-template-columns: 1fr;
      }
    }
  </style>
</head>
<body>
  <div id="app" class="layout">
    <main>
      <header class="calendar-header">{{slot:nav}}</header>
      {{slot:grid}}
    </main>
    <aside class="sidebar">{{slot:sidebar}}<nav class="guides">{{slot:guides}}</nav></aside>
  </div>
  {{slot:modal}}
  <script>
{{slot:script}}
  </script>
</body>
</html>
"#;

const CALENDAR_SCRIPT: &str = r#"
    (() => {
      const modal = document.getElementById('eventModal');
      const form = document.getElementById('activityForm');
      if (!modal || !form) {
        return;
      }

      const isoDate = form.dataset.date;
      const drinkingToggle = document.getElementById('activityDrinkingToggle');
      const gamblingToggle = document.getElementById('activityGamblingToggle');
      const drinkingSection = document.getElementById('drinkingSection');
      const gamblingSection = document.getElementById('gamblingSection');
      const closeModalBtn = document.getElementById('closeModal');

      const setSectionState = (section, isVisible) => {
        if (!section) return;
        section.classList.toggle('section-hidden', !isVisible);
        section.classList.toggle('section-disabled', !isVisible);
        section.disabled = !isVisible;
      };

      const updateSectionsFromSelection = () => {
        setSectionState(drinkingSection, drinkingToggle.checked);
        setSectionState(gamblingSection, gamblingToggle.checked);
      };

      const collect = (section) => {
        const values = {};
        section.querySelectorAll('input[name]').forEach((input) => {
          values[input.name] = input.value.trim();
        });
        return values;
      };

      const closeModal = () => {
        modal.style.display = 'none';
      };

      const postJson = async (url, payload, fallback) => {
        const response = await fetch(url, {
          method: 'POST',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify(payload),
        });
        const result = await response.json().catch(() => ({}));
        if (!response.ok) {
          throw new Error(result.message || fallback);
        }
        return result;
      };

      form.addEventListener('submit', async (event) => {
        event.preventDefault();
        if (!drinkingToggle.checked && !gamblingToggle.checked) {
          alert('Please select Drinking, Gambling, or both before saving.');
          return;
        }

        const payload = { date: isoDate, activities: {} };
        if (drinkingToggle.checked) payload.activities.drinking = collect(drinkingSection);
        if (gamblingToggle.checked) payload.activities.gambling = collect(gamblingSection);

        try {
          await postJson('/api/log-activity', payload, 'Failed to save entry');
          window.location.reload();
        } catch (error) {
          alert(error.message || 'Error saving data. Please try again.');
          console.error('Error saving data:', error);
        }
      });

      document.querySelectorAll('.btn-delete').forEach((button) => {
        button.addEventListener('click', async () => {
          const entryType = button.dataset.type;
          if (!window.confirm(`Delete the ${entryType} entry for ${isoDate}?`)) {
            return;
          }
          try {
            await postJson('/api/delete-activity', { date: isoDate, type: entryType }, `Failed to delete ${entryType} entry`);
            window.location.reload();
          } catch (error) {
            alert(error.message || `Error deleting ${entryType} entry.`);
            console.error(`Error deleting ${entryType} entry:`, error);
          }
        });
      });

      if (closeModalBtn) closeModalBtn.addEventListener('click', closeModal);
      modal.addEventListener('click', (event) => {
        if (event.target === modal) closeModal();
      });
      drinkingToggle.addEventListener('change', updateSectionsFromSelection);
      gamblingToggle.addEventListener('change', updateSectionsFromSelection);
      updateSectionsFromSelection();
    })();
"#;
