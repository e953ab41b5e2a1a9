use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{BarChart, Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;

use crate::bookmarks::{AddOutcome, Bookmarks, KeyValueStore};
use crate::extract::{
    extract_salary, extract_skills, extract_work_type, relative_date, valid_logo_url,
};
use crate::models::{Job, WorkType};
use crate::stats::{JobStatistics, RankEntry, job_statistics};

struct AppState {
    jobs: Vec<Job>,
    stats: JobStatistics,
    selected: usize,
    scroll_offset: u16,
    show_stats: bool,
    status: Option<String>,
}

impl AppState {
    fn new(jobs: Vec<Job>) -> Self {
        let stats = job_statistics(&jobs);
        Self {
            jobs,
            stats,
            selected: 0,
            scroll_offset: 0,
            show_stats: false,
            status: None,
        }
    }

    fn current_job(&self) -> Option<&Job> {
        self.jobs.get(self.selected)
    }

    fn next(&mut self) {
        if !self.jobs.is_empty() && self.selected < self.jobs.len() - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    /// Bookmarks the selected posting, or removes it when already kept.
    fn toggle_bookmark<S: KeyValueStore>(&mut self, bookmarks: &mut Bookmarks<S>) {
        let Some(job) = self.current_job().cloned() else {
            return;
        };
        let result = match job.id() {
            Some(id) if bookmarks.contains(Some(&id)) => bookmarks
                .remove(&id)
                .map(|_| format!("Removed bookmark: {}", job.title)),
            _ => bookmarks.add(job.clone()).map(|outcome| match outcome {
                AddOutcome::Added => format!("Bookmarked: {}", job.title),
                AddOutcome::AlreadyBookmarked => format!("Already bookmarked: {}", job.title),
                AddOutcome::MissingIdentifier => "No detail URL, cannot bookmark".to_string(),
            }),
        };
        self.status = Some(result.unwrap_or_else(|e| format!("Bookmark failed: {:#}", e)));
    }
}

pub fn run_browse<S: KeyValueStore>(jobs: Vec<Job>, bookmarks: &mut Bookmarks<S>) -> Result<()> {
    if jobs.is_empty() {
        println!("No jobs found.");
        return Ok(());
    }

    let mut state = AppState::new(jobs);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, bookmarks);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop<S: KeyValueStore>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    bookmarks: &mut Bookmarks<S>,
) -> Result<()> {
    let mut list_state = ListState::default();
    list_state.select(Some(0));

    loop {
        terminal.draw(|frame| draw(frame, state, bookmarks, &mut list_state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Down | KeyCode::Char('j') => state.next(),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
                KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
                KeyCode::Char('b') => state.toggle_bookmark(bookmarks),
                KeyCode::Char('s') => state.show_stats = !state.show_stats,
                _ => {}
            }
            list_state.select(Some(state.selected));
        }
    }
    Ok(())
}

fn draw<S: KeyValueStore>(
    frame: &mut Frame,
    state: &AppState,
    bookmarks: &Bookmarks<S>,
    list_state: &mut ListState,
) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[0]);

    // Left panel: job list
    let items: Vec<ListItem> = state
        .jobs
        .iter()
        .map(|job| {
            let marker = if bookmarks.contains(job.id().as_ref()) { "*" } else { " " };
            let work = match extract_work_type(job.primary_description.as_deref()) {
                WorkType::Remote => "R",
                WorkType::Hybrid => "H",
                WorkType::OnSite => "O",
                WorkType::NotSpecified => "-",
            };
            let company = job.company_name.as_deref().unwrap_or("?");
            ListItem::new(format!("{} {} {} | {}", marker, work, clip(&job.title, 35), company))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Jobs ({}) - {} bookmarked ",
            state.jobs.len(),
            bookmarks.len()
        )))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: detail or dashboard
    if state.show_stats {
        draw_stats(frame, &state.stats, chunks[1]);
    } else {
        let detail = build_detail(state, bookmarks);
        let detail_widget = Paragraph::new(detail)
            .block(Block::default().borders(Borders::ALL).title(" Detail "))
            .wrap(Wrap { trim: false })
            .scroll((state.scroll_offset, 0));
        frame.render_widget(detail_widget, chunks[1]);
    }

    // Footer: last action or key help
    let footer = match &state.status {
        Some(status) => Paragraph::new(format!(" {}", status)).style(Style::default().fg(Color::Yellow)),
        None => Paragraph::new(" j/k:navigate  J/K:scroll  b:bookmark  s:stats  q:quit")
            .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(footer, rows[1]);
}

fn draw_stats(frame: &mut Frame, stats: &JobStatistics, area: Rect) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8),
            Constraint::Percentage(50),
            Constraint::Percentage(50),
        ])
        .split(area);

    let share = |count: usize| {
        stats
            .share(count)
            .map(|s| format!("{:.0}%", s * 100.0))
            .unwrap_or_else(|| "-".to_string())
    };
    let summary = vec![
        Line::from(format!("Total jobs: {}", stats.total_jobs)),
        Line::from(format!("Remote:     {} ({})", stats.remote_jobs, share(stats.remote_jobs))),
        Line::from(format!("Hybrid:     {} ({})", stats.hybrid_jobs, share(stats.hybrid_jobs))),
        Line::from(format!("On-site:    {} ({})", stats.onsite_jobs, share(stats.onsite_jobs))),
        Line::from(format!(
            "Companies:  {}   Locations: {}",
            stats.companies_count, stats.locations_count
        )),
    ];
    frame.render_widget(
        Paragraph::new(summary).block(Block::default().borders(Borders::ALL).title(" Overview ")),
        parts[0],
    );

    frame.render_widget(ranking_chart(" Top skills ", &stats.top_skills), parts[1]);
    frame.render_widget(ranking_chart(" Top companies ", &stats.top_companies), parts[2]);
}

fn ranking_chart<'a>(title: &'a str, entries: &'a [RankEntry]) -> BarChart<'a> {
    let data: Vec<(&str, u64)> = entries
        .iter()
        .map(|e| (e.name.as_str(), e.count as u64))
        .collect();

    BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .bar_style(Style::default().fg(Color::Cyan))
        .data(data.as_slice())
}

fn build_detail<'a, S: KeyValueStore>(state: &'a AppState, bookmarks: &Bookmarks<S>) -> Text<'a> {
    let Some(job) = state.current_job() else {
        return Text::raw("No job selected");
    };

    let mut lines: Vec<Line> = Vec::new();

    // Header
    lines.push(Line::from(Span::styled(
        &job.title,
        Style::default().add_modifier(Modifier::BOLD),
    )));

    if let Some(company) = &job.company_name {
        lines.push(Line::from(format!("at {}", company)));
    }
    if let Some(location) = &job.location {
        lines.push(Line::from(format!("Location: {}", location)));
    }

    let work_type = extract_work_type(job.primary_description.as_deref());
    let work_style = match work_type {
        WorkType::Remote => Style::default().fg(Color::Green),
        WorkType::Hybrid => Style::default().fg(Color::Yellow),
        WorkType::OnSite => Style::default().fg(Color::Cyan),
        WorkType::NotSpecified => Style::default().fg(Color::DarkGray),
    };
    lines.push(Line::from(Span::styled(format!("Work type: {}", work_type), work_style)));
    lines.push(Line::from(format!("Posted: {}", relative_date(job.created_at.as_deref()))));

    if let Some(salary) = extract_salary(job.description.as_deref()) {
        lines.push(Line::from(format!("Salary: {}", salary)));
    }
    if let Some(url) = &job.detail_url {
        lines.push(Line::from(format!("URL: {}", url)));
    }
    lines.push(Line::from(format!(
        "Logo: {}",
        valid_logo_url(job.company_logo.as_deref())
    )));
    if bookmarks.contains(job.id().as_ref()) {
        lines.push(Line::from(Span::styled(
            "Bookmarked",
            Style::default().fg(Color::Magenta),
        )));
    }

    lines.push(Line::from(""));

    let skills = extract_skills(job.description.as_deref());
    if !skills.is_empty() {
        lines.push(Line::from(Span::styled(
            "Skills",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for line in textwrap::fill(&skills.join(", "), 70).lines() {
            lines.push(Line::from(format!("  {}", line)));
        }
        lines.push(Line::from(""));
    }

    if let Some(text) = &job.description {
        lines.push(Line::from(Span::styled(
            "Description",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for line in text.lines() {
            lines.push(Line::from(line.to_string()));
        }
    } else {
        lines.push(Line::from(Span::styled(
            "(No description)",
            Style::default().fg(Color::DarkGray),
        )));
    }

    Text::from(lines)
}

fn clip(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}
