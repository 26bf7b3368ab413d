use std::io::{self, Write};
use std::sync::Arc;

use timetable::catalog::LectureList;
use timetable::filter::{PAGE_SIZE, last_page, visible_results};
use timetable::placement::{InvalidHandle, ScheduleHandle};
use timetable::schedule::find_conflicts;
use timetable::time_grid::{self, Day, Period};
use timetable::{
    AppConfig, CellDelta, Lecture, LectureCatalog, PeriodRange, ScheduleStore, SearchOptions,
    TableId, TableSchedules, filter_lectures, resolve_drag, seed, telemetry,
};

const CELL_CHARS: usize = 14;

fn format_range(range: PeriodRange) -> String {
    if range.len() == 1 {
        range.first().to_string()
    } else {
        format!("{}~{}", range.first(), range.last())
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(max.saturating_sub(1)).collect();
        short.push('…');
        short
    }
}

fn cell_text(schedules: &TableSchedules, day: Day, period: Period) -> String {
    let hits: Vec<usize> = schedules
        .iter()
        .enumerate()
        .filter(|(_, schedule)| schedule.occupies(day, period))
        .map(|(idx, _)| idx)
        .collect();
    match hits.as_slice() {
        [] => String::new(),
        [idx] => truncate(&format!("#{idx} {}", schedules[*idx].lecture.title), CELL_CHARS),
        many => many
            .iter()
            .map(|idx| format!("#{idx}"))
            .collect::<Vec<_>>()
            .join("/"),
    }
}

fn render_table_as_text_grid(table_id: &str, schedules: &TableSchedules) -> String {
    let mut header = vec!["time".to_string()];
    header.extend(Day::ALL.iter().map(|day| day.label().to_string()));

    let rows: Vec<Vec<String>> = time_grid::periods()
        .map(|period| {
            let mut row = vec![format!(
                "{:>2} {}",
                period,
                time_grid::period_to_label(period).unwrap_or_default()
            )];
            row.extend(Day::ALL.iter().map(|day| cell_text(schedules, *day, period)));
            row
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.chars().count());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |cells: &[String]| {
        let mut line = String::from("|");
        for (ci, cell) in cells.iter().enumerate() {
            let pad = widths[ci].saturating_sub(cell.chars().count());
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(pad));
            line.push_str(" |");
        }
        line
    };

    let mut out = format!("Table {table_id}\n");
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&header));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &rows {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');

    if schedules.is_empty() {
        out.push_str("(no lectures placed)\n");
    }
    for (idx, schedule) in schedules.iter().enumerate() {
        out.push_str(&format!(
            "#{idx} {} {} {} {}{}\n",
            schedule.lecture.id,
            schedule.lecture.title,
            schedule.day,
            format_range(schedule.range),
            schedule
                .room
                .as_deref()
                .map(|room| format!(" ({room})"))
                .unwrap_or_default(),
        ));
    }
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  tables                             List tables (* marks the current one)\n  show [table]                       Show a table and make it current\n  search [words] [key=v1,v2 ...]     Search lectures; keys: grade day time major credits\n  more                               Show the next page of search results\n  slot <day> <period>                Show the cell, or search lectures for an empty cell\n  add <lecture-id>                   Place every slot of a lecture on the current table\n  del <day> <period>                 Remove schedules covering a cell\n  dup [table]                        Duplicate a table\n  rm [table]                         Remove a table\n  drag <block> <days> <periods> [force]\n                                     Move a block by whole cells; <block> is an index\n                                     on the current table or <table>:<index>\n  quit|exit                          Exit"
    );
}

fn parse_cell<'a>(mut parts: impl Iterator<Item = &'a str>) -> Result<(Day, Period), String> {
    let day = parts
        .next()
        .ok_or_else(|| "missing day".to_string())?
        .parse::<Day>()
        .map_err(|err| err.to_string())?;
    let period = parts
        .next()
        .and_then(|p| p.parse::<Period>().ok())
        .filter(|p| time_grid::is_valid_period(*p))
        .ok_or_else(|| "period must be between 1 and 24".to_string())?;
    Ok((day, period))
}

fn parse_search<'a>(parts: impl Iterator<Item = &'a str>) -> Result<SearchOptions, String> {
    let mut options = SearchOptions::new();
    let mut words = Vec::new();
    for part in parts {
        let Some((key, values)) = part.split_once('=') else {
            words.push(part);
            continue;
        };
        let values = values.split(',').map(str::trim).filter(|v| !v.is_empty());
        match key {
            "grade" => {
                for v in values {
                    options
                        .grades
                        .insert(v.parse::<u8>().map_err(|_| format!("invalid grade '{v}'"))?);
                }
            }
            "day" => {
                for v in values {
                    options.days.insert(v.parse::<Day>().map_err(|err| err.to_string())?);
                }
            }
            "time" => {
                for v in values {
                    options
                        .times
                        .insert(v.parse::<Period>().map_err(|_| format!("invalid period '{v}'"))?);
                }
            }
            "major" => options.majors.extend(values.map(str::to_string)),
            "credits" => {
                options.credits = Some(
                    part[key.len() + 1..]
                        .parse::<f64>()
                        .map_err(|_| format!("invalid credits '{}'", &part[key.len() + 1..]))?,
                );
            }
            other => return Err(format!("unknown search key '{other}'")),
        }
    }
    if !words.is_empty() {
        options.query = Some(words.join(" "));
    }
    Ok(options)
}

struct Session {
    store: ScheduleStore,
    catalog: LectureCatalog,
    runtime: tokio::runtime::Runtime,
    current: TableId,
    results: Vec<Arc<Lecture>>,
    page: usize,
}

impl Session {
    fn lectures(&self) -> Option<LectureList> {
        match self.runtime.block_on(self.catalog.lectures()) {
            Ok(lectures) => Some(lectures),
            Err(err) => {
                println!("Catalog error: {err}");
                None
            }
        }
    }

    fn target(&self, explicit: Option<&str>) -> TableId {
        explicit.map(str::to_string).unwrap_or_else(|| self.current.clone())
    }

    /// A bare index names a block of the current table.
    fn handle(&self, raw: &str) -> Result<ScheduleHandle, InvalidHandle> {
        match raw.parse::<usize>() {
            Ok(index) => Ok(ScheduleHandle::new(self.current.clone(), index)),
            Err(_) => raw.parse::<ScheduleHandle>(),
        }
    }

    fn block_label(&self, handle: &ScheduleHandle) -> String {
        if handle.table_id == self.current {
            format!("#{}", handle.index)
        } else {
            handle.to_string()
        }
    }

    fn show_current(&self) {
        println!("{}", render_table_as_text_grid(&self.current, &self.store.table(&self.current)));
    }

    fn run_search(&mut self, options: &SearchOptions) {
        let Some(lectures) = self.lectures() else {
            return;
        };
        self.results = filter_lectures(&lectures, options);
        self.page = 1;
        println!("Found {} lectures", self.results.len());
        self.print_page(0);
    }

    fn print_page(&self, from: usize) {
        for lecture in &visible_results(&self.results, self.page)[from..] {
            println!(
                "  {} | {} | {} | grade {} | {} credits | {}",
                lecture.id,
                lecture.title,
                lecture.major,
                lecture.grade,
                lecture.credits,
                lecture.schedule.replace("<p>", " ")
            );
        }
        if self.page < last_page(self.results.len()) {
            println!("  ... type 'more' for the next {PAGE_SIZE}");
        }
    }

    fn more(&mut self) {
        if self.page >= last_page(self.results.len()) {
            println!("No more results.");
            return;
        }
        let from = visible_results(&self.results, self.page).len();
        self.page += 1;
        self.print_page(from);
    }

    fn slot(&mut self, day: Day, period: Period) {
        let schedules = self.store.table(&self.current);
        let occupants: Vec<_> = schedules
            .iter()
            .enumerate()
            .filter(|(_, schedule)| schedule.occupies(day, period))
            .collect();
        if occupants.is_empty() {
            println!("{day} {period} is free on {}; searching.", self.current);
            self.run_search(&SearchOptions::for_slot(day, period));
            return;
        }
        for (idx, schedule) in occupants {
            println!(
                "#{idx} {} {} {}",
                schedule.lecture.title,
                schedule.day,
                format_range(schedule.range)
            );
        }
    }

    fn add(&mut self, lecture_id: &str) {
        let Some(lectures) = self.lectures() else {
            return;
        };
        let Some(lecture) = lectures.iter().find(|lecture| lecture.id == lecture_id) else {
            println!("Unknown lecture '{lecture_id}'");
            return;
        };
        let placed = lecture.to_schedules();
        if placed.is_empty() {
            println!("Lecture '{lecture_id}' has no placeable time slots");
            return;
        }
        let existing = self.store.table(&self.current);
        for schedule in &placed {
            let conflicts = find_conflicts(&existing[..], schedule.day, schedule.range, None);
            if !conflicts.is_empty() {
                println!(
                    "Warning: {} {} overlaps {}",
                    schedule.day,
                    format_range(schedule.range),
                    conflicts
                        .iter()
                        .map(|idx| format!("#{idx}"))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
        }
        match self.store.add_lecture(&self.current, lecture) {
            Ok(_) => {
                println!("Added {} to {} ({} slots)", lecture.title, self.current, placed.len());
                self.show_current();
            }
            Err(err) => println!("Error: {err}"),
        }
    }

    fn delete(&mut self, day: Day, period: Period) {
        let before = self.store.table(&self.current).len();
        match self.store.delete_by_slot(&self.current, day, period) {
            Ok(_) => {
                let removed = before.saturating_sub(self.store.table(&self.current).len());
                println!("Removed {removed} schedule(s) from {}", self.current);
            }
            Err(err) => println!("Error: {err}"),
        }
    }

    fn duplicate(&mut self, source: TableId) {
        match self.store.duplicate_table(&source) {
            Ok(Some(created)) => println!("Duplicated {source} as {created}"),
            Ok(None) => println!("Unknown table '{source}'"),
            Err(err) => println!("Error: {err}"),
        }
    }

    fn remove(&mut self, table_id: TableId) {
        if !self.store.contains_table(&table_id) {
            println!("Unknown table '{table_id}'");
            return;
        }
        match self.store.remove_table(&table_id) {
            Ok(_) => {
                println!("Removed table {table_id}");
                if table_id == self.current {
                    if let Some(first) = self.store.table_keys().first() {
                        self.current = first.clone();
                    }
                    println!("Current table is now {}", self.current);
                }
            }
            Err(err) => println!("Error: {err}"),
        }
    }

    fn drag(&mut self, handle: ScheduleHandle, delta: CellDelta, force: bool) {
        let label = self.block_label(&handle);
        let schedules = self.store.table(&handle.table_id);
        let Some(placement) = resolve_drag(&schedules, handle.index, delta) else {
            println!("No schedule {label} on {}", handle.table_id);
            return;
        };
        if !placement.moved {
            println!("No movement.");
            return;
        }
        let target = format!("{} {}", placement.day, format_range(placement.range));
        if placement.has_conflicts() && !force {
            let conflicts: Vec<String> = placement.conflicts.iter().map(|idx| format!("#{idx}")).collect();
            println!("Blocked: {target} overlaps {}", conflicts.join(", "));
            return;
        }
        match self
            .store
            .move_schedule(&handle.table_id, handle.index, placement.day, placement.range)
        {
            Ok(_) => println!("Moved {label} to {target}"),
            Err(err) => println!("Error: {err}"),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    telemetry::init(&config.log_filter);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let store = ScheduleStore::new(seed::demo_schedule_map());
    let current = store.table_keys().first().cloned().unwrap_or_default();
    let _keys_watch = store.subscribe_keys(|keys| println!("Tables: {}", keys.join(", ")));

    let mut session = Session {
        store,
        catalog: LectureCatalog::from_shared(config.lecture_source()?),
        runtime,
        current,
        results: Vec::new(),
        page: 1,
    };

    println!("Timetable (CLI) - type 'help' for commands\n");
    session.show_current();

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "tables" => {
                for key in session.store.table_keys().iter() {
                    let marker = if *key == session.current { "*" } else { " " };
                    println!("{marker} {key} ({} schedules)", session.store.table(key).len());
                }
                if !session.store.can_remove_table() {
                    println!("(the last table cannot be removed)");
                }
            }
            "show" => match parts.next() {
                Some(table_id) if !session.store.contains_table(table_id) => {
                    println!("Unknown table '{table_id}'");
                }
                Some(table_id) => {
                    session.current = table_id.to_string();
                    session.show_current();
                }
                None => session.show_current(),
            },
            "search" => match parse_search(parts) {
                Ok(options) => session.run_search(&options),
                Err(err) => println!("Invalid search: {err}"),
            },
            "more" => session.more(),
            "slot" => match parse_cell(parts) {
                Ok((day, period)) => session.slot(day, period),
                Err(err) => println!("Usage: slot <day> <period> ({err})"),
            },
            "add" => match parts.next() {
                Some(lecture_id) => session.add(lecture_id),
                None => println!("Usage: add <lecture-id>"),
            },
            "del" => match parse_cell(parts) {
                Ok((day, period)) => session.delete(day, period),
                Err(err) => println!("Usage: del <day> <period> ({err})"),
            },
            "dup" => {
                let source = session.target(parts.next());
                session.duplicate(source);
            }
            "rm" => {
                let table_id = session.target(parts.next());
                session.remove(table_id);
            }
            "drag" => {
                let handle = parts.next().map(|raw| session.handle(raw));
                let days = parts.next().and_then(|v| v.parse::<i32>().ok());
                let periods = parts.next().and_then(|v| v.parse::<i32>().ok());
                let force = parts.next() == Some("force");
                match (handle, days, periods) {
                    (Some(Err(err)), _, _) => println!("Error: {err}"),
                    (Some(Ok(handle)), Some(days), Some(periods)) => {
                        session.drag(handle, CellDelta::new(days, periods), force)
                    }
                    _ => println!("Usage: drag <block> <days> <periods> [force]"),
                }
            }
            other => println!("Unknown command '{other}'. Type 'help' for commands."),
        }
    }
    Ok(())
}
