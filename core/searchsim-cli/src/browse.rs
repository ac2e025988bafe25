//! `searchsim browse`: drive one simulated tab from line commands on stdin.
//!
//! ```text
//! search <text>        tab <label>        page <n>      next / prev
//! open <id>            close              image <id> <title>
//! back / forward       go <?query>        show          new-session
//! help                 quit
//! ```

use searchsim_core::{
    get_tab_dir, load_sim_config, Dataset, DeliveryMode, MemoryTransport, SessionStore,
    SimulationEngine, Tab, TrackingClient, UserAction, SESSION_FILE_NAME,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use crate::render::render;

pub struct BrowseOptions {
    pub dataset: PathBuf,
    pub url: String,
    pub tab_id: Option<String>,
    pub endpoint: Option<String>,
    pub inline: bool,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Action(UserAction),
    Show,
    NewSession,
    Help,
    Quit,
}

pub fn run(options: BrowseOptions) -> Result<(), String> {
    let dataset = Dataset::load(&options.dataset)?;

    let mut config = load_sim_config();
    if let Some(endpoint) = options.endpoint {
        config.endpoint = endpoint;
    }
    if options.inline {
        config.delivery_mode = DeliveryMode::Inline;
    }

    let session = Rc::new(session_store(options.tab_id.as_deref()));
    let recorder = options.dry_run.then(|| Arc::new(MemoryTransport::new()));
    let tracker = match &recorder {
        Some(recorder) => TrackingClient::new(
            dataset.persona.clone(),
            Rc::clone(&session),
            recorder.clone(),
            DeliveryMode::Inline,
        ),
        None => TrackingClient::from_config(dataset.persona.clone(), Rc::clone(&session), &config),
    };

    let mut engine = SimulationEngine::mount(dataset, &options.url, tracker, &config);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_page(&mut out, &engine, recorder.as_deref())?;

    for line in io::stdin().lock().lines() {
        let line = line.map_err(|e| format!("Failed to read stdin: {}", e))?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(Command::Action(action)) => {
                engine.dispatch(action);
                write_page(&mut out, &engine, recorder.as_deref())?;
            }
            Ok(Command::Show) => write_page(&mut out, &engine, recorder.as_deref())?,
            Ok(Command::NewSession) => {
                session.reset();
                emit(&mut out, "Session reset.\n")?;
            }
            Ok(Command::Help) => emit(&mut out, HELP)?,
            Ok(Command::Quit) => break,
            Err(message) => emit(&mut out, &format!("? {}\n", message))?,
        }
    }

    engine.tracker().flush();
    Ok(())
}

const HELP: &str = "\
search <text>       change the search box text
tab <label>         select a tab (All, Videos, Images, News, Short videos, Shopping, or a platform)
page <n>            jump to page n
next | prev         step one page
open <id>           open a result
close               close the open result
image <id> <title>  click a gallery image
back | forward      browser history
go <?query>         load a URL query as if typed
show                redraw the page
new-session         forget the tab's session id
quit                exit
";

pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let action = match verb.to_ascii_lowercase().as_str() {
        "search" => UserAction::Search(rest.to_string()),
        "tab" => UserAction::SelectTab(Tab::from_label(rest)),
        "page" => UserAction::GoToPage(
            rest.parse::<u32>()
                .map_err(|_| format!("not a page number: {}", rest))?,
        ),
        "next" => UserAction::NextPage,
        "prev" | "previous" => UserAction::PreviousPage,
        "open" => UserAction::OpenResult(required(rest, "open <id>")?),
        "close" => UserAction::CloseResult,
        "image" => {
            let args = required(rest, "image <id> <title>")?;
            let (id, title) = args
                .split_once(char::is_whitespace)
                .unwrap_or((args.as_str(), ""));
            UserAction::ClickImage {
                id: id.to_string(),
                title: title.trim().to_string(),
            }
        }
        "back" => UserAction::Back,
        "forward" => UserAction::Forward,
        "go" => UserAction::Navigate(rest.to_string()),
        "show" => return Ok(Command::Show),
        "new-session" => return Ok(Command::NewSession),
        "help" | "?" => return Ok(Command::Help),
        "quit" | "exit" => return Ok(Command::Quit),
        other => return Err(format!("unknown command: {} (try help)", other)),
    };
    Ok(Command::Action(action))
}

fn required(value: &str, usage: &str) -> Result<String, String> {
    if value.is_empty() {
        Err(format!("usage: {}", usage))
    } else {
        Ok(value.to_string())
    }
}

fn session_store(tab_id: Option<&str>) -> SessionStore {
    match tab_id.and_then(get_tab_dir) {
        Some(dir) => SessionStore::with_backing_file(dir.join(SESSION_FILE_NAME)),
        None => SessionStore::in_memory(),
    }
}

fn write_page(
    out: &mut impl Write,
    engine: &SimulationEngine,
    recorder: Option<&MemoryTransport>,
) -> Result<(), String> {
    let mut text = render(engine);
    if let Some(recorder) = recorder {
        for event in recorder.drain() {
            let json = serde_json::to_string(&event)
                .map_err(|e| format!("Failed to serialize event: {}", e))?;
            text.push_str(&format!("event: {}\n", json));
        }
    }
    text.push_str("----\n");
    emit(out, &text)
}

fn emit(out: &mut impl Write, text: &str) -> Result<(), String> {
    out.write_all(text.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|e| format!("Failed to write output: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_navigation_commands() {
        assert_eq!(
            parse_command("tab Short videos"),
            Ok(Command::Action(UserAction::SelectTab(Tab::ShortVideos)))
        );
        assert_eq!(
            parse_command("  page 3 "),
            Ok(Command::Action(UserAction::GoToPage(3)))
        );
        assert_eq!(
            parse_command("BACK"),
            Ok(Command::Action(UserAction::Back))
        );
        assert_eq!(
            parse_command("go ?page=2&tab=LinkedIn"),
            Ok(Command::Action(UserAction::Navigate(
                "?page=2&tab=LinkedIn".to_string()
            )))
        );
        assert_eq!(parse_command("quit"), Ok(Command::Quit));
    }

    #[test]
    fn parses_image_click_with_multi_word_title() {
        assert_eq!(
            parse_command("image img-4 Greg at the conference"),
            Ok(Command::Action(UserAction::ClickImage {
                id: "img-4".to_string(),
                title: "Greg at the conference".to_string(),
            }))
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_command("page two").is_err());
        assert!(parse_command("open").is_err());
        assert!(parse_command("teleport").is_err());
    }

    #[test]
    fn tab_without_label_is_default_tab() {
        assert_eq!(
            parse_command("tab"),
            Ok(Command::Action(UserAction::SelectTab(Tab::All)))
        );
    }
}
