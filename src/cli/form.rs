//! Interactive booking form. Each line typed at the prompt becomes a
//! command for the `FormController`; failures are printed as the
//! form's status message and never end the session.

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use super::browser::open_in_browser;
use crate::appointment::Field;
use crate::core::AppConfig;
use crate::form::{Command, FormController, Outcome, Phase, StatusMessage};
use crate::images::ImageFile;

const HELP: &str = r"Commands:
  open <path> [<path>...]   select screenshots (replaces the current selection)
  set <field> <value>       edit a field (area, name, phone, date, start, end, address, notes)
  show                      print the form
  extract                   read the selected screenshots and create a calendar link
  submit                    create a calendar link from the fields as they are
  reset                     clear the form
  help                      show this message
  quit                      exit";

#[derive(Debug, PartialEq)]
pub enum Input {
    Open(Vec<PathBuf>),
    Set(Field, String),
    Show,
    Extract,
    Submit,
    Reset,
    Help,
    Quit,
    Empty,
}

pub fn parse_line(line: &str) -> Result<Input> {
    let line = line.trim();
    let (cmd, rest) = line
        .split_once(char::is_whitespace)
        .map(|(cmd, rest)| (cmd, rest.trim()))
        .unwrap_or((line, ""));

    let input = match cmd.to_lowercase().as_str() {
        "" => Input::Empty,
        "open" | "select" => {
            if rest.is_empty() {
                return Err(anyhow!("Usage: open <path> [<path>...]"));
            }
            Input::Open(rest.split_whitespace().map(PathBuf::from).collect())
        }
        "set" => {
            let (field, value) = rest
                .split_once(char::is_whitespace)
                .map(|(field, value)| (field, value.trim()))
                .unwrap_or((rest, ""));
            if field.is_empty() {
                return Err(anyhow!("Usage: set <field> <value>"));
            }
            Input::Set(field.parse()?, value.to_string())
        }
        "show" => Input::Show,
        "extract" => Input::Extract,
        "submit" | "link" => Input::Submit,
        "reset" | "clear" => Input::Reset,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => return Err(anyhow!("Unknown command: {} (try `help`)", other)),
    };
    Ok(input)
}

pub fn render_form(form: &FormController) -> String {
    let mut lines: Vec<String> = Field::ALL
        .iter()
        .map(|field| format!("{:<14} {}", format!("{}:", field.label()), form.record().get(*field)))
        .collect();

    let names: Vec<&str> = form.previews().iter().map(|p| p.name()).collect();
    lines.push(format!(
        "{:<14} {}",
        "Screenshots:",
        if names.is_empty() {
            String::from("none")
        } else {
            names.join(", ")
        }
    ));
    lines.push(format!("{:<14} {}", "Timezone:", form.timezone().name()));
    if let Some(link) = form.last_link() {
        lines.push(format!("{:<14} {}", "Link:", link.as_str()));
    }
    if let Some(status) = form.status() {
        lines.push(render_status(status));
    }
    lines.join("\n")
}

fn render_status(status: &StatusMessage) -> String {
    match status {
        StatusMessage::Success(text) => format!("✔ {}", text),
        StatusMessage::Error(text) => format!("✘ {}", text),
    }
}

async fn dispatch(form: &mut FormController, input: Input, open: bool) -> Result<()> {
    let command = match input {
        Input::Open(paths) => Command::SelectFiles(ImageFile::load_all(&paths).await?),
        Input::Set(field, value) => Command::EditField(field, value),
        Input::Extract => Command::ExtractImages,
        Input::Submit => Command::SubmitManual,
        Input::Reset => Command::Reset,
        Input::Show => {
            println!("{}", render_form(form));
            return Ok(());
        }
        Input::Help => {
            println!("{}", HELP);
            return Ok(());
        }
        Input::Quit | Input::Empty => return Ok(()),
    };

    let result = form.handle(command).await;
    if let Some(status) = form.status() {
        println!("{}", render_status(status));
    }

    match result {
        Ok(Outcome::Selected(count)) => println!("{} screenshot(s) selected", count),
        Ok(Outcome::Extracted { link, .. }) | Ok(Outcome::Linked(link)) => {
            println!("{}\n\n{}", render_form(form), link.as_str());
            if open {
                open_in_browser(link.as_str()).await;
            }
        }
        // The status line already describes the failure
        Ok(_) | Err(_) => {}
    }
    Ok(())
}

pub async fn run(config: &AppConfig, open: bool) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut form = FormController::from_config(config);

    let mut phase = form.subscribe_phase();
    tokio::spawn(async move {
        while phase.changed().await.is_ok() {
            if *phase.borrow() == Phase::Extracting {
                println!("Extracting...");
            }
        }
    });

    if !form.extraction_available() {
        println!("GEMINI_API_KEY is not set: `extract` is disabled, `submit` still works.");
    }
    println!("{}", HELP);

    loop {
        let readline = rl.readline("form> ");
        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                match parse_line(&line) {
                    Ok(Input::Quit) => break,
                    Ok(input) => {
                        if let Err(e) = dispatch(&mut form, input, open).await {
                            println!("Error: {}", e);
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
