use std::path::PathBuf;

use anyhow::{Result, anyhow};
use serde_json::json;

use super::browser::open_in_browser;
use crate::appointment::AppointmentRecord;
use crate::core::AppConfig;
use crate::form::{Command, FormController, Outcome};
use crate::images::ImageFile;

pub async fn run(config: &AppConfig, paths: &[PathBuf], open: bool) -> Result<()> {
    let images = ImageFile::load_all(paths).await?;

    let mut form = FormController::from_config(config);
    form.handle(Command::SelectFiles(images)).await?;

    match form.handle(Command::ExtractImages).await {
        Ok(Outcome::Extracted { record, link }) => {
            println!(
                "{}",
                json!({
                    "record": record,
                    "link": link.as_str(),
                })
            );
            if open {
                open_in_browser(link.as_str()).await;
            }
            Ok(())
        }
        Ok(other) => Err(anyhow!("Unexpected outcome: {:?}", other)),
        Err(e) => {
            // Print whatever was extracted so it can be fixed with `link`
            if form.record() != &AppointmentRecord::default() {
                println!("{}", json!({ "record": form.record() }));
            }
            Err(e.into())
        }
    }
}
