use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::browser::open_in_browser;
use crate::appointment::Field;
use crate::core::AppConfig;
use crate::form::FormController;

#[derive(Args, Debug, Default)]
pub struct LinkArgs {
    /// Appointment date (YYYY-MM-DD)
    #[arg(long)]
    pub date: String,
    /// Start time (HH:MM, 24-hour)
    #[arg(long)]
    pub start: String,
    /// End time (HH:MM, 24-hour)
    #[arg(long)]
    pub end: String,
    #[arg(long, default_value = "")]
    pub area: String,
    #[arg(long, default_value = "")]
    pub name: String,
    #[arg(long, default_value = "")]
    pub phone: String,
    #[arg(long, default_value = "")]
    pub address: String,
    #[arg(long, default_value = "")]
    pub notes: String,
}

impl LinkArgs {
    pub fn fields(&self) -> [(Field, &str); 8] {
        [
            (Field::Area, self.area.as_str()),
            (Field::CustomerName, self.name.as_str()),
            (Field::Phone, self.phone.as_str()),
            (Field::Date, self.date.as_str()),
            (Field::StartTime, self.start.as_str()),
            (Field::EndTime, self.end.as_str()),
            (Field::Address, self.address.as_str()),
            (Field::Notes, self.notes.as_str()),
        ]
    }
}

pub async fn run(config: &AppConfig, args: LinkArgs, open: bool) -> Result<()> {
    let mut form = FormController::from_config(config);
    for (field, value) in args.fields() {
        form.edit_field(field, value);
    }

    let link = form.submit_manual()?;

    println!(
        "{}",
        json!({
            "record": form.record(),
            "link": link.as_str(),
        })
    );

    if open {
        open_in_browser(link.as_str()).await;
    }
    Ok(())
}
