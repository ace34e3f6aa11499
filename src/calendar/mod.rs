pub mod link;
pub use link::{
    CalendarLink, InvalidScheduleError, LinkMode, build_calendar_link, event_dates,
    event_details, event_title,
};
