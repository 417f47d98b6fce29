//! Prints the current month of the server, with the days that have appointment slots
//!
//! Usage: `APPOINTCHED_URL=https://appointched.example.com APPOINTCHED_ROLE=staff month [page]`

use std::sync::Arc;

use appointched::calendar::{self, CalendarMonth};
use appointched::client::{Client, Role};
use appointched::config;
use appointched::store::SlotStore;
use appointched::utils::print_month;
use appointched::Error;

#[tokio::main]
async fn main() {
    env_logger::init();

    let client = match client_from_env() {
        Ok(client) => client,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        },
    };
    if let Some(page) = std::env::args().nth(1) {
        if let Err(err) = client.bootstrap_csrf(&page).await {
            log::warn!("Unable to read the CSRF token from {}: {}", page, err);
        }
    }

    let today = calendar::today(config::utc_offset_seconds());
    let month = CalendarMonth::from_date(today);
    let store = SlotStore::new(Arc::new(client));
    let (from, to) = month.range();
    if let Some(err) = store.fetch_range(&from, &to).await.error() {
        println!("Unable to fetch the appointments: {}", err.user_message());
    }

    print_month(&month, &month.grid(&store.slots(), today));
    for slot in store.slots() {
        println!("  {}\t{}\t{}", slot.day(), slot.time_label(), slot.title());
    }
}

fn client_from_env() -> Result<Client, Error> {
    let url = std::env::var("APPOINTCHED_URL")
        .map_err(|_| Error::validation("APPOINTCHED_URL must be set"))?;
    let role: Role = std::env::var("APPOINTCHED_ROLE")
        .unwrap_or_else(|_| "client".to_string())
        .parse()?;
    Client::new(&url, role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_environment_is_an_error() {
        std::env::remove_var("APPOINTCHED_URL");
        assert!(matches!(client_from_env(), Err(err) if err.is_validation()));

        std::env::set_var("APPOINTCHED_URL", "not a url");
        std::env::set_var("APPOINTCHED_ROLE", "staff");
        assert!(matches!(client_from_env(), Err(Error::InvalidUrl(_))));

        std::env::set_var("APPOINTCHED_URL", "https://appointched.example.gov");
        std::env::set_var("APPOINTCHED_ROLE", "guest");
        assert!(matches!(client_from_env(), Err(err) if err.is_validation()));

        std::env::set_var("APPOINTCHED_ROLE", "staff");
        assert!(matches!(client_from_env(), Ok(client) if client.role() == Role::Staff));
    }
}
