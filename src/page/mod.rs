use std::collections::BTreeMap;
use std::fmt;

use futures::stream::FuturesUnordered;
use futures::StreamExt;

use crate::client::{ApiClient, Fetched};
use crate::model::{AuthResponse, Category, Endpoint, LoginRequest, RegisterRequest, Spot};
use crate::render::{self, Container};

pub const SECRET_LOGIN_ALERT: &str = "Please login to view secret spots";

/// Named text areas the buttons write into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Area {
    Health,
    Spots,
    Spot,
    Me,
    Register,
    Login,
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Area::Health => "health",
            Area::Spots => "spots",
            Area::Spot => "spot",
            Area::Me => "me",
            Area::Register => "register",
            Area::Login => "login",
        };
        f.write_str(name)
    }
}

/// Buttons that fire one fixed request and dump status and body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Button {
    Health,
    PublicSpots,
    NatureSpots,
    TrainerSpots,
    SecretSpots,
    ProtectedSpots,
    Me,
    SpotDetails(i64),
}

impl Button {
    pub fn endpoint(self) -> Endpoint {
        match self {
            Button::Health => Endpoint::Health,
            Button::PublicSpots => Endpoint::Spots,
            Button::NatureSpots => Endpoint::PublicCategory(Category::Nature),
            Button::TrainerSpots => Endpoint::PublicCategory(Category::OutdoorGym),
            Button::SecretSpots => Endpoint::Category(Category::Secret),
            Button::ProtectedSpots => Endpoint::AllSpots,
            Button::Me => Endpoint::Me,
            Button::SpotDetails(id) => Endpoint::Spot(id),
        }
    }

    pub fn area(self) -> Area {
        match self {
            Button::Health => Area::Health,
            Button::Me => Area::Me,
            Button::SpotDetails(_) => Area::Spot,
            _ => Area::Spots,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Load,
    Category(String),
    Press(Button),
    Register {
        email: String,
        password: String,
        confirm_password: String,
    },
    Login {
        email: String,
        password: String,
    },
    Logout,
}

/// What a finished handler wants done to the page.
#[derive(Clone, Debug, PartialEq)]
pub enum Update {
    Render(Vec<Spot>),
    Write(Area, String),
    Alert(String),
    /// The handler gave up; the page is left as it was.
    Failed(String),
}

/// The card container, the output areas and any alerts raised so far.
#[derive(Clone, Debug, Default)]
pub struct Page {
    container: Container,
    outputs: BTreeMap<Area, String>,
    alerts: Vec<String>,
    failures: Vec<String>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn output(&self, area: Area) -> Option<&str> {
        self.outputs.get(&area).map(|s| s.as_str())
    }

    pub fn outputs(&self) -> impl Iterator<Item = (Area, &str)> {
        self.outputs.iter().map(|(a, s)| (*a, s.as_str()))
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    /// Handlers that gave up during this run.
    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    pub fn apply(&mut self, update: Update) {
        match update {
            Update::Render(spots) => render::render_spots(&mut self.container, spots),
            Update::Write(area, text) => {
                self.outputs.insert(area, text);
            }
            Update::Alert(message) => self.alerts.push(message),
            Update::Failed(message) => self.failures.push(message),
        }
    }

    pub async fn dispatch(&mut self, client: &ApiClient, action: Action) {
        let update = perform(client, action).await;
        self.apply(update);
    }

    /// Fires every action at once and applies results as they land, so the
    /// last response to arrive wins any shared area.
    pub async fn dispatch_all(&mut self, client: &ApiClient, actions: Vec<Action>) {
        let mut pending = actions
            .into_iter()
            .map(|action| perform(client, action))
            .collect::<FuturesUnordered<_>>();
        while let Some(update) = pending.next().await {
            self.apply(update);
        }
    }
}

pub async fn perform(client: &ApiClient, action: Action) -> Update {
    match action {
        Action::Load => load_spots(client).await,
        Action::Category(label) => select_category(client, &label).await,
        Action::Press(button) => press(client, button).await,
        Action::Register {
            email,
            password,
            confirm_password,
        } => register(client, &email, &password, &confirm_password).await,
        Action::Login { email, password } => login(client, &email, &password).await,
        Action::Logout => logout(client).await,
    }
}

fn failed(message: String) -> Update {
    log::error!("{message}");
    Update::Failed(message)
}

fn spots_or_log(res: &Fetched, context: &str) -> Update {
    match res.spots() {
        Ok(spots) => Update::Render(spots),
        Err(e) => failed(format!("{context}: unexpected spot list: {e}")),
    }
}

pub async fn load_spots(client: &ApiClient) -> Update {
    log::info!("loading spots");
    let res = match client.fetch_endpoint(Endpoint::Spots, None).await {
        Ok(res) => res,
        Err(e) => return failed(format!("error loading spots: {e}")),
    };
    if !res.ok() {
        return failed(format!(
            "failed to load spots, status: {}",
            res.status.as_u16()
        ));
    }
    spots_or_log(&res, "load spots")
}

pub async fn select_category(client: &ApiClient, label: &str) -> Update {
    let category = match Category::from_label(label) {
        Ok(category) => category,
        Err(e) => return failed(e.to_string()),
    };
    let endpoint = category.endpoint();
    let res = match client.fetch_endpoint(endpoint, None).await {
        Ok(res) => res,
        Err(e) => return failed(format!("error loading category {category}: {e}")),
    };
    if res.ok() {
        return spots_or_log(&res, category.wire_key());
    }
    if category.is_privileged() {
        Update::Alert(SECRET_LOGIN_ALERT.to_string())
    } else {
        let message = format!("category {category} returned status {}", res.status.as_u16());
        log::warn!("{message}");
        Update::Failed(message)
    }
}

pub async fn press(client: &ApiClient, button: Button) -> Update {
    match client.fetch_endpoint(button.endpoint(), None).await {
        Ok(res) => Update::Write(button.area(), res.status_report()),
        Err(e) => failed(e.to_string()),
    }
}

pub async fn register(
    client: &ApiClient,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Update {
    let body = RegisterRequest {
        email,
        password,
        confirm_password,
    };
    let body = serde_json::to_value(body).unwrap_or_default();
    let res = match client.fetch_endpoint(Endpoint::Register, Some(body)).await {
        Ok(res) => res,
        Err(e) => return failed(e.to_string()),
    };
    let text = if res.ok() {
        let message = res
            .decode::<AuthResponse>()
            .map(|r| r.message)
            .unwrap_or_default();
        format!("Registered: {message}")
    } else {
        format!("Error: {}", res.error_text())
    };
    Update::Write(Area::Register, text)
}

pub async fn login(client: &ApiClient, email: &str, password: &str) -> Update {
    let body = serde_json::to_value(LoginRequest { email, password }).unwrap_or_default();
    let res = match client.fetch_endpoint(Endpoint::Login, Some(body)).await {
        Ok(res) => res,
        Err(e) => return failed(e.to_string()),
    };
    let text = if res.ok() {
        "Logged in".to_string()
    } else {
        format!("Login failed: {}", res.error_text())
    };
    Update::Write(Area::Login, text)
}

pub async fn logout(client: &ApiClient) -> Update {
    let res = match client.fetch_endpoint(Endpoint::Logout, None).await {
        Ok(res) => res,
        Err(e) => return failed(e.to_string()),
    };
    if res.ok() {
        Update::Alert("Logged out".to_string())
    } else {
        Update::Alert(format!("Logout failed: {}", res.body_value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buttons_write_into_their_areas() {
        assert_eq!(Button::Health.area(), Area::Health);
        assert_eq!(Button::SecretSpots.area(), Area::Spots);
        assert_eq!(Button::SpotDetails(9).area(), Area::Spot);
        assert_eq!(
            Button::TrainerSpots.endpoint().path(),
            "/spots/public/category/Lauko_treniruokliai"
        );
        assert!(Button::ProtectedSpots.endpoint().needs_session());
        assert!(!Button::PublicSpots.endpoint().needs_session());
    }

    #[test]
    fn alert_does_not_touch_container() {
        let mut page = Page::new();
        page.apply(Update::Render(vec![Spot {
            id: 1,
            name: "Pond".to_string(),
            ..Default::default()
        }]));
        page.apply(Update::Alert(SECRET_LOGIN_ALERT.to_string()));
        assert_eq!(page.container().len(), 1);
        assert_eq!(page.alerts(), &[SECRET_LOGIN_ALERT.to_string()]);
    }

    #[test]
    fn failure_is_recorded_without_touching_the_page() {
        let mut page = Page::new();
        page.apply(Update::Render(vec![Spot::default()]));
        page.apply(Update::Failed("failed to load spots, status: 500".to_string()));
        assert_eq!(page.container().len(), 1);
        assert!(page.alerts().is_empty());
        assert_eq!(page.failures(), &["failed to load spots, status: 500".to_string()]);
    }

    #[test]
    fn later_write_replaces_earlier_one() {
        let mut page = Page::new();
        page.apply(Update::Write(Area::Spots, "first".to_string()));
        page.apply(Update::Write(Area::Spots, "second".to_string()));
        assert_eq!(page.output(Area::Spots), Some("second"));
        assert_eq!(page.outputs().count(), 1);
    }
}
