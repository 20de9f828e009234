use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Spot {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub role: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub user: Option<User>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Nature,
    OutdoorGym,
    Secret,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CategoryError {
    #[error("unknown category '{label}', expected one of: Gamta, Lauko treniruokliai, Slaptos vietos")]
    Unknown { label: String },
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Nature, Category::OutdoorGym, Category::Secret];

    /// Resolves a link label (or a wire key) to a category.
    pub fn from_label(label: &str) -> Result<Self, CategoryError> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.label() == label || c.wire_key() == label)
            .ok_or_else(|| CategoryError::Unknown {
                label: label.to_string(),
            })
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Nature => "Gamta",
            Category::OutdoorGym => "Lauko treniruokliai",
            Category::Secret => "Slaptos vietos",
        }
    }

    pub fn wire_key(self) -> &'static str {
        match self {
            Category::Nature => "Gamta",
            Category::OutdoorGym => "Lauko_treniruokliai",
            Category::Secret => "Slaptos_vietos",
        }
    }

    /// Secret spots are only served to an authenticated session.
    pub fn is_privileged(self) -> bool {
        matches!(self, Category::Secret)
    }

    pub fn endpoint(self) -> Endpoint {
        if self.is_privileged() {
            Endpoint::Category(self)
        } else {
            Endpoint::PublicCategory(self)
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Every backend route this client talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Spots,
    AllSpots,
    Spot(i64),
    PublicCategory(Category),
    Category(Category),
    Health,
    Register,
    Login,
    Me,
    Logout,
}

impl Endpoint {
    pub fn path(self) -> String {
        match self {
            Endpoint::Spots => "/spots/".to_string(),
            Endpoint::AllSpots => "/spots/all".to_string(),
            Endpoint::Spot(id) => format!("/spots/{id}"),
            Endpoint::PublicCategory(c) => format!("/spots/public/category/{}", c.wire_key()),
            Endpoint::Category(c) => format!("/spots/category/{}", c.wire_key()),
            Endpoint::Health => "/public/health".to_string(),
            Endpoint::Register => "/register".to_string(),
            Endpoint::Login => "/login".to_string(),
            Endpoint::Me => "/me".to_string(),
            Endpoint::Logout => "/logout".to_string(),
        }
    }

    pub fn method(self) -> reqwest::Method {
        match self {
            Endpoint::Register | Endpoint::Login => reqwest::Method::POST,
            _ => reqwest::Method::GET,
        }
    }

    /// Whether requests to the route run with credentials. Session-checked
    /// routes need the cookie sent; the guest-only `Register` and `Login`
    /// routes need it so the session cookie they hand out gets stored.
    pub fn needs_session(self) -> bool {
        matches!(
            self,
            Endpoint::AllSpots
                | Endpoint::Category(_)
                | Endpoint::Register
                | Endpoint::Login
                | Endpoint::Me
                | Endpoint::Logout
        )
    }
}
