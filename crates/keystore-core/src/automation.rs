//! Browser automation strategies for supported sites.
//!
//! Automation is an external collaborator: the store decrypts a credential
//! and drives a live browser session through the narrow [`BrowserSession`]
//! interface. Strategies form a closed set ([`AutomationKind`]), one
//! variant per supported site, selected by the site's `config.toml` rather
//! than looked up by name at runtime.

use serde::{Deserialize, Serialize};

use crate::error::{KeystoreError, Result};

/// The narrow browser interface a strategy drives.
///
/// The production implementation wraps a WebDriver session; tests use a
/// scripted stand-in. Element identifiers are DOM ids.
pub trait BrowserSession {
    fn navigate(&mut self, url: &str) -> Result<()>;
    fn fill(&mut self, element_id: &str, value: &str) -> Result<()>;
    fn click(&mut self, element_id: &str) -> Result<()>;
}

/// Performs login/logout/password-change against a live site.
pub trait AutomationStrategy {
    /// Log in with the given username and decrypted secret.
    fn login(&mut self, username: &str, secret: &[u8]) -> Result<()>;

    /// Log out of the current session.
    fn logout(&mut self) -> Result<()>;

    /// Change the account password from `old` to `new`.
    fn change_password(&mut self, username: &str, old: &[u8], new: &[u8]) -> Result<()>;
}

/// Closed set of supported automation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutomationKind {
    Facebook,
}

impl AutomationKind {
    /// Construct this variant's strategy over a live browser session.
    pub fn strategy(self, session: Box<dyn BrowserSession>) -> Box<dyn AutomationStrategy> {
        match self {
            AutomationKind::Facebook => Box::new(Facebook { session }),
        }
    }
}

fn secret_text(secret: &[u8]) -> Result<&str> {
    std::str::from_utf8(secret)
        .map_err(|_| KeystoreError::Automation("Secret is not valid UTF-8".to_string()))
}

/// Facebook automation.
struct Facebook {
    session: Box<dyn BrowserSession>,
}

impl AutomationStrategy for Facebook {
    fn login(&mut self, username: &str, secret: &[u8]) -> Result<()> {
        let secret = secret_text(secret)?;
        self.session.navigate("https://www.facebook.com")?;
        self.session.fill("email", username)?;
        self.session.fill("pass", secret)?;
        self.session.click("loginbutton")
    }

    fn logout(&mut self) -> Result<()> {
        self.session.navigate("https://www.facebook.com")?;
        self.session.click("show_me_how_logout_1")
    }

    fn change_password(&mut self, _username: &str, old: &[u8], new: &[u8]) -> Result<()> {
        let old = secret_text(old)?;
        let new = secret_text(new)?;
        self.session
            .navigate("https://www.facebook.com/settings?tab=account&section=password&view")?;
        self.session.fill("password_old", old)?;
        self.session.fill("password_new", new)?;
        self.session.fill("password_confirm", new)
    }
}
