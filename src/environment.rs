use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::{DEFAULT_ENVIRONMENT, ENV_VAR};
use crate::error::HarnessError;

/// A named Magic Suite deployment target. Exactly one is active per run,
/// resolved from `MS_ENV` with `alpha2` as the canonical default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Alpha,
    Alpha2,
    Alpha3,
    Test,
    Test2,
    Beta,
    Staging,
    Ps,
    Production,
}

impl Environment {
    pub const ALL: &'static [Environment] = &[
        Environment::Alpha,
        Environment::Alpha2,
        Environment::Alpha3,
        Environment::Test,
        Environment::Test2,
        Environment::Beta,
        Environment::Staging,
        Environment::Ps,
        Environment::Production,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Alpha => "alpha",
            Environment::Alpha2 => "alpha2",
            Environment::Alpha3 => "alpha3",
            Environment::Test => "test",
            Environment::Test2 => "test2",
            Environment::Beta => "beta",
            Environment::Staging => "staging",
            Environment::Ps => "ps",
            Environment::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Active environment for this run: `MS_ENV` if set (unknown values are
    /// an error, not a silent fallback), else the canonical default.
    pub fn from_env() -> Result<Environment, HarnessError> {
        match std::env::var(ENV_VAR) {
            Ok(value) => value.parse(),
            Err(_) => Ok(DEFAULT_ENVIRONMENT),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Environment::ALL
            .iter()
            .find(|env| env.as_str() == s)
            .copied()
            .ok_or_else(|| HarnessError::UnknownEnvironment(s.to_string()))
    }
}

/// One Magic Suite sub-application. Each owns a fixed base subdomain, except
/// `special` which groups the environment-invariant utility URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Product {
    Www,
    Data,
    Alert,
    Report,
    Docs,
    Admin,
    Connect,
    Special,
}

impl Product {
    pub const ALL: &'static [Product] = &[
        Product::Www,
        Product::Data,
        Product::Alert,
        Product::Report,
        Product::Docs,
        Product::Admin,
        Product::Connect,
        Product::Special,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Product::Www => "www",
            Product::Data => "data",
            Product::Alert => "alert",
            Product::Report => "report",
            Product::Docs => "docs",
            Product::Admin => "admin",
            Product::Connect => "connect",
            Product::Special => "special",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Product {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Product::ALL
            .iter()
            .find(|product| product.as_str() == s)
            .copied()
            .ok_or_else(|| HarnessError::UnknownProduct(s.to_string()))
    }
}

/// Permission tier a captured session belongs to. Determines which storage
/// state file is loaded and which role-gated UI elements a test expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Default,
    RegularUser,
    TenantAdmin,
    SuperAdmin,
    UberAdmin,
}

impl Role {
    pub const ALL: &'static [Role] = &[
        Role::Default,
        Role::RegularUser,
        Role::TenantAdmin,
        Role::SuperAdmin,
        Role::UberAdmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Default => "default",
            Role::RegularUser => "regular-user",
            Role::TenantAdmin => "tenant-admin",
            Role::SuperAdmin => "super-admin",
            Role::UberAdmin => "uber-admin",
        }
    }

    /// File stem under `.auth/`. The default role keeps the historical
    /// `user.json` name; every other role uses its kebab-case tag.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Role::Default => "user",
            other => other.as_str(),
        }
    }

    /// Whether sessions for this role should see the Super Admin navigation
    /// tab. Exactly one expectation holds per role; a page can never satisfy
    /// both the present and absent assertions for the same session.
    pub fn sees_super_admin_nav(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::UberAdmin)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Default => "Default User",
            Role::RegularUser => "Regular User",
            Role::TenantAdmin => "Tenant Admin",
            Role::SuperAdmin => "Super Admin",
            Role::UberAdmin => "Uber Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = HarnessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .iter()
            .find(|role| role.as_str() == s)
            .copied()
            .ok_or_else(|| HarnessError::UnknownRole(s.to_string()))
    }
}
