use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Which party the session is acting as.
///
/// The role decides which account signs contract calls.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Role {
    /// Read-only view bound to the first discovered account.
    #[default]
    Viewer,
    Employer,
    Freelancer,
}

impl Role {
    /// Human label used in menus.
    pub fn label(self) -> &'static str {
        match self {
            Role::Viewer => "Viewer",
            Role::Employer => "Employer",
            Role::Freelancer => "Freelancer",
        }
    }
}
