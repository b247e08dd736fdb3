//! Roles, profiles and authenticated principals

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Unique user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of account a user holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Doctor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
        }
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patient" => Ok(Role::Patient),
            "doctor" => Ok(Role::Doctor),
            other => Err(Error::InvalidRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role together with the data only that role carries.
///
/// Serializes flat as `{"role": "doctor", "specialty": "..."}` or
/// `{"role": "patient"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Profile {
    Patient,
    Doctor { specialty: String },
}

impl Profile {
    /// Build a profile from a role and an optional specialty.
    ///
    /// Doctors need a non-blank specialty. A specialty given for a patient
    /// is dropped.
    pub fn new(role: Role, specialty: Option<String>) -> Result<Self, Error> {
        match role {
            Role::Patient => Ok(Profile::Patient),
            Role::Doctor => {
                let specialty = specialty
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .ok_or(Error::MissingSpecialty)?;
                Ok(Profile::Doctor { specialty })
            }
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Profile::Patient => Role::Patient,
            Profile::Doctor { .. } => Role::Doctor,
        }
    }

    pub fn specialty(&self) -> Option<&str> {
        match self {
            Profile::Patient => None,
            Profile::Doctor { specialty } => Some(specialty),
        }
    }
}

/// The authenticated identity attached to a session.
///
/// Always built on the server from a stored user record, never from
/// request input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: UserId,
    pub email: String,
    pub name: String,
    #[serde(flatten)]
    pub profile: Profile,
}

impl Principal {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn specialty(&self) -> Option<&str> {
        self.profile.specialty()
    }

    pub fn is_doctor(&self) -> bool {
        self.role() == Role::Doctor
    }

    pub fn is_patient(&self) -> bool {
        self.role() == Role::Patient
    }
}
