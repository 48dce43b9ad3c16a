use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Croissant,
}

impl Gender {
    /// Fallback picture used when a user supplies none.
    pub fn default_profile_picture(self) -> &'static str {
        match self {
            Gender::Male => "https://encrypted-tbn0.gstatic.com/images?q=tbn:ANd9GcQIf4R5qPKHPNMyAqV-FjS_OTBB8pfUV29Phg&s",
            Gender::Female => "https://img.freepik.com/premium-vector/default-female-user-profile-icon-vector-illustration_276184-169.jpg",
            Gender::Croissant => "https://cdn-icons-png.flaticon.com/512/7627/7627796.png",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Active,
    Suspended,
    Deactivated,
}

/// User record as exchanged with the `/users` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub password: String, // stored in plain text by the remote service
    pub gender: Gender,
    pub role: Role,
    pub profile_picture: String,
    pub description: String,
    pub status: Status,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    /// Fills in the gender's fallback picture when none was given.
    pub fn apply_default_picture(&mut self) {
        if self.profile_picture.is_empty() {
            self.profile_picture = self.gender.default_profile_picture().to_string();
        }
    }
}

/// Form input for creating or editing a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserDraft {
    pub name: String,
    pub username: String,
    pub password: String,
    pub gender: Gender,
    pub role: Role,
    pub profile_picture: String,
    pub description: String,
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown value: {}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! lowercase_enum_str {
    ($ty:ty { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariant(other.to_string())),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(match self {
                    $(Self::$variant => $text,)+
                })
            }
        }
    };
}

lowercase_enum_str!(Gender { Male => "male", Female => "female", Croissant => "croissant" });
lowercase_enum_str!(Role { Admin => "admin", User => "user" });
lowercase_enum_str!(Status { Active => "active", Suspended => "suspended", Deactivated => "deactivated" });
