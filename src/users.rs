//! The staff directory: who works at the office and under which profile.
//!
//! Only directory data is kept. Credentials never enter a [`UserRecord`];
//! a `password` column in imported rows is ignored.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{Error, Result},
    filter::Facet,
    record::{
        format_date,
        optional_str,
        required_id,
        row_object,
        timestamp_field,
    },
};

/// Permission profile of a staff member.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum UserRole {
    #[serde(rename = "Administrador")]
    Administrator,
    #[default]
    #[serde(rename = "Atendente")]
    Attendant,
    #[serde(rename = "Financeiro")]
    Finance,
}

impl UserRole {
    pub const ALL: [UserRole; 3] =
        [Self::Administrator, Self::Attendant, Self::Finance];

    pub fn label(self) -> &'static str {
        match self {
            Self::Administrator => "Administrador",
            Self::Attendant => "Atendente",
            Self::Finance => "Financeiro",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        let alias = match wanted.as_str() {
            "admin" | "administrator" => Some(Self::Administrator),
            "attendant" => Some(Self::Attendant),
            "finance" => Some(Self::Finance),
            _ => None,
        };
        alias
            .or_else(|| {
                Self::ALL
                    .into_iter()
                    .find(|r| r.label().to_lowercase() == wanted)
            })
            .ok_or_else(|| format!("unknown user role '{}'", s.trim()))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum UserStatus {
    #[default]
    Ativo,
    Inativo,
}

impl UserStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Ativo => "Ativo",
            Self::Inativo => "Inativo",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ativo" | "active" => Ok(Self::Ativo),
            "inativo" | "inactive" => Ok(Self::Inativo),
            other => Err(format!("unknown user status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
    pub status: UserStatus,
    /// Seconds since the Unix epoch.
    #[serde(default)]
    pub created_at: u64,
}

impl UserRecord {
    /// Map a raw `app_users` row into a directory entry.
    pub fn from_row(row: &Value) -> Result<Self> {
        let obj = row_object(row)?;

        let id = required_id(obj)?;
        let name = optional_str(obj, "name").ok_or_else(|| {
            Error::InvalidRecord {
                field: "name",
                reason: "missing or empty".into(),
            }
        })?;
        let role = match optional_str(obj, "role") {
            Some(r) => r.parse().map_err(|reason| Error::InvalidRecord {
                field: "role",
                reason,
            })?,
            None => UserRole::default(),
        };
        let status = match optional_str(obj, "status") {
            Some(s) => s.parse().map_err(|reason| Error::InvalidRecord {
                field: "status",
                reason,
            })?,
            None => UserStatus::default(),
        };

        Ok(Self {
            id,
            name,
            email: optional_str(obj, "email").unwrap_or_default(),
            role,
            status,
            created_at: timestamp_field(obj, "created_at"),
        })
    }

    /// Creation date as `dd/mm/YYYY`, or `-` when unknown.
    pub fn created_date(&self) -> String {
        format_date(self.created_at)
    }
}

/// Search box plus the profile and status selectors of the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub query: String,
    pub role: Facet<UserRole>,
    pub status: Facet<UserStatus>,
}

/// Case-insensitive match over name, e-mail and profile label.
pub fn matches_user(user: &UserRecord, filter: &UserFilter) -> bool {
    let term = filter.query.to_lowercase();
    let text_hit = term.is_empty()
        || [user.name.as_str(), user.email.as_str(), user.role.label()]
            .into_iter()
            .any(|field| field.to_lowercase().contains(&term));

    text_hit
        && filter.role.admits(|r| *r == user.role)
        && filter.status.admits(|s| *s == user.status)
}

pub fn filter_users<'a>(
    users: &'a [UserRecord],
    filter: &UserFilter,
) -> Vec<&'a UserRecord> {
    users.iter().filter(|u| matches_user(u, filter)).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn user(id: &str, name: &str, email: &str, role: UserRole) -> UserRecord {
        UserRecord {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
            status: UserStatus::Ativo,
            created_at: 0,
        }
    }

    fn directory() -> Vec<UserRecord> {
        vec![
            user("1", "Mariana Costa", "mariana@cartorio.com", UserRole::Administrator),
            user("2", "Paulo Lima", "paulo@cartorio.com", UserRole::Attendant),
            UserRecord {
                status: UserStatus::Inativo,
                ..user("3", "Rita Alves", "rita@cartorio.com", UserRole::Finance)
            },
        ]
    }

    fn ids<'a>(users: Vec<&'a UserRecord>) -> Vec<&'a str> {
        users.into_iter().map(|u| u.id.as_str()).collect()
    }

    #[test]
    fn role_parses_labels_and_aliases() {
        assert_eq!(
            "financeiro".parse::<UserRole>().unwrap(),
            UserRole::Finance
        );
        assert_eq!(
            "admin".parse::<UserRole>().unwrap(),
            UserRole::Administrator
        );
        assert!("Tabelião".parse::<UserRole>().is_err());
    }

    #[test]
    fn from_row_drops_password() {
        let row = json!({
            "id": "u1",
            "name": "Mariana Costa",
            "email": "mariana@cartorio.com",
            "password": "segredo",
            "role": "Administrador",
            "status": "Ativo",
            "created_at": "2024-06-03T12:00:00Z"
        });
        let u = UserRecord::from_row(&row).unwrap();
        assert_eq!(u.role, UserRole::Administrator);
        assert_eq!(u.created_date(), "03/06/2024");

        let value = serde_json::to_value(&u).unwrap();
        assert!(value.get("password").is_none());
        assert!(!value.to_string().contains("segredo"));
    }

    #[test]
    fn from_row_defaults_and_errors() {
        let u = UserRecord::from_row(&json!({ "id": 7, "name": "Paulo" }))
            .unwrap();
        assert_eq!(u.id, "7");
        assert_eq!(u.email, "");
        assert_eq!(u.role, UserRole::Attendant);
        assert_eq!(u.status, UserStatus::Ativo);
        assert_eq!(u.created_date(), "-");

        let bad = json!({ "id": "1", "name": "X", "role": "Tabelião" });
        assert!(matches!(
            UserRecord::from_row(&bad).unwrap_err(),
            Error::InvalidRecord { field: "role", .. }
        ));
    }

    #[test]
    fn search_covers_name_email_and_role() {
        let users = directory();
        let by = |q: &str| filter_users(&users, &UserFilter {
            query: q.into(),
            ..Default::default()
        });

        assert_eq!(ids(by("MARIANA")), ["1"]);
        assert_eq!(ids(by("paulo@")), ["2"]);
        assert_eq!(ids(by("financ")), ["3"]);
        assert_eq!(ids(by("cartorio.com")), ["1", "2", "3"]);
        assert!(by("nobody").is_empty());
    }

    #[test]
    fn facets_combine_with_search() {
        let users = directory();
        let active = UserFilter {
            query: "cartorio".into(),
            role: Facet::All,
            status: Facet::Only(UserStatus::Ativo),
        };
        assert_eq!(ids(filter_users(&users, &active)), ["1", "2"]);

        let finance_active = UserFilter {
            role: Facet::Only(UserRole::Finance),
            ..active
        };
        assert!(filter_users(&users, &finance_active).is_empty());
    }
}
