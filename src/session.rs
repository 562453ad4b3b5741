use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Administrative role held by the acting principal, ordered by privilege
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Staff,
    Manager,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Staff => write!(f, "staff"),
            Role::Manager => write!(f, "manager"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "staff" => Ok(Role::Staff),
            "manager" => Ok(Role::Manager),
            "admin" | "administrator" | "owner" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// The authenticated principal every screen acts on behalf of
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub admin_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Session {
    pub fn allows(&self, required: Role) -> bool {
        self.role >= required
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!(" Admin ".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("manager".parse::<Role>(), Ok(Role::Manager));
        assert!("guest".parse::<Role>().is_err());
    }

    #[test]
    fn higher_roles_include_lower() {
        let session = Session {
            admin_id: Uuid::new_v4(),
            name: "Dana".into(),
            email: "dana@example.com".into(),
            role: Role::Manager,
        };
        assert!(session.allows(Role::Staff));
        assert!(session.allows(Role::Manager));
        assert!(!session.allows(Role::Admin));
    }
}
