//! Privilege tiers

use std::fmt;

use serde::Deserialize;

/// Named privilege tier, ordered from most to least privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    UserLvl1,
    UserLvl2,
    UserLvl3,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::UserLvl1, Role::UserLvl2, Role::UserLvl3];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::UserLvl1 => "user_lvl1",
            Role::UserLvl2 => "user_lvl2",
            Role::UserLvl3 => "user_lvl3",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_privilege() {
        assert!(Role::Admin < Role::UserLvl1);
        assert!(Role::UserLvl2 < Role::UserLvl3);
    }

    #[test]
    fn display_uses_config_names() {
        let names: Vec<String> = Role::ALL.iter().map(Role::to_string).collect();
        assert_eq!(names, ["admin", "user_lvl1", "user_lvl2", "user_lvl3"]);
    }
}
