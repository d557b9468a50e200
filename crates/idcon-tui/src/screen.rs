//! Screen identifiers and tab order.

use std::fmt;

/// One directory screen, navigable by number keys 1-9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    #[default]
    Users,
    Groups,
    Roles,
    Realms,
    Schemas,
    Applications,
    Implementations,
    Domains,
    Parameters,
}

impl ScreenId {
    /// All screens in tab-bar order.
    pub const ALL: [ScreenId; 9] = [
        Self::Users,
        Self::Groups,
        Self::Roles,
        Self::Realms,
        Self::Schemas,
        Self::Applications,
        Self::Implementations,
        Self::Domains,
        Self::Parameters,
    ];

    fn position(self) -> usize {
        Self::ALL.iter().position(|&s| s == self).unwrap_or(0)
    }

    /// Number key (1-9) of this screen.
    pub fn number(self) -> u8 {
        // ALL has nine entries
        u8::try_from(self.position() + 1).unwrap_or(0)
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.get(usize::from(n).checked_sub(1)?).copied()
    }

    /// Next screen in tab order (wraps around).
    pub fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    /// Previous screen in tab order (wraps around).
    pub fn prev(self) -> Self {
        Self::ALL[(self.position() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Users => "Users",
            Self::Groups => "Groups",
            Self::Roles => "Roles",
            Self::Realms => "Realms",
            Self::Schemas => "Schemas",
            Self::Applications => "Applications",
            Self::Implementations => "Implementations",
            Self::Domains => "Domains",
            Self::Parameters => "Parameters",
        }
    }

    /// Compact label for narrow terminals (< 120 cols).
    pub fn label_short(self) -> &'static str {
        match self {
            Self::Users => "Usr",
            Self::Groups => "Grp",
            Self::Roles => "Role",
            Self::Realms => "Realm",
            Self::Schemas => "Sch",
            Self::Applications => "App",
            Self::Implementations => "Impl",
            Self::Domains => "Dom",
            Self::Parameters => "Par",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_keys_round_trip_through_tab_order() {
        for id in ScreenId::ALL {
            assert_eq!(ScreenId::from_number(id.number()), Some(id));
        }
        assert_eq!(ScreenId::from_number(0), None);
        assert_eq!(ScreenId::Parameters.next(), ScreenId::Users);
        assert_eq!(ScreenId::Users.prev(), ScreenId::Parameters);
    }
}
