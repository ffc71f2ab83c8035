//! The closed role catalogue.
//!
//! Role instances are created by name. Names are matched case-insensitively
//! and a handful of common abbreviations are accepted.

use crate::error::RegistryError;
use crate::faction::Factions;
use crate::role::Role;
use crate::roles::mafia::{Framer, Godfather, Goon, Janitor};
use crate::roles::neutral::{Jester, SerialKiller, Survivor};
use crate::roles::town::{
    Cop, Doctor, Escort, Lookout, Retributionist, SuperSaint, Vanilla, Veteran, Vigilante,
};

/// Roles that settle a one-on-one endgame. When the last two living players
/// both hold a role in this list, the one with the lower index wins.
pub const STALEMATE_PRIORITY_ORDER: [&str; 4] = ["Serial Killer", "Vigilante", "Godfather", "Goon"];

/// Every role name the catalogue can create, in listing order.
pub const ROLE_NAMES: [&str; 16] = [
    "Vanilla",
    "Cop",
    "Doctor",
    "Lookout",
    "Escort",
    "Vigilante",
    "Veteran",
    "Retributionist",
    "Super Saint",
    "Goon",
    "Godfather",
    "Framer",
    "Janitor",
    "Jester",
    "Survivor",
    "Serial Killer",
];

/// Creates role instances bound to one shared faction set.
#[derive(Debug, Clone)]
pub struct RoleCatalog {
    factions: Factions,
}

impl Default for RoleCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl RoleCatalog {
    /// The standard catalogue.
    pub fn standard() -> Self {
        Self {
            factions: Factions::standard(),
        }
    }

    /// The shared factions.
    pub const fn factions(&self) -> &Factions {
        &self.factions
    }

    /// Every role name, in listing order.
    pub const fn names(&self) -> &'static [&'static str] {
        &ROLE_NAMES
    }

    /// Create a fresh instance of the named role.
    pub fn create(&self, name: &str) -> Result<Box<dyn Role>, RegistryError> {
        let f = &self.factions;
        let role: Box<dyn Role> = match name.trim().to_lowercase().as_str() {
            "vanilla" | "vt" => Box::new(Vanilla::new(f.town.clone())),
            "cop" => Box::new(Cop::new(f.town.clone())),
            "doctor" | "doc" => Box::new(Doctor::new(f.town.clone())),
            "lookout" | "lo" => Box::new(Lookout::new(f.town.clone())),
            "escort" => Box::new(Escort::new(f.town.clone())),
            "vigilante" | "vigi" | "vig" => Box::new(Vigilante::new(f.town.clone())),
            "veteran" | "vet" => Box::new(Veteran::new(f.town.clone())),
            "retributionist" | "retri" | "ret" => Box::new(Retributionist::new(f.town.clone())),
            "super saint" | "supersaint" | "ss" => Box::new(SuperSaint::new(f.town.clone())),
            "goon" => Box::new(Goon::new(f.mafia.clone())),
            "godfather" | "gf" => Box::new(Godfather::new(f.mafia.clone())),
            "framer" => Box::new(Framer::new(f.mafia.clone())),
            "janitor" | "jani" => Box::new(Janitor::new(f.mafia.clone())),
            "jester" => Box::new(Jester::new(f.jester.clone())),
            "survivor" | "surv" => Box::new(Survivor::new(f.survivor.clone())),
            "serial killer" | "serialkiller" | "sk" => {
                Box::new(SerialKiller::new(f.serial_killer.clone()))
            }
            _ => return Err(RegistryError::UnknownRole(name.to_owned())),
        };
        Ok(role)
    }

    /// Stalemate index of a role name, if it has one.
    pub fn stalemate_rank(name: &str) -> Option<usize> {
        STALEMATE_PRIORITY_ORDER.iter().position(|&n| n == name)
    }
}
