//! Setups: named role lists for a given player count.
//!
//! A [`SetupRegistry`] is the read-only source of registered setups. Hosts
//! may also supply a custom setup, either as a comma-separated role list
//! (`Cop, Goon, Vanilla x3`) or as a small YAML document:
//!
//! ```yaml
//! name: my_setup
//! roles: [Vigilante, Goon, Vanilla x5]
//! night_start: true
//! ```

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::Deserialize;

use godfather_roles::{RegistryError, Role, RoleCatalog};

use crate::settings::MAX_PLAYERS;

/// A setup that could not be found, chosen, or built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SetupError {
    /// No registered setup has this name.
    #[error("Setup not found.")]
    NotFound(String),

    /// The setup is for a different number of players.
    #[error("Chosen setup needs {needed} players, you currently have {have}")]
    PlayerCountMismatch {
        /// Players the setup needs.
        needed: usize,
        /// Players signed up.
        have: usize,
    },

    /// No registered setup fits this many players.
    #[error("No possible setups found.")]
    NoneForCount(usize),

    /// The custom setup text could not be read.
    #[error("malformed setup: {reason}")]
    Malformed {
        /// What was wrong with it.
        reason: String,
    },

    /// A role name is not in the catalogue.
    #[error("unknown role `{0}` in setup")]
    UnknownRole(String),

    /// A unique role appears more than once.
    #[error("{0} is unique and can only appear once")]
    DuplicateUnique(String),
}

/// A named, ordered role list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setup {
    /// Setup name shown when the game starts.
    pub name: String,
    /// Canonical role names, one per player.
    pub roles: Vec<String>,
    /// Skip the first day and start at night 1.
    pub night_start: bool,
}

#[derive(Debug, Deserialize)]
struct CustomSetup {
    #[serde(default)]
    name: Option<String>,
    roles: Vec<String>,
    #[serde(default)]
    night_start: bool,
}

impl Setup {
    /// Build a setup from role names as written.
    pub fn new(name: impl Into<String>, roles: &[&str], night_start: bool) -> Self {
        Self {
            name: name.into(),
            roles: roles.iter().map(|&r| r.to_owned()).collect(),
            night_start,
        }
    }

    /// Number of players the setup seats.
    pub fn total_players(&self) -> usize {
        self.roles.len()
    }

    /// Read a host-supplied setup and validate it against the catalogue.
    pub fn parse_custom(text: &str, catalog: &RoleCatalog) -> Result<Self, SetupError> {
        let body = text
            .trim()
            .trim_start_matches("```yaml")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();
        if body.is_empty() {
            return Err(SetupError::Malformed {
                reason: String::from("no roles given"),
            });
        }

        let custom = if body.contains("roles:") {
            serde_yml::from_str::<CustomSetup>(body).map_err(|e| SetupError::Malformed {
                reason: e.to_string(),
            })?
        } else {
            CustomSetup {
                name: None,
                roles: body.split(',').map(str::to_owned).collect(),
                night_start: false,
            }
        };

        let mut roles = Vec::new();
        for entry in &custom.roles {
            let (name, count) = split_count(entry)?;
            roles.extend(std::iter::repeat_n(name.to_owned(), count));
        }
        let mut setup = Self {
            name: custom.name.unwrap_or_else(|| String::from("custom")),
            roles,
            night_start: custom.night_start,
        };
        setup.canonicalize(catalog)?;
        Ok(setup)
    }

    /// Check every role exists and unique roles appear once, rewriting
    /// aliases to canonical names.
    pub fn canonicalize(&mut self, catalog: &RoleCatalog) -> Result<(), SetupError> {
        if self.roles.is_empty() || self.roles.len() > MAX_PLAYERS {
            return Err(SetupError::Malformed {
                reason: format!("a setup needs between 1 and {MAX_PLAYERS} roles"),
            });
        }
        let mut seen_unique: Vec<&'static str> = Vec::new();
        for name in &mut self.roles {
            let role = create(catalog, name)?;
            if role.unique() {
                if seen_unique.contains(&role.name()) {
                    return Err(SetupError::DuplicateUnique(role.name().to_owned()));
                }
                seen_unique.push(role.name());
            }
            role.name().clone_into(name);
        }
        Ok(())
    }

    /// Fresh role instances in random seat order.
    pub fn roll<R: Rng + ?Sized>(
        &self,
        catalog: &RoleCatalog,
        rng: &mut R,
    ) -> Result<Vec<Box<dyn Role>>, SetupError> {
        let mut roles = self
            .roles
            .iter()
            .map(|name| create(catalog, name))
            .collect::<Result<Vec<_>, _>>()?;
        roles.shuffle(rng);
        Ok(roles)
    }
}

fn create(catalog: &RoleCatalog, name: &str) -> Result<Box<dyn Role>, SetupError> {
    catalog.create(name).map_err(|e| match e {
        RegistryError::UnknownRole(name) => SetupError::UnknownRole(name),
        other => SetupError::Malformed {
            reason: other.to_string(),
        },
    })
}

/// `Vanilla x3` is three Vanillas.
fn split_count(entry: &str) -> Result<(&str, usize), SetupError> {
    let entry = entry.trim();
    let Some((name, count)) = entry.rsplit_once([' ', '\t']) else {
        return Ok((entry, 1));
    };
    let Some(digits) = count.strip_prefix(['x', 'X']) else {
        return Ok((entry, 1));
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok((entry, 1));
    }
    match digits.parse::<usize>() {
        Ok(n) if (1..=MAX_PLAYERS).contains(&n) => Ok((name.trim(), n)),
        _ => Err(SetupError::Malformed {
            reason: format!("bad role count in `{entry}`"),
        }),
    }
}

/// Read-only source of registered setups.
pub trait SetupRegistry: core::fmt::Debug + Send + Sync {
    /// The setup with this name, compared case-insensitively.
    fn lookup(&self, name: &str) -> Option<&Setup>;

    /// Every setup seating exactly `players`.
    fn by_player_count(&self, players: usize) -> Vec<&Setup>;
}

/// An in-memory setup list.
#[derive(Debug, Clone, Default)]
pub struct StaticSetups {
    setups: Vec<Setup>,
}

impl StaticSetups {
    /// Wrap an existing list.
    pub const fn new(setups: Vec<Setup>) -> Self {
        Self { setups }
    }

    /// The built-in setups.
    pub fn standard() -> Self {
        Self::new(vec![
            Setup::new("mountainous3", &["Vanilla", "Vanilla", "Goon"], false),
            Setup::new("cop5", &["Cop", "Vanilla", "Vanilla", "Vanilla", "Goon"], false),
            Setup::new("doc5", &["Doctor", "Vanilla", "Vanilla", "Vanilla", "Goon"], false),
            Setup::new(
                "standard7",
                &["Cop", "Doctor", "Vanilla", "Vanilla", "Vanilla", "Godfather", "Goon"],
                false,
            ),
            Setup::new(
                "chaos7",
                &["Vigilante", "Escort", "Lookout", "Vanilla", "Serial Killer", "Goon", "Jester"],
                true,
            ),
            Setup::new(
                "classic9",
                &[
                    "Cop", "Doctor", "Lookout", "Vigilante", "Vanilla", "Vanilla", "Godfather",
                    "Framer", "Survivor",
                ],
                false,
            ),
        ])
    }

    /// Every setup, in registration order.
    pub fn all(&self) -> &[Setup] {
        &self.setups
    }
}

impl SetupRegistry for StaticSetups {
    fn lookup(&self, name: &str) -> Option<&Setup> {
        self.setups
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name.trim()))
    }

    fn by_player_count(&self, players: usize) -> Vec<&Setup> {
        self.setups
            .iter()
            .filter(|s| s.total_players() == players)
            .collect()
    }
}

/// Pick a setup for `players`: the named one if given, otherwise a random
/// one among those that fit.
pub fn find_setup<R: Rng + ?Sized>(
    registry: &dyn SetupRegistry,
    name: Option<&str>,
    players: usize,
    rng: &mut R,
) -> Result<Setup, SetupError> {
    if let Some(name) = name {
        let setup = registry
            .lookup(name)
            .ok_or_else(|| SetupError::NotFound(name.to_owned()))?;
        if setup.total_players() != players {
            return Err(SetupError::PlayerCountMismatch {
                needed: setup.total_players(),
                have: players,
            });
        }
        return Ok(setup.clone());
    }
    registry
        .by_player_count(players)
        .choose(rng)
        .map(|&s| s.clone())
        .ok_or(SetupError::NoneForCount(players))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn standard_setups_are_valid() {
        let catalog = RoleCatalog::standard();
        for setup in StaticSetups::standard().all() {
            let mut copy = setup.clone();
            copy.canonicalize(&catalog).unwrap();
            assert_eq!(&copy, setup, "{} is not canonical", setup.name);
        }
    }

    #[test]
    fn custom_list_expands_counts_and_aliases() {
        let catalog = RoleCatalog::standard();
        let setup = Setup::parse_custom("Cop, gf, Vanilla x3", &catalog).unwrap();
        assert_eq!(setup.name, "custom");
        assert_eq!(
            setup.roles,
            vec!["Cop", "Godfather", "Vanilla", "Vanilla", "Vanilla"]
        );
        assert!(!setup.night_start);
    }

    #[test]
    fn custom_yaml_keeps_name_and_flags() {
        let catalog = RoleCatalog::standard();
        let text = "```yaml\nname: dusk\nroles: [Vigilante, Goon, Vanilla x2]\nnight_start: true\n```";
        let setup = Setup::parse_custom(text, &catalog).unwrap();
        assert_eq!(setup.name, "dusk");
        assert_eq!(setup.total_players(), 4);
        assert!(setup.night_start);
    }

    #[test]
    fn custom_setup_rejects_unknown_roles() {
        let catalog = RoleCatalog::standard();
        let err = Setup::parse_custom("Cop, Mayor, Goon", &catalog).unwrap_err();
        assert_eq!(err, SetupError::UnknownRole(String::from("Mayor")));
    }

    #[test]
    fn custom_setup_rejects_duplicate_unique_roles() {
        let catalog = RoleCatalog::standard();
        let err = Setup::parse_custom("Godfather, Godfather, Cop", &catalog).unwrap_err();
        assert_eq!(err, SetupError::DuplicateUnique(String::from("Godfather")));
    }

    #[test]
    fn custom_setup_rejects_bad_counts_and_empty_text() {
        let catalog = RoleCatalog::standard();
        assert!(matches!(
            Setup::parse_custom("Vanilla x0, Goon", &catalog),
            Err(SetupError::Malformed { .. })
        ));
        assert!(matches!(
            Setup::parse_custom("``````", &catalog),
            Err(SetupError::Malformed { .. })
        ));
        assert!(matches!(
            Setup::parse_custom("Vanilla x18, Goon", &catalog),
            Err(SetupError::Malformed { .. })
        ));
    }

    #[test]
    fn named_setup_must_fit_the_player_count() {
        let setups = StaticSetups::standard();
        let mut rng = StdRng::seed_from_u64(7);
        let setup = find_setup(&setups, Some("COP5"), 5, &mut rng).unwrap();
        assert_eq!(setup.name, "cop5");
        assert_eq!(
            find_setup(&setups, Some("cop5"), 4, &mut rng),
            Err(SetupError::PlayerCountMismatch { needed: 5, have: 4 })
        );
        assert_eq!(
            find_setup(&setups, Some("nope"), 5, &mut rng),
            Err(SetupError::NotFound(String::from("nope")))
        );
    }

    #[test]
    fn unnamed_setup_is_chosen_among_those_that_fit() {
        let setups = StaticSetups::standard();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            let setup = find_setup(&setups, None, 5, &mut rng).unwrap();
            assert!(setup.name == "cop5" || setup.name == "doc5");
        }
        assert_eq!(
            find_setup(&setups, None, 4, &mut rng),
            Err(SetupError::NoneForCount(4))
        );
    }

    #[test]
    fn roll_creates_one_role_per_seat() {
        let catalog = RoleCatalog::standard();
        let setups = StaticSetups::standard();
        let setup = setups.lookup("standard7").unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let roles = setup.roll(&catalog, &mut rng).unwrap();
        let mut names: Vec<&str> = roles.iter().map(|r| r.name()).collect();
        names.sort_unstable();
        let mut expected: Vec<&str> = setup.roles.iter().map(String::as_str).collect();
        expected.sort_unstable();
        assert_eq!(names, expected);
    }
}
