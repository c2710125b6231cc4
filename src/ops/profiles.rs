//! Profile selection.

use thiserror::Error;

/// Profile used by install and uninstall when no profile flag is given.
pub const INSTALL_PROFILE: &str = "release";

/// What to select when no profile flag is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileDefault {
    /// Every declared profile (build, run, test, clean).
    AllDeclared,
    /// A single profile (install, uninstall).
    Only(String),
}

impl ProfileDefault {
    pub fn install() -> Self {
        ProfileDefault::Only(INSTALL_PROFILE.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile `{name}` is not declared by this project (declared: {})", .declared.join(", "))]
    Unknown { name: String, declared: Vec<String> },

    #[error(
        "this project does not declare a `{name}` profile; select one explicitly with {}",
        flag_list(.declared)
    )]
    UndeclaredDefault { name: String, declared: Vec<String> },
}

fn flag_list(profiles: &[String]) -> String {
    profiles
        .iter()
        .map(|p| format!("--{}", p))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Select the profiles an operation runs under.
///
/// `flags` pairs each profile flag with whether it was given. The result
/// is ordered as the profiles are declared.
pub fn select_profiles(
    flags: &[(String, bool)],
    declared: &[&str],
    default: ProfileDefault,
) -> Result<Vec<String>, ProfileError> {
    let to_owned = || declared.iter().map(|p| p.to_string()).collect::<Vec<_>>();

    let mut requested = Vec::new();
    for (name, set) in flags {
        if !set {
            continue;
        }
        if !declared.contains(&name.as_str()) {
            return Err(ProfileError::Unknown {
                name: name.clone(),
                declared: to_owned(),
            });
        }
        requested.push(name.as_str());
    }

    let selected: Vec<String> = if !requested.is_empty() {
        declared
            .iter()
            .filter(|p| requested.contains(*p))
            .map(|p| p.to_string())
            .collect()
    } else {
        match default {
            ProfileDefault::AllDeclared => to_owned(),
            ProfileDefault::Only(name) => {
                if !declared.contains(&name.as_str()) {
                    return Err(ProfileError::UndeclaredDefault {
                        name,
                        declared: to_owned(),
                    });
                }
                vec![name]
            }
        }
    };

    tracing::debug!("selected profiles: {:?}", selected);
    Ok(selected)
}
