use anyhow::{Context, Result};
use regex::{Captures, Regex};
use std::env;
use tracing::{debug, warn};

const ENV_VAR_PATTERN: &str = r"\$\{(\w+)\}|\$(\w+)";

fn env_var_regex() -> Result<Regex> {
    Regex::new(ENV_VAR_PATTERN).context("Invalid environment variable pattern")
}

/// Substitute environment variables in the format ${VAR_NAME} or $VAR_NAME.
///
/// Unset variables are left in place so validation can report them.
pub fn substitute_env_vars(content: &str) -> Result<String> {
    substitute_with(content, |name| env::var(name).ok())
}

/// Substitution with a caller-supplied lookup
pub fn substitute_with<F>(content: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let re = env_var_regex()?;
    let mut missing_vars = Vec::new();

    let result = re.replace_all(content, |caps: &Captures| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();

        match lookup(name) {
            Some(value) => {
                debug!(var = name, "Substituting environment variable");
                value
            }
            None => {
                warn!("Environment variable '{}' not set", name);
                missing_vars.push(name.to_string());
                caps[0].to_string()
            }
        }
    });

    if !missing_vars.is_empty() {
        debug!(
            "Environment variables not set (may fail parsing or validation): {:?}",
            missing_vars
        );
    }

    Ok(result.into_owned())
}

/// Check if a string contains unresolved environment variable placeholders
pub fn has_unresolved_env_vars(content: &str) -> bool {
    env_var_regex().map(|re| re.is_match(content)).unwrap_or(false)
}
