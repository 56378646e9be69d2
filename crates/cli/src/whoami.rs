// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pretty-printer for the identity stored in the token cache.

use crate::claims;
use crate::error::LoginError;

const TEAM_PREFIX: &str = "team-";

/// Render name and group belongings from the cached raw token, if any.
pub fn report(raw: Option<&str>) -> Result<String, LoginError> {
    let Some(raw) = raw else {
        return Ok("No token found in storage - make sure to first login".to_owned());
    };

    let token_claims = claims::extract(raw)?;
    let groups = token_claims.groups();
    let teams: Vec<String> = groups
        .iter()
        .map(|g| g.to_lowercase())
        .filter(|g| g.starts_with(TEAM_PREFIX))
        .collect();

    let mut output = format!(
        "username: {}\n",
        token_claims.subject.as_deref().unwrap_or("<unknown>")
    );
    output.push_str("groups: [\n");
    for group in groups {
        output.push_str("  ");
        output.push_str(group);
        output.push_str(",\n");
    }
    output.push_str("]\n");

    let belonging = format!("Determined team belonging: {}", teams.join(", "));
    output.push_str(&"-".repeat(belonging.len()));
    output.push('\n');
    output.push_str(&belonging);

    Ok(output)
}

#[cfg(test)]
#[path = "whoami_tests.rs"]
mod tests;
