//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted player name, in characters.
pub const MAX_PLAYER_NAME_LEN: usize = 32;

/// Validates that a player name is non-blank, reasonably short and printable.
///
/// # Examples
///
/// ```ignore
/// validate_player_name("Alice")  // Ok
/// validate_player_name("   ")    // Err - blank
/// validate_player_name("a\tb")   // Err - control character
/// ```
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("player_blank");
        err.message = Some("Player name must not be blank".into());
        return Err(err);
    }

    let len = name.chars().count();
    if len > MAX_PLAYER_NAME_LEN {
        let mut err = ValidationError::new("player_length");
        err.message = Some(
            format!("Player name must be at most {MAX_PLAYER_NAME_LEN} characters (got {len})")
                .into(),
        );
        return Err(err);
    }

    if name.chars().any(char::is_control) {
        let mut err = ValidationError::new("player_format");
        err.message = Some("Player name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a bid names a lot.
pub fn validate_lot_name(team: &str) -> Result<(), ValidationError> {
    if team.trim().is_empty() {
        let mut err = ValidationError::new("team_blank");
        err.message = Some("Team must name the open lot".into());
        return Err(err);
    }
    Ok(())
}
