//! Environment variable interpolation for configuration files.

use crate::ConfigError;
use regex::Regex;

/// Resolves environment variables in a string.
///
/// Replaces `${VAR_NAME}` with the value of the environment variable
/// `VAR_NAME`. Supports default values with `${VAR_NAME:-default_value}`.
/// A referenced variable that is unset and has no default is a
/// validation error naming the variable.
///
/// Input strings are limited to 1MB.
pub fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last_end = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				}
			},
		};

		result.push_str(&input[last_end..full_match.start()]);
		result.push_str(&value);
		last_end = full_match.end();
	}
	result.push_str(&input[last_end..]);

	Ok(result)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("METAVERSE_TEST_HOST", "localhost");
		std::env::set_var("METAVERSE_TEST_PORT", "8545");

		let input = "rpc_url = \"http://${METAVERSE_TEST_HOST}:${METAVERSE_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "rpc_url = \"http://localhost:8545\"");

		std::env::remove_var("METAVERSE_TEST_HOST");
		std::env::remove_var("METAVERSE_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${METAVERSE_MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "private_key = \"${METAVERSE_UNSET_KEY}\"";
		let result = resolve_env_vars(input);
		assert!(result.is_err());
		assert!(result.unwrap_err().to_string().contains("METAVERSE_UNSET_KEY"));
	}

	#[test]
	fn test_text_without_placeholders_unchanged() {
		let input = "[network]\nrpc_url = \"http://localhost:8545\"\n";
		assert_eq!(resolve_env_vars(input).unwrap(), input);
	}
}
