use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },

    #[error("invalid server address: {addr}")]
    InvalidAddr { addr: String },

    #[error(transparent)]
    Other(#[from] config::ConfigError),
}

/// Map a config field path like `provider.api_key` to the environment
/// variable the operator has to set.
pub fn to_env_var(field: &str) -> String {
    format!("SAFEE_{}", field.replace('.', "__").to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_env_var() {
        assert_eq!(to_env_var("provider.api_key"), "SAFEE_PROVIDER__API_KEY");
        assert_eq!(to_env_var("api_key"), "SAFEE_API_KEY");
    }
}
