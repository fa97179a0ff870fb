use crate::cli::actions::Action;
use crate::cli::globals::GlobalArgs;
use crate::mailer::SmtpConfig;
use anyhow::Result;
use secrecy::SecretString;

/// Map validated CLI matches to an action plus the shared settings.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<(Action, GlobalArgs)> {
    let action = Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        dsn: matches
            .get_one("dsn")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --dsn"))?,
    };

    let mut globals = GlobalArgs::new(
        matches
            .get_one::<String>("from-email")
            .cloned()
            .unwrap_or_else(|| "no-reply@localhost.localdomain".to_string()),
    );

    if let Some(host) = matches.get_one::<String>("smtp-host") {
        globals.set_smtp(SmtpConfig {
            host: host.clone(),
            username: matches
                .get_one::<String>("smtp-username")
                .cloned()
                .unwrap_or_default(),
            password: SecretString::from(
                matches
                    .get_one::<String>("smtp-password")
                    .cloned()
                    .unwrap_or_default(),
            ),
        });
    }

    Ok((action, globals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands;

    #[test]
    fn server_action_from_matches() -> Result<()> {
        let matches = commands::new().try_get_matches_from([
            "kunci",
            "--dsn",
            "postgres://localhost/kunci",
            "--port",
            "9090",
        ])?;
        let (action, globals) = handler(&matches)?;
        let Action::Server { port, dsn } = action;
        assert_eq!(port, 9090);
        assert_eq!(dsn, "postgres://localhost/kunci");
        assert!(globals.smtp.is_none());
        Ok(())
    }

    #[test]
    fn smtp_settings_flow_into_globals() -> Result<()> {
        let matches = commands::new().try_get_matches_from([
            "kunci",
            "--dsn",
            "memory",
            "--smtp-host",
            "smtp.example.com",
            "--smtp-username",
            "mailer",
            "--smtp-password",
            "secret",
        ])?;
        let (_, globals) = handler(&matches)?;
        let smtp = globals.smtp.expect("smtp config");
        assert_eq!(smtp.host, "smtp.example.com");
        assert_eq!(smtp.username, "mailer");
        Ok(())
    }
}
