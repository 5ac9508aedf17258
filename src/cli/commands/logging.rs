use clap::{Arg, Command, builder::ValueParser};

pub const ARG_VERBOSITY: &str = "verbosity";

#[must_use]
pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
            .env("CRUDA_LOG_LEVEL")
            .global(true)
            .action(clap::ArgAction::Count)
            .value_parser(validator_log_level()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_from_flag_count() {
        temp_env::with_var_unset("CRUDA_LOG_LEVEL", || {
            let command = with_args(Command::new("cruda"));
            for (flag, expected) in [("-v", 1u8), ("-vv", 2), ("-vvvv", 4)] {
                let matches = command.clone().get_matches_from(vec!["cruda", flag]);
                assert_eq!(matches.get_one::<u8>(ARG_VERBOSITY).copied(), Some(expected));
            }
        });
    }

    #[test]
    fn log_level_parser_accepts_names() {
        let command = Command::new("cruda").arg(
            Arg::new("level")
                .long("level")
                .value_parser(validator_log_level()),
        );
        for (name, expected) in [("error", 0u8), ("WARN", 1), ("debug", 3), ("5", 5)] {
            let matches = command
                .clone()
                .get_matches_from(vec!["cruda", "--level", name]);
            assert_eq!(matches.get_one::<u8>("level").copied(), Some(expected));
        }
        assert!(command
            .try_get_matches_from(vec!["cruda", "--level", "loud"])
            .is_err());
    }
}
