#[cfg(test)]
mod tests {
    use crate::cmd::Commands;
    use crate::Opts;
    use clap::Parser;

    fn parse(args: &[&str]) -> Opts {
        let mut full = vec!["tripwirectl"];
        full.extend_from_slice(args);
        Opts::parse_from(full)
    }

    fn try_parse(args: &[&str]) -> Result<Opts, clap::Error> {
        let mut full = vec!["tripwirectl"];
        full.extend_from_slice(args);
        Opts::try_parse_from(full)
    }

    #[test]
    fn parse_version() {
        let opts = parse(&["version"]);
        assert!(matches!(opts.cmd, Commands::Version));
    }

    #[test]
    fn parse_json_flag() {
        let opts = parse(&["--json", "version"]);
        assert!(opts.json);
        assert_eq!(opts.output_mode(), crate::output::OutputMode::Json);
    }

    #[test]
    fn parse_human_flag_default() {
        let opts = parse(&["version"]);
        assert!(!opts.json);
        assert_eq!(opts.output_mode(), crate::output::OutputMode::Human);
    }

    #[test]
    fn parse_server_flag() {
        let opts = parse(&["--server", "http://localhost:9094", "alerts"]);
        assert_eq!(opts.server.as_deref(), Some("http://localhost:9094"));
    }

    #[test]
    fn parse_config_flag_after_subcommand() {
        let opts = parse(&["reload", "--config", "/tmp/tripwire.yml"]);
        assert_eq!(opts.config.as_deref(), Some("/tmp/tripwire.yml"));
        assert!(matches!(opts.cmd, Commands::Reload));
    }

    #[test]
    fn parse_rules_check_with_file() {
        let opts = parse(&["rules", "check", "rules.yml"]);
        match opts.cmd {
            Commands::Rules(crate::cmd::rules::RulesCmd::Check(args)) => {
                assert_eq!(args.file.unwrap().to_str(), Some("rules.yml"));
            }
            _ => panic!("expected rules check"),
        }
    }

    #[test]
    fn parse_rules_list() {
        let opts = parse(&["rules", "list"]);
        assert!(matches!(
            opts.cmd,
            Commands::Rules(crate::cmd::rules::RulesCmd::List)
        ));
    }

    #[test]
    fn parse_alerts_state_filter() {
        assert!(matches!(parse(&["alerts", "--state", "firing"]).cmd, Commands::Alerts(_)));
        assert!(try_parse(&["alerts", "--state", "inactive"]).is_err());
    }

    #[test]
    fn parse_health_rules_flag() {
        assert!(matches!(parse(&["health", "--rules"]).cmd, Commands::Health(_)));
    }

    #[test]
    fn unknown_subcommand_rejected() {
        assert!(try_parse(&["wal", "stats"]).is_err());
    }
}
