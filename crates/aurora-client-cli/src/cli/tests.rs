use super::*;
use crate::cli::commands::parse_args;
use serde_json::json;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn cli_parse_call() {
    let cli = parse(&[
        "aurora-client",
        "call",
        "west",
        "getJobs",
        r#"{"str": "www-data"}"#,
    ]);
    match cli.command {
        CliCommand::Call {
            cluster,
            method,
            args,
            retry,
        } => {
            assert_eq!(cluster, "west");
            assert_eq!(method, "getJobs");
            assert_eq!(args, vec![r#"{"str": "www-data"}"#.to_string()]);
            assert!(!retry);
        }
        _ => panic!("expected Call"),
    }
    assert!(cli.config.is_none());
}

#[test]
fn cli_parse_call_retry_and_config() {
    let cli = parse(&[
        "aurora-client",
        "call",
        "--retry",
        "west",
        "getTierConfigs",
        "--config",
        "/tmp/aurora.toml",
    ]);
    match cli.command {
        CliCommand::Call { retry, args, .. } => {
            assert!(retry);
            assert!(args.is_empty());
        }
        _ => panic!("expected Call"),
    }
    assert_eq!(cli.config, Some(PathBuf::from("/tmp/aurora.toml")));
}

#[test]
fn cli_parse_url() {
    match parse(&["aurora-client", "url", "west", "--raw"]).command {
        CliCommand::Url { cluster, raw } => {
            assert_eq!(cluster, "west");
            assert!(raw);
        }
        _ => panic!("expected Url"),
    }
}

#[test]
fn cli_parse_listing_commands() {
    assert!(matches!(
        parse(&["aurora-client", "clusters"]).command,
        CliCommand::Clusters
    ));
    assert!(matches!(
        parse(&["aurora-client", "methods"]).command,
        CliCommand::Methods
    ));
    assert!(matches!(
        parse(&["aurora-client", "completions", "bash"]).command,
        CliCommand::Completions { .. }
    ));
}

#[test]
fn cli_parse_rejects_missing_cluster() {
    assert!(Cli::try_parse_from(["aurora-client", "url"]).is_err());
}

#[test]
fn call_args_are_json() {
    let args = parse_args(&[r#"{"str": "a"}"#.to_string(), "null".to_string()]).unwrap();
    assert_eq!(args, vec![json!({"str": "a"}), serde_json::Value::Null]);

    let err = parse_args(&["{not json".to_string()]).unwrap_err();
    assert!(err.to_string().contains("argument 1"));
}
