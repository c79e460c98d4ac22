use clap::{Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    Command::new("kprune")
        .about("Prune cluster resources that are no longer part of the desired state")
        .version(env!("CARGO_PKG_VERSION"))
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("Config file applied on top of the user and project config")
                .value_name("PATH")
                .global(true),
        )
        .subcommand(
            sweep_args(
                Command::new("prune")
                    .about("Delete owned resources missing from the desired state")
                    .arg(
                        Arg::new("desired")
                            .long("desired")
                            .help("JSON file with the desired manifests of every component")
                            .value_name("FILE")
                            .required(true),
                    ),
            ),
        )
        .subcommand(
            sweep_args(
                Command::new("delete")
                    .about("Delete every resource owned by a component")
                    .arg(
                        Arg::new("component")
                            .help("Name of the component to remove")
                            .required(true)
                            .index(1),
                    ),
            ),
        )
        .subcommand(
            Command::new("catalog")
                .about("Show the resource kinds swept, in deletion order")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Output in JSON format")
                        .action(ArgAction::SetTrue),
                ),
        )
}

/// Arguments shared by every command that runs a sweep.
fn sweep_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("cluster-state")
                .long("cluster-state")
                .help("JSON snapshot of the cluster; rewritten after a real run")
                .value_name("FILE")
                .required_unless_present("kube")
                .conflicts_with("kube"),
        )
        .arg(
            Arg::new("kube")
                .long("kube")
                .help("Sweep the cluster of the current kubeconfig context")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Log what would be deleted without deleting anything")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("namespace")
                .long("namespace")
                .short('n')
                .help("Namespace swept for namespaced kinds")
                .value_name("NS"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .help("Stop the sweep after this many seconds")
                .value_name("SECS")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Output in JSON format")
                .action(ArgAction::SetTrue),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_build() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_prune_command() {
        let matches = build_cli()
            .try_get_matches_from(vec![
                "kprune",
                "prune",
                "--desired",
                "desired.json",
                "--cluster-state",
                "cluster.json",
                "--dry-run",
                "--timeout",
                "30",
            ])
            .unwrap();

        let sub = matches.subcommand_matches("prune").unwrap();
        assert_eq!(sub.get_one::<String>("desired").unwrap(), "desired.json");
        assert_eq!(sub.get_one::<String>("cluster-state").unwrap(), "cluster.json");
        assert!(sub.get_flag("dry-run"));
        assert_eq!(sub.get_one::<u64>("timeout"), Some(&30));
    }

    #[test]
    fn test_prune_requires_desired() {
        let result = build_cli().try_get_matches_from(vec![
            "kprune",
            "prune",
            "--cluster-state",
            "cluster.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_sweep_requires_a_cluster() {
        let result = build_cli().try_get_matches_from(vec!["kprune", "delete", "gateway"]);
        assert!(result.is_err());

        let result = build_cli().try_get_matches_from(vec!["kprune", "delete", "gateway", "--kube"]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_cluster_state_conflicts_with_kube() {
        let result = build_cli().try_get_matches_from(vec![
            "kprune",
            "delete",
            "gateway",
            "--kube",
            "--cluster-state",
            "cluster.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let matches = build_cli()
            .try_get_matches_from(vec![
                "kprune",
                "catalog",
                "--json",
                "-v",
                "--config",
                "custom.toml",
            ])
            .unwrap();
        assert!(matches.get_flag("verbose"));
        assert_eq!(matches.get_one::<String>("config").unwrap(), "custom.toml");
        assert!(matches.subcommand_matches("catalog").unwrap().get_flag("json"));
    }
}
