use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pv",
    about = "perfvault — store and browse profiling runs",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Run directory (overrides config and PERFVAULT_OUTPUT_DIR)
    #[arg(short, long, global = true)]
    pub dir: Option<PathBuf>,

    /// TOML config file with a [store] table
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Save a JSON profile as a new run
    Save(SaveArgs),
    /// Show a stored run
    Show(ShowArgs),
    /// List namespaces that have runs
    Sources,
    /// List runs, most recent first
    Runs(RunsArgs),
}

#[derive(Args)]
pub struct SaveArgs {
    /// JSON file to read, or `-` for stdin
    pub file: String,
    #[arg(short, long)]
    pub namespace: String,
    /// Use this run id instead of generating one
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub id: String,
    #[arg(short, long)]
    pub namespace: String,
}

#[derive(Args)]
pub struct RunsArgs {
    /// Only list runs in this namespace
    #[arg(short, long)]
    pub namespace: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_save() {
        let cli = Cli::try_parse_from(["pv", "save", "prof.json", "-n", "web"]).unwrap();
        if let Command::Save(args) = cli.command {
            assert_eq!(args.file, "prof.json");
            assert_eq!(args.namespace, "web");
            assert!(args.id.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_save_with_id() {
        let cli = Cli::try_parse_from(["pv", "save", "-", "-n", "web", "--id", "r1"]).unwrap();
        if let Command::Save(args) = cli.command {
            assert_eq!(args.file, "-");
            assert_eq!(args.id, Some("r1".into()));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn save_requires_namespace() {
        assert!(Cli::try_parse_from(["pv", "save", "prof.json"]).is_err());
    }

    #[test]
    fn parse_show() {
        let cli = Cli::try_parse_from(["pv", "show", "abc", "--namespace", "web"]).unwrap();
        if let Command::Show(args) = cli.command {
            assert_eq!(args.id, "abc");
            assert_eq!(args.namespace, "web");
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_sources() {
        let cli = Cli::try_parse_from(["pv", "sources"]).unwrap();
        assert!(matches!(cli.command, Command::Sources));
    }

    #[test]
    fn parse_runs_filtered() {
        let cli = Cli::try_parse_from(["pv", "runs", "-n", "web"]).unwrap();
        if let Command::Runs(args) = cli.command {
            assert_eq!(args.namespace, Some("web".into()));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "pv", "runs", "--dir", "/tmp/runs", "--format", "json", "--verbose",
        ])
        .unwrap();
        assert_eq!(cli.dir, Some(PathBuf::from("/tmp/runs")));
        assert!(matches!(cli.format, OutputFormat::Json));
        assert!(cli.verbose);
    }
}
