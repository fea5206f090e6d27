use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use bucket_backup::{
    Bitbucket, CloneOptions, Config, Driver, ProjectCloneRequest, ProjectCloner,
};
use chrono::Local;
use env_logger::Builder;
use failure::{Error, ResultExt};
use failure_derive::Fail;
use log::LevelFilter;
use structopt::StructOpt;

fn main() {
    let args = Args::from_args();

    if args.example_config {
        if let Err(e) = generate_example() {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
        return;
    }

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);

        for cause in e.iter_causes() {
            eprintln!("\tCaused By: {}", cause);
        }

        eprintln!("{}", e.backtrace());
        process::exit(1);
    }
}

fn generate_example() -> Result<(), Error> {
    println!("{}", Config::example().as_toml()?);
    Ok(())
}

fn run(args: &Args) -> Result<(), Error> {
    initialize_logging(args)?;

    let cfg = args.config()?;

    let command = match args.command {
        Some(ref command) => command,
        None => return Err(failure::err_msg("No command given. Try `bucket-backup --help`.")),
    };

    let api = args.api(&cfg)?;

    match *command {
        Command::Clone {
            ref workspace,
            skip_existing,
            ref project,
        } => {
            let opts = CloneOptions {
                workspaces: workspace
                    .as_ref()
                    .map(|w| w.split(',').map(String::from).collect()),
                skip_existing,
                project: project.clone(),
                dest_dir: PathBuf::from("."),
            };

            Driver::new(&api, opts).run()
        }
        Command::Workspace => {
            for workspace in api.workspaces()? {
                println!("{} ({}) - {}", workspace.name, workspace.slug, workspace.url);
            }

            Ok(())
        }
        Command::ListProjects => {
            for workspace in api.workspaces()? {
                println!("\n{} ({}) - {}", workspace.name, workspace.slug, workspace.url);

                let names: Vec<String> = api
                    .projects(&workspace.slug)?
                    .into_iter()
                    .map(|p| p.name)
                    .collect();
                println!("{:?}", names);
            }

            Ok(())
        }
        Command::CloneProjects => {
            let request = ProjectCloneRequest {
                root: PathBuf::from(prompt("Enter path where projects will be cloned: ")?),
                keyword: prompt("Enter target bitbucket workspace keyword: ")?,
            };

            ProjectCloner::new(&api).run(&request).map(|_| ())
        }
    }
}

#[derive(Debug, Clone, PartialEq, StructOpt)]
struct Args {
    #[structopt(
        short = "c",
        long = "config",
        default_value = "~/.bucket-backup.toml",
        help = "The configuration file to use."
    )]
    config_file: String,
    #[structopt(
        short = "v",
        long = "verbose",
        parse(from_occurrences),
        help = "Verbose output (repeat for more verbosity)"
    )]
    verbosity: u64,
    #[structopt(
        long = "example-config",
        help = "Generate an example config and immediately exit."
    )]
    example_config: bool,
    #[structopt(
        short = "u",
        long = "user",
        global = true,
        help = "The Bitbucket username (falls back to the config file)"
    )]
    user: Option<String>,
    #[structopt(
        short = "p",
        long = "password",
        global = true,
        help = "An app password for the account (falls back to the config file)"
    )]
    password: Option<String>,
    #[structopt(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, StructOpt)]
enum Command {
    /// Clone every repository in the target workspaces.
    #[structopt(name = "clone")]
    Clone {
        #[structopt(
            short = "w",
            long = "workspace",
            help = "Workspace slug(s), separated by comma (defaults to every visible workspace)"
        )]
        workspace: Option<String>,
        #[structopt(
            short = "s",
            long = "skip-existing",
            help = "Skip repositories that already exist on disk instead of replacing them"
        )]
        skip_existing: bool,
        #[structopt(long = "project", help = "Limit the clone to a single project key")]
        project: Option<String>,
    },
    /// List every workspace visible to the account.
    #[structopt(name = "workspace")]
    Workspace,
    /// List the projects of every workspace.
    #[structopt(name = "list_projects")]
    ListProjects,
    /// Interactively clone repositories into a workspace/project tree.
    #[structopt(name = "clone_projects")]
    CloneProjects,
}

impl Args {
    fn config(&self) -> Result<Config, Error> {
        let config_file =
            shellexpand::full(&self.config_file).context("Unable to expand wildcards")?;
        let path = Path::new(config_file.as_ref());

        if path.exists() {
            Config::from_file(path)
                .context("Couldn't load the config")
                .map_err(Into::into)
        } else {
            Ok(Config::default())
        }
    }

    fn api(&self, cfg: &Config) -> Result<Bitbucket, Error> {
        let username = self
            .user
            .clone()
            .or_else(|| cfg.general.username.clone())
            .ok_or(MissingCredentials)?;
        let password = self
            .password
            .clone()
            .or_else(|| cfg.general.app_password.clone())
            .ok_or(MissingCredentials)?;

        Ok(Bitbucket::new(username, password).with_api_root(&cfg.general.api_root))
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Fail)]
#[fail(display = "No credentials found. Pass --user and --password, or set them in the config file")]
struct MissingCredentials;

fn prompt(message: &str) -> Result<String, Error> {
    print!("{}", message);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Unable to read from stdin")?;

    Ok(line.trim().to_string())
}

fn initialize_logging(args: &Args) -> Result<(), Error> {
    let mut builder = Builder::new();

    let level = match args.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    builder.filter(Some("bucket_backup"), level);

    if let Ok(filter) = env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    }

    builder.format(|out, record| match record.line() {
        Some(line) => writeln!(
            out,
            "{} [{:5}] ({}#{}): {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            line,
            record.args()
        ),
        None => writeln!(
            out,
            "{} [{:5}] ({}): {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            record.args()
        ),
    });

    builder.try_init()?;

    Ok(())
}
