//! kit CLI - minimal distributed version control command line interface

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use kit::ops::{checkout, commit, create_branch, delete_branch, gc, list_branches, log};
use kit::transport::{self, Daemon};
use kit::{Id, Repository};

#[derive(Parser)]
#[command(name = "kit")]
#[command(about = "minimal distributed version control")]
#[command(version)]
struct Cli {
    /// working directory of the repository
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// create an empty repository
    Init,

    /// commit the working tree
    Commit {
        /// commit message
        #[arg(short = 'm', long)]
        message: String,
    },

    /// show per-branch history
    Log,

    /// switch HEAD to a branch or commit
    Checkout {
        /// create a branch at HEAD (or at the given id) and switch to it
        #[arg(short = 'b', long = "branch", value_name = "NAME")]
        new_branch: Option<String>,

        /// branch name or commit id
        #[arg(required_unless_present = "new_branch")]
        target: Option<String>,
    },

    /// list branches, or delete one
    Branch {
        /// delete the named branch
        #[arg(short = 'D', value_name = "NAME")]
        delete: Option<String>,
    },

    /// garbage collect unreachable objects
    Gc,

    /// serve the sync protocol on localhost
    Daemon {
        /// port to listen on
        port: u16,
    },

    /// pull a branch from a remote
    Pull {
        /// remote name
        remote: String,

        /// branch to pull
        branch: String,
    },

    /// push a branch to a remote
    Push {
        /// remote name
        remote: String,

        /// branch to push
        branch: String,
    },

    /// initialize a repository from a remote
    Clone {
        /// remote url
        url: String,

        /// branch to clone
        branch: String,
    },

    /// manage remotes
    Remote {
        /// list remotes with urls
        #[arg(short = 'v', long)]
        verbose: bool,

        #[command(subcommand)]
        action: Option<RemoteAction>,
    },
}

#[derive(Subcommand)]
enum RemoteAction {
    /// add a remote
    Add {
        /// remote name
        name: String,

        /// remote url
        url: String,
    },

    /// remove a remote
    Rm {
        /// remote name
        name: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: Cli) -> kit::Result<()> {
    match cli.command {
        Commands::Init => {
            Repository::init(&cli.dir)?;
            println!("initialized empty repository in {}", cli.dir.display());
        }

        Commands::Commit { message } => {
            let mut repo = Repository::open(&cli.dir)?;
            let time = chrono::Utc::now().timestamp();
            let id = commit(&mut repo, &message, "author", time)?;
            repo.save()?;
            println!("{}", id);
        }

        Commands::Log => {
            let repo = Repository::open(&cli.dir)?;
            print!("{}", log(&repo)?);
        }

        Commands::Checkout { new_branch, target } => {
            let mut repo = Repository::open(&cli.dir)?;
            match new_branch {
                Some(name) => {
                    let at = match target {
                        Some(id) => Some(Id::from_hex(&id)?),
                        None => repo.resolve_head(),
                    };
                    create_branch(&mut repo, &name, at)?;
                    println!("switched to new branch '{}'", name);
                }
                None => {
                    // clap guarantees target when -b is absent
                    let target = target.unwrap_or_default();
                    checkout(&mut repo, &target)?;
                    println!("switched to '{}'", target);
                }
            }
            repo.save()?;
        }

        Commands::Branch { delete } => {
            let mut repo = Repository::open(&cli.dir)?;
            match delete {
                Some(name) => {
                    delete_branch(&mut repo, &name)?;
                    repo.save()?;
                    println!("deleted branch '{}'", name);
                }
                None => {
                    print!("{}", list_branches(&repo));
                }
            }
        }

        Commands::Gc => {
            let mut repo = Repository::open(&cli.dir)?;
            let stats = gc(&mut repo)?;
            repo.save()?;
            println!(
                "removed {} commits, {} trees, {} blobs",
                stats.commits_removed, stats.trees_removed, stats.blobs_removed
            );
        }

        Commands::Daemon { port } => {
            // fail before binding if there is no repository here
            Repository::open(&cli.dir)?;

            let daemon = Daemon::bind(&cli.dir, port)?;
            println!("serving on http://{}/", daemon.addr());
            daemon.serve()?;
        }

        Commands::Pull { remote, branch } => {
            let mut repo = Repository::open(&cli.dir)?;
            let tip = transport::pull(&mut repo, &remote, &branch)?;
            repo.save()?;
            match tip {
                Some(id) => println!("pulled {}/{} at {}", remote, branch, id),
                None => println!("pulled {}/{} (no commits)", remote, branch),
            }
        }

        Commands::Push { remote, branch } => {
            let repo = Repository::open(&cli.dir)?;
            let tip = transport::push(&repo, &remote, &branch)?;
            println!("pushed {} to {}", tip, remote);
        }

        Commands::Clone { url, branch } => {
            transport::clone(&cli.dir, &url, &branch)?;
            println!("cloned {} into {}", url, cli.dir.display());
        }

        Commands::Remote { verbose, action } => {
            let mut repo = Repository::open(&cli.dir)?;
            match action {
                Some(RemoteAction::Add { name, url }) => {
                    repo.storage.add_remote(&name, &url)?;
                    repo.save()?;
                    println!("added remote '{}'", name);
                }
                Some(RemoteAction::Rm { name }) => {
                    repo.storage.remove_remote(&name)?;
                    repo.save()?;
                    println!("removed remote '{}'", name);
                }
                None => {
                    for remote in &repo.storage.remotes {
                        if verbose {
                            println!("{} {}", remote.name, remote.url);
                        } else {
                            println!("{}", remote.name);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
