use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand, ValueHint};

#[derive(Parser)]
#[command(
    author,
    version,
    about,
    help_template = "{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}",
    arg_required_else_help = true
)]
pub struct Args {
    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output logs as json
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Disable colors in output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Disable progress bars
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Provide custom config file
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<String>,

    /// Set proxy
    #[arg(required = false, long, short = 'P', global = true)]
    pub proxy: Option<String>,

    /// Set request headers
    #[arg(required = false, long, short = 'H', global = true)]
    pub header: Option<Vec<String>>,

    /// Set user agent
    #[arg(required = false, long, short = 'A', global = true)]
    pub user_agent: Option<String>,

    #[clap(subcommand)]
    pub command: Commands,
}

/// Options shared by commands that talk to GitHub.
#[derive(ClapArgs, Debug, Default)]
pub struct GithubArgs {
    /// GitHub personal access token (scopes: repo & user)
    #[arg(long, env = "GH_PAT", hide_env_values = true)]
    pub gh_pat: Option<String>,

    /// List the stars of this user instead of the token owner
    #[arg(long)]
    pub user: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Clone new and pull existing starred repositories
    #[clap(name = "sync", visible_alias = "s")]
    Sync {
        #[command(flatten)]
        github: GithubArgs,

        /// Directory name format. Placeholders: {repo_name}, {repo_author}, {full_name}
        #[arg(long, env = "DIR_FORMAT")]
        dir_format: Option<String>,

        /// Maximum number of git processes running at once
        #[arg(long, env = "LIMIT")]
        limit: Option<u32>,

        /// Extra arguments for `git clone`
        #[arg(long, env = "CLONE_ARGS", allow_hyphen_values = true)]
        clone_args: Option<String>,

        /// Extra arguments for `git pull`
        #[arg(long, env = "PULL_ARGS", allow_hyphen_values = true)]
        pull_args: Option<String>,

        /// Directory the repositories are mirrored into
        #[arg(long, env = "OUTPUT_DIR", value_hint = ValueHint::DirPath)]
        output_dir: Option<String>,

        /// Only mirror repositories whose owner/name matches one of these globs
        #[arg(long, num_args = 1.., value_delimiter = ',')]
        include: Option<Vec<String>>,

        /// Skip repositories whose owner/name matches one of these globs
        #[arg(long, num_args = 1.., value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// Match include/exclude globs case-sensitively
        #[arg(long)]
        exact_case: bool,

        /// Show what would be cloned or pulled without running git
        #[arg(long)]
        dry_run: bool,
    },

    /// List starred repositories and where they are mirrored
    #[clap(name = "list", visible_alias = "ls")]
    List {
        #[command(flatten)]
        github: GithubArgs,
    },

    /// Print the configuration file to stdout
    Config,

    /// Create a default configuration file
    #[clap(name = "defconfig")]
    DefConfig,
}
