//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::{CONFIG_DIR_ENV, DEFAULT_PLUGINS_DIR, DEFAULT_RULESFILES_DIR};

/// artifactctl - Falco artifact installer
///
/// Install plugins and rules files from OCI registries.
#[derive(Parser, Debug)]
#[command(
    name = "artifactctl",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Install Falco plugins and rules files from OCI registries",
    long_about = "artifactctl resolves artifact names against the configured indexes, \
                  pulls them from OCI registries for the current platform and installs \
                  them into the plugins or rules files directory.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  artifactctl install k8saudit\n    \
                  artifactctl install ghcr.io/falcosecurity/rules/falco-rules:3\n    \
                  artifactctl install k8saudit k8saudit-rules --plugins-dir ./plugins"
)]
pub struct Cli {
    /// Configuration directory (defaults to the user's config directory)
    #[arg(long, env = CONFIG_DIR_ENV, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install artifacts by name or reference
    Install(InstallArgs),

    /// Show version information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the install command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Install by index name:\n    artifactctl install k8saudit\n\n\
                   Install by reference:\n    artifactctl install ghcr.io/falcosecurity/plugins/k8saudit:0.6\n\n\
                   Install several artifacts:\n    artifactctl install k8saudit cloudtrail-rules\n\n\
                   Install into custom directories:\n    artifactctl install k8saudit --plugins-dir ./plugins --rulesfiles-dir ./rules\n\n\
                   Pull from a local plain HTTP registry:\n    artifactctl install localhost:5000/rules:1 --plain-http")]
pub struct InstallArgs {
    /// Artifact names or references (registry/repository:tag or @digest)
    #[arg(required = true, num_args = 1..)]
    pub refs: Vec<String>,

    /// Directory where plugins are installed
    #[arg(long, env = "ARTIFACTCTL_PLUGINS_DIR", default_value = DEFAULT_PLUGINS_DIR)]
    pub plugins_dir: PathBuf,

    /// Directory where rules files are installed
    #[arg(long, env = "ARTIFACTCTL_RULESFILES_DIR", default_value = DEFAULT_RULESFILES_DIR)]
    pub rulesfiles_dir: PathBuf,

    /// Talk to registries over plain HTTP
    #[arg(long)]
    pub plain_http: bool,
}

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    artifactctl completions --shell bash > ~/.bash_completion.d/artifactctl\n\n\
                  Generate zsh completions:\n    artifactctl completions --shell zsh > ~/.zfunc/_artifactctl\n\n\
                  Generate fish completions:\n    artifactctl completions --shell fish > ~/.config/fish/completions/artifactctl.fish")]
pub struct CompletionsArgs {
    /// Shell type
    #[arg(long, value_enum, ignore_case = true)]
    pub shell: Shell,
}
