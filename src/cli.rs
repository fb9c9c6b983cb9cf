use crate::config::AnalystConfig;
use crate::error::{AnalystError, Result};
use crate::util::dir_label;
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "git-analyst")]
#[command(about = "Git history analysis: top authors, file-type rollups, hot files and commit hygiene")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone, Debug)]
pub struct CommonArgs {
    #[arg(long, global = true, help = "Path to git repository (parent directory for multi-line)")]
    pub repo: Option<PathBuf>,

    #[arg(long, global = true, help = "CSV file for line and multi-line results")]
    pub csv: Option<PathBuf>,

    #[arg(
        long = "day",
        alias = "days",
        global = true,
        default_value_t = 30,
        help = "How many recent days code-line-top looks at"
    )]
    pub days: u32,

    #[arg(long, global = true, help = "Config file (defaults to ./git-analyst.toml when present)")]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Read `git log --numstat --format=%H|%an|%ae|%at` output from this file ('-' for stdin) instead of the repository"
    )]
    pub log: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authors with the most lines added in the last --day days
    CodeLineTop {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,
    },
    /// Commits and night-time commits per author
    People {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Most frequently changed files
    Hot {
        #[arg(long, help = "Number of files to show (overrides config)")]
        top: Option<usize>,

        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Commit message style compliance
    Style {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Commits whose messages mention sensitive keywords
    Secure {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Lines per author and file type for one repository, written to --csv
    Line,
    /// Lines per author and file type for every repository under --repo, appended to --csv
    MultiLine {
        #[arg(long, default_value_t = 1, help = "Repositories analysed in parallel")]
        jobs: usize,
    },
}

impl CommonArgs {
    pub fn require_repo(&self) -> Result<&Path> {
        self.repo
            .as_deref()
            .ok_or_else(|| AnalystError::Configuration("missing required input: --repo".into()))
    }

    /// `--repo`, which must name an existing directory.
    pub fn require_dir(&self) -> Result<&Path> {
        let dir = self.require_repo()?;
        if !dir.is_dir() {
            return Err(AnalystError::Configuration(format!(
                "invalid directory: {}",
                dir.display()
            )));
        }
        Ok(dir)
    }

    pub fn require_csv(&self) -> Result<&Path> {
        self.csv
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| AnalystError::Configuration("missing required input: --csv".into()))
    }

    /// Reader over `--log`, when given.
    pub fn open_log(&self) -> Result<Option<Box<dyn BufRead>>> {
        let Some(path) = self.log.as_deref() else {
            return Ok(None);
        };
        if path == Path::new("-") {
            return Ok(Some(Box::new(std::io::stdin().lock())));
        }
        let file = File::open(path).map_err(|e| AnalystError::SourceUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Some(Box::new(BufReader::new(file))))
    }

    /// Project label for `--log` input: the `--repo` directory name if
    /// given, else the log file's stem.
    pub fn log_project(&self) -> String {
        if let Some(repo) = self.repo.as_deref() {
            return dir_label(repo);
        }
        self.log
            .as_deref()
            .filter(|p| *p != Path::new("-"))
            .and_then(|p| p.file_stem())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stdin".to_string())
    }
}

impl Cli {
    pub fn execute(self) -> anyhow::Result<()> {
        let config = AnalystConfig::load(self.common.config.as_deref()).context("Failed to load configuration")?;

        match self.command {
            Commands::CodeLineTop { json, ndjson } => crate::top::exec(&self.common, json, ndjson),
            Commands::People { json } => crate::people::exec(&self.common, &config, json),
            Commands::Hot { top, json } => crate::hot::exec(&self.common, &config, top, json),
            Commands::Style { json } => crate::style::exec(&self.common, &config, json),
            Commands::Secure { json } => crate::secure::exec(&self.common, &config, json),
            Commands::Line => crate::line::exec(&self.common),
            Commands::MultiLine { jobs } => crate::line::exec_multi(&self.common, jobs),
        }
    }
}
