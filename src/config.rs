use anyhow::Context;
use clap::Parser;
use log::info;
use std::fs::File;
use std::path::Path;
use std::path::PathBuf;

//----- Command line parameters

/// PipelinePro site generator
#[derive(Parser, Debug)]
#[clap(name = "pipelinepro")]
pub struct RootCommand {
    /// Path to the config file
    #[clap(global = true, long, default_value = "pipelinepro.yml")]
    pub config: PathBuf,

    #[clap(subcommand)]
    pub command: Commands,
}

impl RootCommand {
    // Avoids importing Parser in main
    pub fn read() -> RootCommand {
        RootCommand::parse()
    }
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Blog,
    Services,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Blog,
    Service,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Generate the blog and service detail pages
    Build {
        /// Only generate one section
        #[clap(long, value_enum)]
        only: Option<Section>,
    },

    /// Hydrate a detail page template and print it
    Hydrate {
        #[clap(value_enum)]
        page: PageKind,
        /// Query string designating the record, e.g. "?id=phmsa-updates"
        #[clap(long, default_value = "")]
        query: String,
        /// Preferences file to apply (theme, direction, role)
        #[clap(long)]
        prefs: Option<PathBuf>,
    },

    /// Print the dashboard chart configurations as JSON
    Charts,

    /// List blog posts and services
    List,

    /// Show or change the stored preferences
    Prefs {
        /// Preferences file
        #[clap(long, default_value = "prefs.json")]
        file: PathBuf,
        /// light or dark
        #[clap(long)]
        theme: Option<String>,
        /// ltr or rtl
        #[clap(long)]
        dir: Option<String>,
        /// admin or client
        #[clap(long)]
        role: Option<String>,
    },
}

//----- Config file

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    pub concurrency: Option<usize>,
    #[serde(default = "default_site_name")]
    pub site_name: String,
}

fn default_template_dir() -> PathBuf {
    "templates".into()
}

fn default_output_dir() -> PathBuf {
    "public".into()
}

fn default_site_name() -> String {
    "PipelinePro".into()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            template_dir: default_template_dir(),
            output_dir: default_output_dir(),
            concurrency: None,
            site_name: default_site_name(),
        }
    }
}

impl Config {
    /// Reads the config file. A missing file means default settings.
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        if !path.exists() {
            info!("No config file at {:?}, using defaults", path);
            return Ok(Config::default());
        }
        let file = File::open(path).with_context(|| format!("Failed to open {:?}", path))?;
        let config = serde_yaml::from_reader(file).with_context(|| format!("Failed to read {:?}", path))?;
        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_config() -> anyhow::Result<()> {
        let config: Config = serde_yaml::from_str("output_dir: dist\nconcurrency: 4\n")?;
        assert_eq!(PathBuf::from("templates"), config.template_dir);
        assert_eq!(PathBuf::from("dist"), config.output_dir);
        assert_eq!(Some(4), config.concurrency);
        assert_eq!("PipelinePro", config.site_name);
        Ok(())
    }

    #[test]
    fn test_command_line() {
        let args = RootCommand::parse_from(["pipelinepro", "hydrate", "blog", "--query", "?id=x"]);
        assert_eq!(PathBuf::from("pipelinepro.yml"), args.config);
        match args.command {
            Commands::Hydrate { page, query, prefs } => {
                assert_eq!(PageKind::Blog, page);
                assert_eq!("?id=x", query);
                assert!(prefs.is_none());
            }
            other => panic!("Unexpected command {:?}", other),
        }

        let args = RootCommand::parse_from(["pipelinepro", "build", "--only", "services", "--config", "site.yml"]);
        assert_eq!(PathBuf::from("site.yml"), args.config);
        assert!(matches!(args.command, Commands::Build { only: Some(Section::Services) }));
    }
}
