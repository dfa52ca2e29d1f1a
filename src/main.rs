use anyhow::{bail, Context};
use config::Commands::*;
use config::*;
use pipelinepro::*;

use content::{Keyed, BLOG_DATA, SERVICES_DATA};
use dom::Document;
use hydrate::{hydrate_from_query, Hydration};
use page::role::Role;
use page::theme::{Direction, Preference, Theme};
use storage::{FileStorage, Storage, ROLE_KEY};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = RootCommand::read();
    let config = Config::read(&args.config)?;

    // Zero lets rayon pick the number of CPUs
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.concurrency.unwrap_or(0))
        .build()?
        .install(|| main0(args, config))
}

fn main0(args: RootCommand, config: Config) -> anyhow::Result<()> {
    match args.command {
        Build { only } => {
            let report = site::build(&config, only)?;
            println!("{} pages generated ({} updated)", report.total(), report.written.len());
        }

        Hydrate { page, query, prefs } => {
            let (template, location) = match page {
                PageKind::Blog => (site::BLOG_TEMPLATE, format!("/{}", site::BLOG_TEMPLATE)),
                PageKind::Service => (site::SERVICE_TEMPLATE, format!("/{}", site::SERVICE_TEMPLATE)),
            };
            let mut doc = Document::parse(&site::read_template(&config, template)?);

            let hydration = match page {
                PageKind::Blog => hydrate_from_query(&mut doc, Some(&*BLOG_DATA), &query)?,
                PageKind::Service => hydrate_from_query(&mut doc, Some(&*SERVICES_DATA), &query)?,
            };
            if let Hydration::Skipped(reason) = &hydration {
                eprintln!("Showing placeholder content ({:?})", reason);
            }

            if let Some(prefs) = prefs {
                let storage = FileStorage::open(&prefs)?;
                doc = site::apply_preferences(doc, storage, &location)?.0;
            }

            println!("{}", doc.to_html()?);
        }

        Charts => {
            let charts = dashboard::charts::all_charts().into_iter()
                .map(|(id, config)| (id.to_string(), config))
                .collect::<serde_json::Map<_, _>>();
            println!("{}", serde_json::to_string_pretty(&charts)?);
        }

        List => {
            println!("{}", config.site_name);
            println!("\nBlog posts:");
            for post in BLOG_DATA.iter() {
                println!("  {:<28} {}", post.slug(), post.title());
            }
            println!("\nServices:");
            for service in SERVICES_DATA.iter() {
                println!("  {:<28} {}", service.slug(), service.title());
            }
        }

        Prefs { file, theme, dir, role } => {
            let mut storage = FileStorage::open(&file)?;

            if let Some(theme) = theme {
                Theme::parse(&theme)
                    .with_context(|| format!("Unknown theme '{}'", theme))?
                    .store(&mut storage);
            }
            if let Some(dir) = dir {
                Direction::parse(&dir)
                    .with_context(|| format!("Unknown direction '{}'", dir))?
                    .store(&mut storage);
            }
            if let Some(role) = role {
                match Role::parse(&role) {
                    Some(role) => storage.set_item(ROLE_KEY, role.as_str()),
                    None => bail!("Unknown role '{}'", role),
                }
            }
            storage.save()?;

            println!("theme: {}", Theme::load(&storage).map(|t| t.as_str()).unwrap_or("(not set)"));
            println!("dir:   {}", Direction::load(&storage).map(|d| d.as_str()).unwrap_or("(not set)"));
            println!("role:  {}", Role::load(&storage).as_str());
        }
    }

    Ok(())
}
