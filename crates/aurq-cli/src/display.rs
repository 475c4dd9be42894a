use aurq_registry::{Package, UnitFailure};
use nu_ansi_term::Color::{Blue, Cyan, Green, LightRed, Red, Yellow};
use tabled::{
    builder::Builder,
    settings::{themes::BorderCorrection, Panel, Style},
};
use tracing::{info, warn};

use crate::{
    error::CliResult,
    utils::{format_timestamp, Colored, Icons},
};

const PACKAGE_PAGE_URL: &str = "https://aur.archlinux.org/packages/";

/// Prints the packages as JSON lines.
pub fn print_json(packages: &[Package]) -> CliResult<()> {
    for package in packages {
        println!("{}", serde_json::to_string(package)?);
    }
    Ok(())
}

fn status_flags(package: &Package) -> String {
    let mut flags = String::new();
    if package.is_orphan() {
        flags.push_str(&format!(" {}", Colored(Yellow, "[orphaned]")));
    }
    if package.is_out_of_date() {
        flags.push_str(&format!(" {}", Colored(Red, "[out-of-date]")));
    }
    flags
}

pub fn print_search_results(packages: &[Package]) {
    for package in packages {
        info!(
            pkg_name = package.name,
            version = package.version,
            votes = package.num_votes,
            "{} {} ({}, {:.2}){}\n    {}",
            Colored(Blue, &package.name),
            Colored(LightRed, &package.version),
            Colored(Green, package.num_votes),
            package.popularity,
            status_flags(package),
            package.description.as_deref().unwrap_or("")
        );
    }

    let mut builder = Builder::new();
    builder.push_record([
        format!("{} Found", Icons::PACKAGE),
        format!("{}", Colored(Cyan, packages.len())),
    ]);
    builder.push_record([
        format!("{} Orphaned", Icons::MAINTAINER),
        format!(
            "{}",
            Colored(Yellow, packages.iter().filter(|p| p.is_orphan()).count())
        ),
    ]);
    builder.push_record([
        format!("{} Out of date", Icons::WARNING),
        format!(
            "{}",
            Colored(Red, packages.iter().filter(|p| p.is_out_of_date()).count())
        ),
    ]);

    let table = builder
        .build()
        .with(Panel::header("Search Results"))
        .with(Style::rounded())
        .with(BorderCorrection {})
        .to_string();

    info!("\n{table}");
}

fn push_list(builder: &mut Builder, label: String, values: &[String]) {
    if !values.is_empty() {
        builder.push_record([label, values.join("  ")]);
    }
}

/// Renders the detail table for one package.
pub fn package_table(package: &Package) -> String {
    let mut builder = Builder::new();

    builder.push_record([
        format!("{} Name", Icons::PACKAGE),
        format!("{}{}", Colored(Blue, &package.name), status_flags(package)),
    ]);
    if package.package_base != package.name && !package.package_base.is_empty() {
        builder.push_record([
            format!("{} Base", Icons::PACKAGE),
            package.package_base.clone(),
        ]);
    }
    builder.push_record([
        format!("{} Version", Icons::VERSION),
        Colored(LightRed, &package.version).to_string(),
    ]);
    if let Some(description) = &package.description {
        builder.push_record([format!("{} Description", Icons::DESCRIPTION), description.clone()]);
    }
    if let Some(url) = &package.url {
        builder.push_record([format!("{} Upstream", Icons::HOME), Colored(Blue, url).to_string()]);
    }
    builder.push_record([
        format!("{} AUR Page", Icons::LINK),
        Colored(Blue, format!("{PACKAGE_PAGE_URL}{}", package.name)).to_string(),
    ]);
    push_list(&mut builder, format!("{} Licenses", Icons::LICENSE), &package.license);
    push_list(&mut builder, format!("{} Groups", Icons::PACKAGE), &package.groups);
    push_list(&mut builder, format!("{} Provides", Icons::DEPENDS), &package.provides);
    push_list(&mut builder, format!("{} Depends", Icons::DEPENDS), &package.depends);
    push_list(&mut builder, format!("{} Make Deps", Icons::DEPENDS), &package.make_depends);
    push_list(&mut builder, format!("{} Check Deps", Icons::DEPENDS), &package.check_depends);
    push_list(&mut builder, format!("{} Optional Deps", Icons::DEPENDS), &package.opt_depends);
    push_list(&mut builder, format!("{} Conflicts", Icons::DEPENDS), &package.conflicts);
    push_list(&mut builder, format!("{} Replaces", Icons::DEPENDS), &package.replaces);
    push_list(&mut builder, format!("{} Keywords", Icons::DESCRIPTION), &package.keywords);

    builder.push_record([
        format!("{} Maintainer", Icons::MAINTAINER),
        package
            .maintainer
            .clone()
            .unwrap_or_else(|| Colored(Yellow, "None").to_string()),
    ]);
    push_list(&mut builder, format!("{} Co-Maintainers", Icons::MAINTAINER), &package.co_maintainers);
    if let Some(submitter) = &package.submitter {
        builder.push_record([format!("{} Submitter", Icons::MAINTAINER), submitter.clone()]);
    }
    builder.push_record([
        format!("{} Votes", Icons::VOTES),
        format!("{} ({:.2})", package.num_votes, package.popularity),
    ]);
    builder.push_record([
        format!("{} Submitted", Icons::CALENDAR),
        format_timestamp(package.first_submitted),
    ]);
    builder.push_record([
        format!("{} Modified", Icons::CALENDAR),
        format_timestamp(package.last_modified),
    ]);
    if let Some(flagged) = package.out_of_date {
        builder.push_record([
            format!("{} Out of date", Icons::WARNING),
            Colored(Red, format_timestamp(flagged)).to_string(),
        ]);
    }

    builder.build().with(Style::rounded()).to_string()
}

pub fn print_package_info(packages: &[Package]) {
    for package in packages {
        info!(
            pkg_name = package.name,
            version = package.version,
            "\n{}",
            package_table(package)
        );
    }
}

pub fn report_failures(failures: &[UnitFailure]) {
    for failure in failures {
        warn!("{failure}");
    }
}
