use anyhow::{Context as _, Result};
use tera::{Context, Tera};

use crate::models::{Host, HostScript};

/// Build the page renderer from templates compiled into the binary
pub fn build() -> Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", include_str!("../../templates/base.html")),
        ("home.html", include_str!("../../templates/home.html")),
        ("hosts.html", include_str!("../../templates/hosts.html")),
        ("host.html", include_str!("../../templates/host.html")),
    ])
    .context("Failed to parse page templates")?;
    Ok(tera)
}

fn base_context(title: &str, route_curr: &str, route_prev: Option<&str>) -> Context {
    let mut context = Context::new();
    context.insert("title", title);
    context.insert("route_curr", route_curr);
    context.insert("route_prev", &route_prev);
    context
}

pub fn render_home(tera: &Tera) -> Result<String> {
    let mut context = base_context("Home", "/", None);
    context.insert("items", &["hosts"]);
    tera.render("home.html", &context).context("Failed to render home page")
}

pub fn render_hosts(tera: &Tera, hosts: &[Host]) -> Result<String> {
    let mut context = base_context("Hosts", "/pages/hosts", Some("/"));
    context.insert("hosts", hosts);
    tera.render("hosts.html", &context).context("Failed to render host list")
}

pub fn render_host(tera: &Tera, host: &Host, scripts: &[HostScript]) -> Result<String> {
    let route = format!("/pages/hosts/{}", host.id);
    let mut context = base_context(&host.name, &route, Some("/pages/hosts"));
    context.insert("host", host);
    context.insert("scripts", scripts);
    tera.render("host.html", &context).context("Failed to render host page")
}
