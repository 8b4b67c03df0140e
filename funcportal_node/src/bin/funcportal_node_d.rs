// SPDX-FileCopyrightText: © 2023 Technical University of Munich, Chair of Connected Mobility
// SPDX-License-Identifier: MIT
use clap::Parser;

#[derive(Debug, clap::Parser)]
#[command(long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = String::from("node.toml"))]
    config_file: String,
    #[arg(short, long, default_value_t = String::from(""))]
    template: String,
    /// Only run workers, pulling jobs from a shared job store.
    #[arg(long, default_value_t = false)]
    worker_only: bool,
}

fn read_conf_from_file(filename: &str) -> anyhow::Result<funcportal_node::FuncPortalSettings> {
    Ok(toml::from_str::<funcportal_node::FuncPortalSettings>(&std::fs::read_to_string(filename)?)?)
}

fn build_portal(
    settings: &funcportal_node::FuncPortalSettings,
    store: std::sync::Arc<dyn funcportal_api::job::JobStoreAPI>,
) -> anyhow::Result<funcportal_node::portal::Portal> {
    let mut portal = funcportal_node::portal::Portal::with_job_store(store);
    portal.set_extra_arguments(settings.extra_arguments);
    portal.register_endpoint("/multiply", funcportal_node::demo::multiply()?, false)?;
    portal.register_endpoint("/exponent", funcportal_node::demo::exponent()?, false)?;
    portal.register_endpoint("/multiply_async", funcportal_node::demo::multiply()?, true)?;
    Ok(portal)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    // Create a template configuration and exit.
    if !args.template.is_empty() {
        funcportal_node::create_template(&args.template, funcportal_node::funcportal_node_default_conf().as_str())?;
        return Ok(());
    }

    let settings = read_conf_from_file(&args.config_file)?;
    if args.worker_only && settings.job_store == funcportal_node::JobStoreSettings::Memory {
        anyhow::bail!("--worker-only requires a shared job store, but the in-memory one is configured");
    }

    let async_runtime = tokio::runtime::Builder::new_multi_thread().worker_threads(8).enable_all().build()?;
    async_runtime.block_on(async move {
        let handles = funcportal_node::create_job_store(&settings.job_store)?;
        let portal = build_portal(&settings, handles.store)?;
        funcportal_node::funcportal_node_main(settings, portal, handles.queue, !args.worker_only).await
    })
}
